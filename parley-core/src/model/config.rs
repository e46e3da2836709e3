use serde::{Deserialize, Serialize};
use std::fmt;
use webrtc::peer_connection::certificate::RTCCertificate;

pub const DEFAULT_STUN_SERVERS: [&str; 4] = [
    "stun:stun.l.google.com:19302",
    "stun:stun1.l.google.com:19302",
    "stun:stun2.l.google.com:19302",
    "stun:stun3.l.google.com:19302",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundlePolicy {
    #[default]
    Balanced,
    MaxCompat,
    MaxBundle,
}

/// Transport-engine options fixed for the lifetime of one adapter.
///
/// Nothing here is validated locally; the engine decides what it accepts.
/// Reconfiguring means building a new adapter.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub ice_servers: Vec<IceServerConfig>,
    #[serde(default)]
    pub bundle_policy: BundlePolicy,
    #[serde(default)]
    pub ice_candidate_pool_size: u8,
    #[serde(skip)]
    pub certificates: Vec<RTCCertificate>,
}

impl Configuration {
    pub fn with_default_stun() -> Self {
        Self {
            ice_servers: vec![IceServerConfig {
                urls: DEFAULT_STUN_SERVERS.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    pub fn with_ice_server(mut self, server: IceServerConfig) -> Self {
        self.ice_servers.push(server);
        self
    }

    pub fn with_bundle_policy(mut self, bundle_policy: BundlePolicy) -> Self {
        self.bundle_policy = bundle_policy;
        self
    }

    pub fn with_certificate(mut self, certificate: RTCCertificate) -> Self {
        self.certificates.push(certificate);
        self
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("ice_servers", &self.ice_servers)
            .field("bundle_policy", &self.bundle_policy)
            .field("ice_candidate_pool_size", &self.ice_candidate_pool_size)
            .field("certificates", &self.certificates.len())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferOptions {
    #[serde(default)]
    pub ice_restart: bool,
    #[serde(default)]
    pub voice_activity_detection: bool,
}

impl OfferOptions {
    pub fn ice_restart() -> Self {
        Self {
            ice_restart: true,
            ..Default::default()
        }
    }
}
