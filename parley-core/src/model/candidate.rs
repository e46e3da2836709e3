use crate::ModelError;
use serde::{Deserialize, Serialize};

/// One transport address proposed for the connection, in the JSON shape
/// browsers use (`candidate`, `sdpMid`, `sdpMLineIndex`, `usernameFragment`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            ..Default::default()
        }
    }

    pub fn with_mid(mut self, sdp_mid: impl Into<String>, sdp_m_line_index: u16) -> Self {
        self.sdp_mid = Some(sdp_mid.into());
        self.sdp_m_line_index = Some(sdp_m_line_index);
        self
    }

    /// An empty candidate line signals that the remote side finished gathering.
    pub fn is_end_of_candidates(&self) -> bool {
        self.candidate.trim().is_empty()
    }

    /// Checks the `candidate-attribute` grammar from RFC 8839 section 5.1:
    /// `foundation component transport priority address port typ type ...`.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.is_end_of_candidates() {
            return Ok(());
        }

        let malformed = |reason| ModelError::MalformedCandidate {
            candidate: self.candidate.clone(),
            reason,
        };

        let line = self.candidate.trim();
        let line = line.strip_prefix("candidate:").unwrap_or(line);
        let fields: Vec<&str> = line.split_whitespace().collect();

        if fields.len() < 8 {
            return Err(malformed("expected at least 8 fields"));
        }
        if fields[1].parse::<u16>().is_err() {
            return Err(malformed("component is not a number"));
        }
        if !matches!(fields[2].to_ascii_lowercase().as_str(), "udp" | "tcp") {
            return Err(malformed("unknown transport"));
        }
        if fields[3].parse::<u32>().is_err() {
            return Err(malformed("priority is not a number"));
        }
        if fields[5].parse::<u16>().is_err() {
            return Err(malformed("port is not a number"));
        }
        if fields[6] != "typ" {
            return Err(malformed("missing 'typ' keyword"));
        }
        if !matches!(fields[7], "host" | "srflx" | "prflx" | "relay") {
            return Err(malformed("unknown candidate type"));
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }
}
