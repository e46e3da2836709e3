use crate::engine::{EngineEvent, EngineEventSender, TransportEngine};
use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use parley_core::{
    BundlePolicy, Configuration, ConnectionState, DataChannelOptions, IceCandidate, MediaStream,
    OfferOptions, RemoteTrack, SdpType, SessionDescription, SignalingState,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::offer_answer_options::RTCOfferOptions;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::policy::bundle_policy::RTCBundlePolicy;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::track::track_remote::TrackRemote;

/// [`TransportEngine`] backed by the `webrtc` crate.
pub struct WebRtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
    /// Groupings keyed by msid stream id, so tracks of one remote stream share a container.
    streams: Arc<DashMap<String, MediaStream>>,
}

impl WebRtcEngine {
    pub fn peer_connection(&self) -> &Arc<RTCPeerConnection> {
        &self.peer_connection
    }

    fn register_callbacks(&self, events: EngineEventSender<Arc<RTCDataChannel>>) {
        let state_tx = events.clone();
        self.peer_connection
            .on_signaling_state_change(Box::new(move |s: RTCSignalingState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    debug!("Signaling state changed: {}", s);
                    if let Some(state) = signaling_state_from_rtc(s) {
                        let _ = tx.send(EngineEvent::SignalingStateChanged(state));
                    }
                })
            }));

        let conn_tx = events.clone();
        self.peer_connection
            .on_peer_connection_state_change(Box::new(move |s: RTCPeerConnectionState| {
                let tx = conn_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state changed: {}", s);
                    if let Some(state) = connection_state_from_rtc(s) {
                        let _ = tx.send(EngineEvent::ConnectionStateChanged(state));
                    }
                })
            }));

        // Trickle ICE: `None` marks the end of gathering and is not forwarded.
        let ice_tx = events.clone();
        self.peer_connection
            .on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
                let tx = ice_tx.clone();
                Box::pin(async move {
                    let Some(candidate) = c else {
                        debug!("ICE gathering complete");
                        return;
                    };
                    match candidate_from_rtc(&candidate) {
                        Ok(candidate) => {
                            let _ = tx.send(EngineEvent::CandidateGathered(candidate));
                        }
                        Err(e) => warn!("Dropping local candidate that failed to encode: {:?}", e),
                    }
                })
            }));

        let track_tx = events.clone();
        let streams = self.streams.clone();
        self.peer_connection.on_track(Box::new(
            move |remote: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let streams = streams.clone();
                Box::pin(async move {
                    let track = RemoteTrack::from_remote(remote);
                    debug!("Track '{}' received ({:?})", track.id, track.kind);

                    let grouping = reported_grouping(&streams, &track);
                    let _ = tx.send(EngineEvent::TrackReceived(track, grouping));
                })
            },
        ));

        let dc_tx = events;
        self.peer_connection
            .on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
                let tx = dc_tx.clone();
                Box::pin(async move {
                    debug!("Remote DataChannel '{}' announced", dc.label());
                    let _ = tx.send(EngineEvent::DataChannelOpened(dc));
                })
            }));
    }
}

#[async_trait]
impl TransportEngine for WebRtcEngine {
    type Channel = Arc<RTCDataChannel>;

    async fn start(config: Configuration, events: EngineEventSender<Self::Channel>) -> Result<Self> {
        // Codecs are registered even for data-only sessions so remote media offers can be answered.
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_configuration(config))
                .await
                .context("Failed to create peer connection")?,
        );

        let engine = Self {
            peer_connection,
            streams: Arc::new(DashMap::new()),
        };
        engine.register_callbacks(events);

        Ok(engine)
    }

    async fn create_local_offer(&self, options: Option<OfferOptions>) -> Result<SessionDescription> {
        let options = options.map(|o| RTCOfferOptions {
            ice_restart: o.ice_restart,
            voice_activity_detection: o.voice_activity_detection,
        });
        let offer = self.peer_connection.create_offer(options).await?;
        description_from_rtc(offer).context("Engine produced an offer without a type")
    }

    async fn create_local_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        description_from_rtc(answer).context("Engine produced an answer without a type")
    }

    async fn apply_local_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = description_to_rtc(desc)?;
        self.peer_connection.set_local_description(desc).await?;
        Ok(())
    }

    async fn apply_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = description_to_rtc(desc)?;
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init: RTCIceCandidateInit = serde_json::from_value(serde_json::to_value(&candidate)?)
            .context("Failed to convert ICE candidate")?;
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn open_data_channel(
        &self,
        label: &str,
        options: Option<DataChannelOptions>,
    ) -> Result<Self::Channel> {
        let init = options.map(|o| RTCDataChannelInit {
            ordered: o.ordered,
            max_packet_life_time: o.max_packet_life_time,
            max_retransmits: o.max_retransmits,
            protocol: o.protocol,
            negotiated: o.negotiated_id,
        });
        let channel = self.peer_connection.create_data_channel(label, init).await?;
        Ok(channel)
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.peer_connection
            .local_description()
            .await
            .and_then(description_from_rtc)
    }

    async fn remote_description(&self) -> Option<SessionDescription> {
        self.peer_connection
            .remote_description()
            .await
            .and_then(description_from_rtc)
    }

    fn signaling_state(&self) -> SignalingState {
        signaling_state_from_rtc(self.peer_connection.signaling_state())
            .unwrap_or(SignalingState::Stable)
    }

    async fn teardown(&self) {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Error while closing peer connection: {:?}", e);
        }
        self.streams.clear();
    }
}

/// The groupings the remote side announced for `track`. Tracks sharing an
/// msid stream id share one container; ungrouped tracks get none.
fn reported_grouping(
    streams: &DashMap<String, MediaStream>,
    track: &RemoteTrack,
) -> Vec<MediaStream> {
    let Some(stream_id) = &track.stream_id else {
        return Vec::new();
    };
    let stream = streams
        .entry(stream_id.clone())
        .or_insert_with(|| MediaStream::new(stream_id.clone()))
        .value()
        .clone();
    stream.add_track(track.clone());
    vec![stream]
}

fn rtc_configuration(config: Configuration) -> RTCConfiguration {
    let ice_servers = config
        .ice_servers
        .into_iter()
        .map(|server| RTCIceServer {
            urls: server.urls,
            username: server.username.unwrap_or_default(),
            credential: server.credential.unwrap_or_default(),
            ..Default::default()
        })
        .collect();

    let bundle_policy = match config.bundle_policy {
        BundlePolicy::Balanced => RTCBundlePolicy::Balanced,
        BundlePolicy::MaxCompat => RTCBundlePolicy::MaxCompat,
        BundlePolicy::MaxBundle => RTCBundlePolicy::MaxBundle,
    };

    RTCConfiguration {
        ice_servers,
        bundle_policy,
        certificates: config.certificates,
        ice_candidate_pool_size: config.ice_candidate_pool_size,
        ..Default::default()
    }
}

fn description_to_rtc(desc: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match desc.sdp_type {
        SdpType::Offer => RTCSessionDescription::offer(desc.sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(desc.sdp)?,
        SdpType::Pranswer => RTCSessionDescription::pranswer(desc.sdp)?,
        // No constructor exists for rollback; it carries no SDP to parse.
        SdpType::Rollback => serde_json::from_value(serde_json::json!({
            "type": "rollback",
            "sdp": "",
        }))?,
    };
    Ok(rtc)
}

fn description_from_rtc(desc: RTCSessionDescription) -> Option<SessionDescription> {
    let sdp_type = match desc.sdp_type {
        RTCSdpType::Offer => SdpType::Offer,
        RTCSdpType::Answer => SdpType::Answer,
        RTCSdpType::Pranswer => SdpType::Pranswer,
        RTCSdpType::Rollback => SdpType::Rollback,
        RTCSdpType::Unspecified => return None,
    };
    Some(SessionDescription::new(sdp_type, desc.sdp))
}

fn candidate_from_rtc(candidate: &RTCIceCandidate) -> Result<IceCandidate> {
    let init = candidate.to_json()?;
    Ok(serde_json::from_value(serde_json::to_value(init)?)?)
}

fn signaling_state_from_rtc(state: RTCSignalingState) -> Option<SignalingState> {
    match state {
        RTCSignalingState::Stable => Some(SignalingState::Stable),
        RTCSignalingState::HaveLocalOffer => Some(SignalingState::HaveLocalOffer),
        RTCSignalingState::HaveRemoteOffer => Some(SignalingState::HaveRemoteOffer),
        RTCSignalingState::HaveLocalPranswer => Some(SignalingState::HaveLocalPranswer),
        RTCSignalingState::HaveRemotePranswer => Some(SignalingState::HaveRemotePranswer),
        RTCSignalingState::Closed => Some(SignalingState::Closed),
        RTCSignalingState::Unspecified => None,
    }
}

fn connection_state_from_rtc(state: RTCPeerConnectionState) -> Option<ConnectionState> {
    match state {
        RTCPeerConnectionState::New => Some(ConnectionState::New),
        RTCPeerConnectionState::Connecting => Some(ConnectionState::Connecting),
        RTCPeerConnectionState::Connected => Some(ConnectionState::Connected),
        RTCPeerConnectionState::Disconnected => Some(ConnectionState::Disconnected),
        RTCPeerConnectionState::Failed => Some(ConnectionState::Failed),
        RTCPeerConnectionState::Closed => Some(ConnectionState::Closed),
        RTCPeerConnectionState::Unspecified => None,
    }
}
