use anyhow::{Result, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use parley_core::{
    Configuration, ConnectionState, DataChannelOptions, IceCandidate, MediaStream, OfferOptions,
    RemoteTrack, SdpType, SessionDescription, SignalingState,
};
use parley_peer::{EngineEvent, EngineEventSender, PeerAdapter, TransportEngine, engine_channel};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Line the mock adds when it applies a local description, like an engine
/// stamping its DTLS fingerprint.
pub const MOCK_FINGERPRINT: &str = "a=fingerprint:sha-256 00:11:22:33";

static SESSION_IDS: AtomicU64 = AtomicU64::new(1);

/// Handle returned by [`MockEngine::open_data_channel`].
#[derive(Debug, Clone, PartialEq)]
pub struct MockChannel {
    pub label: String,
    pub id: u16,
    pub options: Option<DataChannelOptions>,
}

struct MockState {
    signaling: SignalingState,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    candidates: Vec<IceCandidate>,
    channels: Vec<String>,
    channel_limit: usize,
    teardowns: usize,
    fail_next_offer: bool,
}

/// Transport engine with a scripted JSEP signaling state machine and no network.
pub struct MockEngine {
    session: u64,
    state: Arc<Mutex<MockState>>,
    events: EngineEventSender<MockChannel>,
}

/// Test-side view of a [`MockEngine`] owned by an adapter.
#[derive(Clone)]
pub struct MockProbe {
    state: Arc<Mutex<MockState>>,
    events: EngineEventSender<MockChannel>,
}

impl MockEngine {
    pub fn new(events: EngineEventSender<MockChannel>) -> Self {
        Self {
            session: SESSION_IDS.fetch_add(1, Ordering::Relaxed),
            state: Arc::new(Mutex::new(MockState {
                signaling: SignalingState::Stable,
                local: None,
                remote: None,
                candidates: Vec::new(),
                channels: Vec::new(),
                channel_limit: 4,
                teardowns: 0,
                fail_next_offer: false,
            })),
            events,
        }
    }

    pub fn probe(&self) -> MockProbe {
        MockProbe {
            state: self.state.clone(),
            events: self.events.clone(),
        }
    }

    fn sdp(&self, setup: &str) -> String {
        format!(
            "v=0\r\no=- {} 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\na=group:BUNDLE 0\r\n\
             m=application 9 UDP/DTLS/SCTP webrtc-datachannel\r\na=mid:0\r\na=setup:{}\r\n",
            self.session, setup
        )
    }

    fn transition(&self, next: SignalingState) {
        let mut state = self.state.lock();
        if state.signaling != next {
            state.signaling = next;
            let _ = self.events.send(EngineEvent::SignalingStateChanged(next));
        }
    }
}

/// An adapter over a fresh mock engine, plus the probe into that engine.
pub fn mock_adapter() -> (PeerAdapter<MockEngine>, MockProbe) {
    let (events_tx, events_rx) = engine_channel();
    let engine = MockEngine::new(events_tx);
    let probe = engine.probe();
    (PeerAdapter::with_engine(engine, events_rx), probe)
}

#[async_trait]
impl TransportEngine for MockEngine {
    type Channel = MockChannel;

    async fn start(config: Configuration, events: EngineEventSender<Self::Channel>) -> Result<Self> {
        for url in config.ice_servers.iter().flat_map(|s| s.urls.iter()) {
            if !(url.starts_with("stun:") || url.starts_with("turn:")) {
                bail!("unsupported ICE server url '{}'", url);
            }
        }
        Ok(Self::new(events))
    }

    async fn create_local_offer(&self, _options: Option<OfferOptions>) -> Result<SessionDescription> {
        let signaling = {
            let mut state = self.state.lock();
            if std::mem::take(&mut state.fail_next_offer) {
                bail!("offer generation failed");
            }
            state.signaling
        };
        if !matches!(signaling, SignalingState::Stable | SignalingState::HaveLocalOffer) {
            bail!("cannot create an offer in state {}", signaling);
        }
        Ok(SessionDescription::offer(self.sdp("actpass")))
    }

    async fn create_local_answer(&self) -> Result<SessionDescription> {
        let signaling = self.state.lock().signaling;
        if !matches!(
            signaling,
            SignalingState::HaveRemoteOffer | SignalingState::HaveLocalPranswer
        ) {
            bail!("cannot create an answer in state {}", signaling);
        }
        Ok(SessionDescription::answer(self.sdp("active")))
    }

    async fn apply_local_description(&self, desc: SessionDescription) -> Result<()> {
        use SignalingState::*;

        let current = self.state.lock().signaling;
        let next = match (desc.sdp_type, current) {
            (SdpType::Offer, Stable | HaveLocalOffer) => HaveLocalOffer,
            (SdpType::Answer, HaveRemoteOffer | HaveLocalPranswer) => Stable,
            (SdpType::Pranswer, HaveRemoteOffer | HaveLocalPranswer) => HaveLocalPranswer,
            (SdpType::Rollback, HaveLocalOffer) => Stable,
            (sdp_type, state) => bail!("cannot apply local {} in state {}", sdp_type, state),
        };

        let applied = match desc.sdp_type {
            SdpType::Rollback => None,
            _ => Some(SessionDescription::new(
                desc.sdp_type,
                format!("{}{}\r\n", desc.sdp, MOCK_FINGERPRINT),
            )),
        };
        self.state.lock().local = applied;
        self.transition(next);
        Ok(())
    }

    async fn apply_remote_description(&self, desc: SessionDescription) -> Result<()> {
        use SignalingState::*;

        if desc.sdp_type != SdpType::Rollback && !desc.sdp.starts_with("v=0") {
            bail!("malformed SDP");
        }

        let current = self.state.lock().signaling;
        let next = match (desc.sdp_type, current) {
            (SdpType::Offer, Stable | HaveRemoteOffer) => HaveRemoteOffer,
            (SdpType::Answer, HaveLocalOffer | HaveRemotePranswer) => Stable,
            (SdpType::Pranswer, HaveLocalOffer | HaveRemotePranswer) => HaveRemotePranswer,
            (SdpType::Rollback, HaveRemoteOffer) => Stable,
            (sdp_type, state) => bail!("cannot apply remote {} in state {}", sdp_type, state),
        };

        self.state.lock().remote = (desc.sdp_type != SdpType::Rollback).then_some(desc);
        self.transition(next);
        Ok(())
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let mut state = self.state.lock();
        let Some(remote) = &state.remote else {
            bail!("no remote description");
        };
        if let Some(mid) = &candidate.sdp_mid {
            if !remote.sdp.contains(&format!("a=mid:{}\r\n", mid)) {
                bail!("no media line with mid '{}'", mid);
            }
        }
        state.candidates.push(candidate);
        Ok(())
    }

    async fn open_data_channel(
        &self,
        label: &str,
        options: Option<DataChannelOptions>,
    ) -> Result<Self::Channel> {
        let mut state = self.state.lock();
        if label.len() > u16::MAX as usize {
            bail!("label too long");
        }
        if state.channels.len() >= state.channel_limit {
            bail!("channel limit of {} reached", state.channel_limit);
        }
        state.channels.push(label.to_owned());
        Ok(MockChannel {
            label: label.to_owned(),
            id: (state.channels.len() - 1) as u16,
            options,
        })
    }

    async fn local_description(&self) -> Option<SessionDescription> {
        self.state.lock().local.clone()
    }

    async fn remote_description(&self) -> Option<SessionDescription> {
        self.state.lock().remote.clone()
    }

    fn signaling_state(&self) -> SignalingState {
        self.state.lock().signaling
    }

    async fn teardown(&self) {
        let mut state = self.state.lock();
        state.teardowns += 1;
        state.signaling = SignalingState::Closed;
    }
}

impl MockProbe {
    pub fn teardown_count(&self) -> usize {
        self.state.lock().teardowns
    }

    /// Remote candidates the engine accepted, in order.
    pub fn applied_candidates(&self) -> Vec<IceCandidate> {
        self.state.lock().candidates.clone()
    }

    pub fn fail_next_offer(&self) {
        self.state.lock().fail_next_offer = true;
    }

    pub fn set_channel_limit(&self, limit: usize) {
        self.state.lock().channel_limit = limit;
    }

    pub fn gather_candidate(&self, candidate: IceCandidate) {
        let _ = self.events.send(EngineEvent::CandidateGathered(candidate));
    }

    pub fn receive_track(&self, track: RemoteTrack, streams: Vec<MediaStream>) {
        let _ = self.events.send(EngineEvent::TrackReceived(track, streams));
    }

    pub fn set_connection_state(&self, state: ConnectionState) {
        let _ = self.events.send(EngineEvent::ConnectionStateChanged(state));
    }

    pub fn open_remote_channel(&self, label: &str) {
        let _ = self.events.send(EngineEvent::DataChannelOpened(MockChannel {
            label: label.to_owned(),
            id: u16::MAX,
            options: None,
        }));
    }
}
