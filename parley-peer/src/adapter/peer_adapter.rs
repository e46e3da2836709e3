use crate::engine::{EngineEventReceiver, TransportEngine, WebRtcEngine, engine_channel};
use crate::error::{Error, NegotiationStep, Result};
use crate::feed::{Feeds, Subscription, dispatch};
use crate::policy::{StreamGroupingPolicy, SyntheticStreamPolicy};
use anyhow::anyhow;
use parking_lot::Mutex;
use parley_core::{
    Configuration, ConnectionId, ConnectionState, DataChannelOptions, IceCandidate, MediaStream,
    OfferOptions, SessionDescription, SignalingState,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Adapter over the `webrtc` crate engine.
pub type WebRtcPeer = PeerAdapter<WebRtcEngine>;

/// Remote candidates kept while no remote description is set.
pub const MAX_PENDING_CANDIDATES: usize = 64;

/// Drives the offer/answer/ICE exchange of one connection.
///
/// The adapter exclusively owns its transport engine. Commands go to the
/// engine; everything the engine reports comes back through the feeds
/// ([`signaling_states`](Self::signaling_states), [`candidates`](Self::candidates),
/// [`inbound_media`](Self::inbound_media), ...). After [`close`](Self::close)
/// every command fails with [`Error::Closed`]. Dropping an adapter that was
/// never closed tears the engine down on a background task.
pub struct PeerAdapter<E: TransportEngine> {
    id: ConnectionId,
    engine: Arc<E>,
    feeds: Arc<Feeds<E::Channel>>,
    /// Remote candidates that arrived before any remote description.
    pending_candidates: Mutex<Vec<IceCandidate>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl<E: TransportEngine> PeerAdapter<E> {
    /// Starts a fresh engine with `config`. Must be called inside a tokio runtime.
    pub async fn new(config: Configuration) -> Result<Self> {
        let (events_tx, events_rx) = engine_channel();
        let engine = E::start(config, events_tx)
            .await
            .map_err(Error::Construction)?;
        Ok(Self::with_engine(engine, events_rx))
    }

    /// Wraps an engine that is already running and reports to `events`.
    pub fn with_engine(engine: E, events: EngineEventReceiver<E::Channel>) -> Self {
        Self::with_policy(engine, events, Box::new(SyntheticStreamPolicy::new()))
    }

    pub fn with_policy(
        engine: E,
        events: EngineEventReceiver<E::Channel>,
        policy: Box<dyn StreamGroupingPolicy>,
    ) -> Self {
        let id = ConnectionId::new();
        let feeds = Arc::new(Feeds::new());
        let dispatcher = tokio::spawn(dispatch(id, events, feeds.clone(), policy));

        info!("[{}] Peer adapter started", id);

        Self {
            id,
            engine: Arc::new(engine),
            feeds,
            pending_candidates: Mutex::new(Vec::new()),
            dispatcher: Mutex::new(Some(dispatcher)),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn signaling_state(&self) -> SignalingState {
        if self.is_closed() {
            return SignalingState::Closed;
        }
        self.engine.signaling_state()
    }

    pub async fn local_description(&self) -> Option<SessionDescription> {
        self.engine.local_description().await
    }

    pub async fn remote_description(&self) -> Option<SessionDescription> {
        self.engine.remote_description().await
    }

    pub fn pending_candidate_count(&self) -> usize {
        self.pending_candidates.lock().len()
    }

    /// Creates an offer, applies it locally and returns the local description
    /// as the engine holds it after application.
    pub async fn create_offer(&self, options: Option<OfferOptions>) -> Result<SessionDescription> {
        self.ensure_open()?;
        debug!("[{}] Creating offer", self.id);

        let offer = self
            .engine
            .create_local_offer(options)
            .await
            .map_err(Error::negotiation(NegotiationStep::CreateOffer))?;

        self.apply_local(offer).await
    }

    /// Applies `remote_offer`, then creates and applies the answer.
    pub async fn create_answer(
        &self,
        remote_offer: SessionDescription,
    ) -> Result<SessionDescription> {
        self.ensure_open()?;
        if !remote_offer.is_offer() {
            return Err(Error::Negotiation {
                step: NegotiationStep::ApplyRemote,
                source: anyhow!("expected a remote offer, got {}", remote_offer.sdp_type),
            });
        }
        debug!("[{}] Answering remote offer", self.id);

        self.apply_remote(remote_offer).await?;

        let answer = self
            .engine
            .create_local_answer()
            .await
            .map_err(Error::negotiation(NegotiationStep::CreateAnswer))?;

        self.apply_local(answer).await
    }

    /// Applies a remote description (an answer to our offer, or a new remote offer).
    pub async fn set_remote(&self, description: SessionDescription) -> Result<()> {
        self.ensure_open()?;
        debug!("[{}] Applying remote {}", self.id, description.sdp_type);

        self.apply_remote(description).await
    }

    /// Hands a remote candidate to the engine.
    ///
    /// Candidates arriving before any remote description are kept and applied
    /// right after the next remote description, up to
    /// [`MAX_PENDING_CANDIDATES`]. Trickled candidates after negotiation
    /// finished are accepted as usual.
    ///
    /// Commands are not meant to run concurrently on one adapter. A remote
    /// description applied while a candidate is being buffered still picks
    /// the candidate up.
    pub async fn add_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.ensure_open()?;
        candidate
            .validate()
            .map_err(|e| Error::Candidate(e.into()))?;

        if self.engine.remote_description().await.is_none() {
            {
                let mut pending = self.pending_candidates.lock();
                if pending.len() >= MAX_PENDING_CANDIDATES {
                    return Err(Error::Candidate(anyhow!(
                        "{} candidates already wait for a remote description",
                        pending.len()
                    )));
                }
                debug!("[{}] Buffering candidate until a remote description is set", self.id);
                pending.push(candidate);
            }

            // The remote description may have landed after the check above.
            if self.engine.remote_description().await.is_some() {
                self.flush_pending_candidates().await;
            }
            return Ok(());
        }

        self.engine
            .add_remote_candidate(candidate)
            .await
            .map_err(Error::Candidate)
    }

    pub async fn create_data_channel(
        &self,
        label: &str,
        options: Option<DataChannelOptions>,
    ) -> Result<E::Channel> {
        self.ensure_open()?;
        debug!("[{}] Opening data channel '{}'", self.id, label);

        self.engine
            .open_data_channel(label, options)
            .await
            .map_err(|source| Error::Channel {
                label: label.to_owned(),
                source,
            })
    }

    /// Tears the connection down. Only the first call has any effect.
    ///
    /// Commands still in flight are not awaited and may never settle.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("[{}] Closing peer adapter", self.id);

        // Aborting drops the grouping policy and with it the pending synthetic stream.
        if let Some(dispatcher) = self.dispatcher.lock().take() {
            dispatcher.abort();
        }

        self.engine.teardown().await;
        self.pending_candidates.lock().clear();
        self.feeds.close();
    }

    pub fn signaling_states(&self) -> Subscription<SignalingState> {
        self.feeds.signaling.subscribe()
    }

    pub fn connection_states(&self) -> Subscription<ConnectionState> {
        self.feeds.connection.subscribe()
    }

    /// Locally gathered candidates to relay to the remote party.
    pub fn candidates(&self) -> Subscription<IceCandidate> {
        self.feeds.candidates.subscribe()
    }

    pub fn inbound_media(&self) -> Subscription<MediaStream> {
        self.feeds.media.subscribe()
    }

    /// Data channels opened by the remote party.
    pub fn data_channels(&self) -> Subscription<E::Channel> {
        self.feeds.data_channels.subscribe()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    async fn apply_local(&self, description: SessionDescription) -> Result<SessionDescription> {
        self.engine
            .apply_local_description(description)
            .await
            .map_err(Error::negotiation(NegotiationStep::ApplyLocal))?;

        self.engine.local_description().await.ok_or_else(|| Error::Negotiation {
            step: NegotiationStep::ReadLocal,
            source: anyhow!("engine holds no local description after applying one"),
        })
    }

    async fn apply_remote(&self, description: SessionDescription) -> Result<()> {
        self.engine
            .apply_remote_description(description)
            .await
            .map_err(Error::negotiation(NegotiationStep::ApplyRemote))?;

        self.flush_pending_candidates().await;
        Ok(())
    }

    // The add_candidate calls that queued these already returned, so failures can only be logged.
    async fn flush_pending_candidates(&self) {
        let pending = std::mem::take(&mut *self.pending_candidates.lock());
        if pending.is_empty() {
            return;
        }
        debug!("[{}] Applying {} buffered candidates", self.id, pending.len());

        for candidate in pending {
            if let Err(e) = self.engine.add_remote_candidate(candidate).await {
                warn!("[{}] Buffered candidate rejected: {:?}", self.id, e);
            }
        }
    }
}

impl<E: TransportEngine> Drop for PeerAdapter<E> {
    fn drop(&mut self) {
        if let Some(dispatcher) = self.dispatcher.get_mut().take() {
            dispatcher.abort();
        }
        debug!("[{}] Dropping peer adapter", self.id);

        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let engine = self.engine.clone();
                handle.spawn(async move { engine.teardown().await });
            }
            Err(_) => warn!(
                "[{}] Dropped outside a tokio runtime without close(), engine left running",
                self.id
            ),
        }
    }
}
