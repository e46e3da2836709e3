mod engine_event;
mod webrtc_engine;

pub use engine_event::*;
pub use webrtc_engine::*;

use anyhow::Result;
use async_trait::async_trait;
use parley_core::{
    Configuration, DataChannelOptions, IceCandidate, OfferOptions, SessionDescription,
    SignalingState,
};

/// The real-time transport the adapter drives.
///
/// Implementations own the signaling state machine: they reject commands that
/// do not fit the current state and report every state change through the
/// event sender handed to [`TransportEngine::start`].
#[async_trait]
pub trait TransportEngine: Send + Sync + 'static {
    /// Handle returned for data channels, used with the engine's own send/receive API.
    type Channel: Clone + Send + Sync + 'static;

    async fn start(config: Configuration, events: EngineEventSender<Self::Channel>) -> Result<Self>
    where
        Self: Sized;

    async fn create_local_offer(&self, options: Option<OfferOptions>) -> Result<SessionDescription>;

    async fn create_local_answer(&self) -> Result<SessionDescription>;

    async fn apply_local_description(&self, desc: SessionDescription) -> Result<()>;

    async fn apply_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn open_data_channel(
        &self,
        label: &str,
        options: Option<DataChannelOptions>,
    ) -> Result<Self::Channel>;

    async fn local_description(&self) -> Option<SessionDescription>;

    async fn remote_description(&self) -> Option<SessionDescription>;

    fn signaling_state(&self) -> SignalingState;

    /// Releases every engine resource. Must tolerate repeated calls.
    async fn teardown(&self);
}
