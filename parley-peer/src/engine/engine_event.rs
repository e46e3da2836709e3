use parley_core::{ConnectionState, IceCandidate, MediaStream, RemoteTrack, SignalingState};
use tokio::sync::mpsc;

/// Events a transport engine reports back to the adapter that owns it.
pub enum EngineEvent<C> {
    /// The negotiation sub-state moved.
    SignalingStateChanged(SignalingState),

    /// Overall connectivity moved (connecting, connected, failed, ...).
    ConnectionStateChanged(ConnectionState),

    /// A local candidate was gathered and should reach the remote party.
    CandidateGathered(IceCandidate),

    /// Inbound media arrived. The stream list is empty for ungrouped tracks.
    TrackReceived(RemoteTrack, Vec<MediaStream>),

    /// The remote party opened a data channel.
    DataChannelOpened(C),
}

pub type EngineEventSender<C> = mpsc::UnboundedSender<EngineEvent<C>>;
pub type EngineEventReceiver<C> = mpsc::UnboundedReceiver<EngineEvent<C>>;

pub fn engine_channel<C>() -> (EngineEventSender<C>, EngineEventReceiver<C>) {
    mpsc::unbounded_channel()
}
