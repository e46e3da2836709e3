mod dispatcher;
mod feed;

pub(crate) use dispatcher::dispatch;
pub use feed::{Feed, Subscription};

use parley_core::{ConnectionState, IceCandidate, MediaStream, SignalingState};

/// The event feeds one adapter exposes.
pub(crate) struct Feeds<C> {
    pub(crate) signaling: Feed<SignalingState>,
    pub(crate) connection: Feed<ConnectionState>,
    pub(crate) candidates: Feed<IceCandidate>,
    pub(crate) media: Feed<MediaStream>,
    pub(crate) data_channels: Feed<C>,
}

impl<C: Clone + Send + 'static> Feeds<C> {
    pub(crate) fn new() -> Self {
        Self {
            signaling: Feed::new(),
            connection: Feed::new(),
            candidates: Feed::new(),
            media: Feed::new(),
            data_channels: Feed::new(),
        }
    }

    /// Publishes the terminal states, then ends every subscription.
    pub(crate) fn close(&self) {
        self.signaling.publish(SignalingState::Closed);
        self.connection.publish(ConnectionState::Closed);

        self.signaling.close();
        self.connection.close();
        self.candidates.close();
        self.media.close();
        self.data_channels.close();
    }
}
