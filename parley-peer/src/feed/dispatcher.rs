use crate::engine::{EngineEvent, EngineEventReceiver};
use crate::feed::Feeds;
use crate::policy::StreamGroupingPolicy;
use parley_core::ConnectionId;
use std::sync::Arc;
use tracing::{debug, info};

/// Routes engine events to the feeds until the engine side hangs up or the task is aborted.
pub(crate) async fn dispatch<C: Clone + Send + 'static>(
    id: ConnectionId,
    mut events: EngineEventReceiver<C>,
    feeds: Arc<Feeds<C>>,
    mut policy: Box<dyn StreamGroupingPolicy>,
) {
    debug!("[{}] Event dispatcher started", id);

    while let Some(event) = events.recv().await {
        match event {
            EngineEvent::SignalingStateChanged(state) => {
                debug!("[{}] Signaling state: {}", id, state);
                feeds.signaling.publish(state);
            }

            EngineEvent::ConnectionStateChanged(state) => {
                debug!("[{}] Connection state: {:?}", id, state);
                feeds.connection.publish(state);
            }

            EngineEvent::CandidateGathered(candidate) => {
                debug!("[{}] Local candidate gathered", id);
                feeds.candidates.publish(candidate);
            }

            EngineEvent::TrackReceived(track, streams) => {
                let track_id = track.id.clone();
                match policy.group(track, &streams) {
                    Some(stream) => {
                        debug!("[{}] Track '{}' emitted in stream '{}'", id, track_id, stream.id());
                        feeds.media.publish(stream);
                    }
                    None => debug!("[{}] Track '{}' joined the pending stream", id, track_id),
                }
            }

            EngineEvent::DataChannelOpened(channel) => {
                debug!("[{}] Remote data channel announced", id);
                feeds.data_channels.publish(channel);
            }
        }
    }

    info!("[{}] Engine event channel closed, dispatcher finished", id);
}
