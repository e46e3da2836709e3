use parley_core::{MediaStream, RemoteTrack};

/// Decides which stream grouping, if any, to emit for an inbound track.
///
/// `reported` holds the groupings the engine attached to the track; it is
/// empty when the engine reported none.
pub trait StreamGroupingPolicy: Send + 'static {
    fn group(&mut self, track: RemoteTrack, reported: &[MediaStream]) -> Option<MediaStream>;
}

/// Default policy for engines that do not always report a grouping.
///
/// Reported groupings are emitted as is (the first one when several are
/// given). Ungrouped tracks all land in one synthetic grouping per
/// connection, emitted once when it is created and filled silently afterwards.
#[derive(Default)]
pub struct SyntheticStreamPolicy {
    pending: Option<MediaStream>,
}

impl SyntheticStreamPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// The synthetic grouping, once the first ungrouped track created it.
    pub fn pending(&self) -> Option<&MediaStream> {
        self.pending.as_ref()
    }
}

impl StreamGroupingPolicy for SyntheticStreamPolicy {
    fn group(&mut self, track: RemoteTrack, reported: &[MediaStream]) -> Option<MediaStream> {
        if let Some(stream) = reported.first() {
            return Some(stream.clone());
        }

        match &self.pending {
            Some(stream) => {
                stream.add_track(track);
                None
            }
            None => {
                let stream = MediaStream::synthetic();
                stream.add_track(track);
                self.pending = Some(stream.clone());
                Some(stream)
            }
        }
    }
}

/// Policy for engines that group tracks reliably: an ungrouped track gets a
/// grouping of its own.
#[derive(Default)]
pub struct ReportedStreamPolicy;

impl StreamGroupingPolicy for ReportedStreamPolicy {
    fn group(&mut self, track: RemoteTrack, reported: &[MediaStream]) -> Option<MediaStream> {
        if let Some(stream) = reported.first() {
            return Some(stream.clone());
        }

        let stream = MediaStream::new(track.id.clone());
        stream.add_track(track);
        Some(stream)
    }
}
