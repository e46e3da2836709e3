use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
    Unspecified,
}

impl From<RTPCodecType> for TrackKind {
    fn from(kind: RTPCodecType) -> Self {
        match kind {
            RTPCodecType::Audio => TrackKind::Audio,
            RTPCodecType::Video => TrackKind::Video,
            _ => TrackKind::Unspecified,
        }
    }
}

/// An inbound media track as announced by the transport engine.
#[derive(Clone)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
    /// The msid stream id the remote side announced, if any.
    pub stream_id: Option<String>,
    source: Option<Arc<TrackRemote>>,
}

impl RemoteTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
            stream_id: None,
            source: None,
        }
    }

    pub fn from_remote(track: Arc<TrackRemote>) -> Self {
        Self {
            id: track.id(),
            kind: track.kind().into(),
            stream_id: msid_stream_id(track.stream_id()),
            source: Some(track),
        }
    }

    pub fn with_stream_id(mut self, stream_id: impl Into<String>) -> Self {
        self.stream_id = msid_stream_id(stream_id.into());
        self
    }

    /// The engine-side track to read RTP from. `None` for detached tracks.
    pub fn source(&self) -> Option<&Arc<TrackRemote>> {
        self.source.as_ref()
    }
}

/// Maps the msid stream id of a track to a grouping id.
///
/// An empty id and the `-` placeholder of `a=msid:- <track>` both mean the
/// track belongs to no stream.
pub fn msid_stream_id(stream_id: String) -> Option<String> {
    match stream_id.trim() {
        "" | "-" => None,
        _ => Some(stream_id),
    }
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("stream_id", &self.stream_id)
            .field("attached", &self.source.is_some())
            .finish()
    }
}

/// A grouping of inbound tracks. Clones share the same track list.
#[derive(Clone)]
pub struct MediaStream {
    id: Arc<str>,
    tracks: Arc<RwLock<Vec<RemoteTrack>>>,
}

impl MediaStream {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Arc::from(id.into()),
            tracks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// A grouping invented locally for tracks the engine reported without one.
    pub fn synthetic() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns false when a track with the same id is already present.
    pub fn add_track(&self, track: RemoteTrack) -> bool {
        let mut tracks = self.tracks.write();
        if tracks.iter().any(|t| t.id == track.id) {
            return false;
        }
        tracks.push(track);
        true
    }

    pub fn tracks(&self) -> Vec<RemoteTrack> {
        self.tracks.read().clone()
    }

    pub fn track_ids(&self) -> Vec<String> {
        self.tracks.read().iter().map(|t| t.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.read().is_empty()
    }

    pub fn ptr_eq(&self, other: &MediaStream) -> bool {
        Arc::ptr_eq(&self.tracks, &other.tracks)
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.track_ids())
            .finish()
    }
}
