mod candidate;
mod channel;
mod config;
mod media;
mod peer;
mod session;
mod signaling;

pub use candidate::IceCandidate;
pub use channel::{DataChannelOptions, Reliability};
pub use config::{
    BundlePolicy, Configuration, DEFAULT_STUN_SERVERS, IceServerConfig, OfferOptions,
};
pub use media::{MediaStream, RemoteTrack, TrackKind, msid_stream_id};
pub use peer::ConnectionId;
pub use session::{SdpType, SessionDescription};
pub use signaling::{ConnectionState, SignalingState};
