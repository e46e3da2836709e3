pub use parley_core::{ConnectionId, ModelError};

pub mod model {
    pub use parley_core::model::*;
}

#[cfg(feature = "peer")]
pub mod peer {
    pub use parley_peer::*;
}

#[cfg(feature = "peer")]
pub use parley_peer::{Error, PeerAdapter, WebRtcPeer};
