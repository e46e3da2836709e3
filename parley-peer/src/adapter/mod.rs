mod peer_adapter;

pub use peer_adapter::*;
