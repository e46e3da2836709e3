mod stream_grouping;

pub use stream_grouping::*;
