mod adapter;
mod engine;
mod error;
mod feed;
mod policy;

pub use adapter::*;
pub use engine::*;
pub use error::*;
pub use feed::*;
pub use policy::*;
