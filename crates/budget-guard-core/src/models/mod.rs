//! Data models for Budget Guard

mod billing;
mod budget;
mod pubsub;

pub use billing::*;
pub use budget::*;
pub use pubsub::*;
