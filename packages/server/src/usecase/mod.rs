//! UseCase layer: inbound event routing and presence snapshots.

pub mod presence;
pub mod router;

pub use router::{BrokerConfig, MessageRouter};
