//! # Network Module
//!
//! Overlay routing for the chargemesh network: which node to hand a message
//! to so that it reaches its destination.
//!
//! ```text
//! reachability.rs   one way of reaching a node (direct link or via a hub)
//! routing.rs        concurrent registry of entries plus path selection
//! ```
//!
//! Transports are descriptors only. Opening sockets is the caller's job;
//! this crate stays transport-agnostic.

pub mod reachability;
pub mod routing;

pub use reachability::{NetworkingMode, NodeId, Reachability, ReachabilityPath, Transport};
pub use routing::{RoutingError, RoutingTable};
