//! Network topology module.
//!
//! This module contains the typed topology graph (routers, hosts, switches and
//! the links between their interface slots) and the declarative description
//! it is built from.

pub mod types;
pub mod graph;
pub mod spec;

// Re-export key types for easier access
pub use types::{
    interface_name, Bandwidth, Endpoint, Link, LinkOptions, LinkRef, Mode, Node, NodeKind,
    NodeRef, TopologyError,
};
pub use graph::{Slot, TopologyGraph};
pub use spec::{LinkSpec, NodeSpec, TopologySpec, UplinkSpec};
