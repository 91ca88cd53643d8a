//! Per-router configuration artifacts.
//!
//! Both tables are derived from the same graph and address plan, so they
//! always agree on interface names, addresses and masks.

pub mod itable;
pub mod paths;
pub mod rtable;

pub use itable::{InterfaceRecord, InterfaceTable};
pub use paths::{Hop, RouterAdjacency};
pub use rtable::{
    RouteKind, RoutingConfigError, RoutingEntry, RoutingMode, RoutingOptions, RoutingTable, ON_LINK,
};
