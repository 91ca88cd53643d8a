//! Topology type definitions.
//!
//! Plain value types for the elements of a virtual internetwork: nodes,
//! interface endpoints and links, plus the router-vs-switch mode that selects
//! which variant of a topology gets built.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of network element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Runs the student's router code; owns addressed interfaces
    Router,
    /// Application server / end host; owns addressed interfaces
    Host,
    /// Layer 2 forwarding only, address-transparent
    Switch,
}

impl NodeKind {
    /// Returns true if interfaces of this kind receive IP and MAC addresses
    pub fn is_addressed(&self) -> bool {
        !matches!(self, Self::Switch)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Host => "host",
            Self::Switch => "switch",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which variant of a topology to build.
///
/// In `Switch` mode every declared router is replaced by a switch, so the
/// hosts can reach each other without any router code running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Router,
    Switch,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Router => "router",
            Self::Switch => "switch",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "router" => Ok(Self::Router),
            "switch" => Ok(Self::Switch),
            _ => Err(TopologyError::UnknownMode(s.to_string())),
        }
    }
}

/// Handle returned by [`TopologyGraph::add_node`](super::TopologyGraph::add_node)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(pub usize);

/// Handle returned by [`TopologyGraph::add_link`](super::TopologyGraph::add_link)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkRef(pub usize);

/// A network element. Immutable once added to a graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// Position in node-declaration order
    pub ordinal: usize,
}

/// One side of a link: a node and one of its local port indices
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: String,
    pub port: usize,
}

impl Endpoint {
    pub fn new(node: impl Into<String>, port: usize) -> Self {
        Self { node: node.into(), port }
    }

    /// Interface name as seen by the emulator and the student's router,
    /// e.g. `r0-eth2`
    pub fn interface_name(&self) -> String {
        interface_name(&self.node, self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-eth{}", self.node, self.port)
    }
}

/// Derive the interface name for a node's local port index
pub fn interface_name(node: &str, port: usize) -> String {
    format!("{}-eth{}", node, port)
}

/// Asymmetric link rates in Mbit/s
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bandwidth {
    pub up_mbit: u32,
    pub down_mbit: u32,
}

/// Optional per-link attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOptions {
    pub bandwidth: Option<Bandwidth>,
    /// Explicit third octet for this link's subnet instead of the ordinal default
    pub subnet: Option<u8>,
}

/// An undirected link between two interface slots; one broadcast domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Position in link-declaration order
    pub ordinal: usize,
    pub a: Endpoint,
    pub b: Endpoint,
    pub options: LinkOptions,
}

impl Link {
    /// Returns the endpoint on `node`'s side, if the link touches it
    pub fn endpoint_of(&self, node: &str) -> Option<&Endpoint> {
        if self.a.node == node {
            Some(&self.a)
        } else if self.b.node == node {
            Some(&self.b)
        } else {
            None
        }
    }

    /// Returns the endpoint opposite to `node`
    pub fn peer_of(&self, node: &str) -> Option<&Endpoint> {
        if self.a.node == node {
            Some(&self.b)
        } else if self.b.node == node {
            Some(&self.a)
        } else {
            None
        }
    }
}

/// Topology declaration errors. All of them abort generation before any
/// artifact is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("Node id cannot be empty")]
    EmptyNodeId,

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Invalid port {port} on node {node}: {reason}")]
    InvalidPort {
        node: String,
        port: i64,
        reason: &'static str,
    },

    #[error("Link connects node {0} to itself")]
    SelfLink(String),

    #[error("Unsupported mode '{0}' (expected 'router' or 'switch')")]
    UnknownMode(String),

    #[error("Invalid topology: {0}")]
    InvalidSpec(String),
}
