//! Topology graph builder.
//!
//! A general undirected multigraph of routers, hosts and switches. Rings and
//! meshes are valid; the only structural rules are unique node ids and one
//! link per interface slot.

use log::debug;
use std::collections::{HashMap, HashSet};

use super::types::{
    Endpoint, Link, LinkOptions, LinkRef, Node, NodeKind, NodeRef, TopologyError,
};

/// One linked interface slot of a node, as seen from that node
#[derive(Debug, Clone, Copy)]
pub struct Slot<'a> {
    pub link: &'a Link,
    pub local: &'a Endpoint,
    pub remote: &'a Endpoint,
}

impl Slot<'_> {
    pub fn port(&self) -> usize {
        self.local.port
    }
}

/// Network elements and links of one generated network
#[derive(Debug, Clone, Default)]
pub struct TopologyGraph {
    name: String,
    nodes: Vec<Node>,
    links: Vec<Link>,
    index: HashMap<String, usize>,
    used_ports: HashSet<(usize, usize)>,
    next_port: HashMap<usize, usize>,
    uplink: Option<Endpoint>,
}

impl TopologyGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a node. Ids must be unique within the graph.
    pub fn add_node(&mut self, id: &str, kind: NodeKind) -> Result<NodeRef, TopologyError> {
        if id.trim().is_empty() {
            return Err(TopologyError::EmptyNodeId);
        }
        if self.index.contains_key(id) {
            return Err(TopologyError::DuplicateNodeId(id.to_string()));
        }

        let ordinal = self.nodes.len();
        self.nodes.push(Node {
            id: id.to_string(),
            kind,
            ordinal,
        });
        self.index.insert(id.to_string(), ordinal);
        debug!("Added {} {} (ordinal {})", kind, id, ordinal);

        Ok(NodeRef(ordinal))
    }

    /// Connect two interface slots.
    ///
    /// A `None` port takes the node's next free index (one past the highest
    /// port used so far), which is how the emulator numbers interfaces.
    pub fn add_link(
        &mut self,
        node_a: &str,
        port_a: Option<usize>,
        node_b: &str,
        port_b: Option<usize>,
        options: LinkOptions,
    ) -> Result<LinkRef, TopologyError> {
        let a = self.lookup(node_a)?;
        let b = self.lookup(node_b)?;
        if a == b {
            return Err(TopologyError::SelfLink(node_a.to_string()));
        }

        let port_a = self.claim_port(a, port_a)?;
        let port_b = match self.claim_port(b, port_b) {
            Ok(port) => port,
            Err(e) => {
                self.release_port(a, port_a);
                return Err(e);
            }
        };

        let ordinal = self.links.len();
        let link = Link {
            ordinal,
            a: Endpoint::new(node_a, port_a),
            b: Endpoint::new(node_b, port_b),
            options,
        };
        debug!("Added link {} {} <-> {}", ordinal, link.a, link.b);
        self.links.push(link);

        Ok(LinkRef(ordinal))
    }

    /// Mark a router interface as facing the external gateway / NAT
    pub fn set_uplink(&mut self, node: &str, port: usize) -> Result<(), TopologyError> {
        let idx = self.lookup(node)?;
        if self.nodes[idx].kind != NodeKind::Router {
            return Err(TopologyError::InvalidSpec(format!(
                "uplink node {} is a {}, not a router",
                node, self.nodes[idx].kind
            )));
        }
        if !self.used_ports.contains(&(idx, port)) {
            return Err(TopologyError::InvalidPort {
                node: node.to_string(),
                port: port_number(port),
                reason: "uplink port is not linked",
            });
        }
        self.uplink = Some(Endpoint::new(node, port));
        Ok(())
    }

    pub fn uplink(&self) -> Option<&Endpoint> {
        self.uplink.as_ref()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn kind_of(&self, id: &str) -> Option<NodeKind> {
        self.node(id).map(|node| node.kind)
    }

    /// Routers in declaration order
    pub fn routers(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes_of_kind(NodeKind::Router)
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(move |node| node.kind == kind)
    }

    /// Linked interface slots of `node`, in ascending port order
    pub fn slots(&self, node: &str) -> Vec<Slot<'_>> {
        let mut slots: Vec<Slot<'_>> = self
            .links
            .iter()
            .filter_map(|link| {
                let local = link.endpoint_of(node)?;
                let remote = link.peer_of(node)?;
                Some(Slot { link, local, remote })
            })
            .collect();
        slots.sort_by_key(|slot| slot.port());
        slots
    }

    /// Number of linked interfaces on `node`
    pub fn interface_count(&self, node: &str) -> usize {
        self.links
            .iter()
            .filter(|link| link.endpoint_of(node).is_some())
            .count()
    }

    fn lookup(&self, id: &str) -> Result<usize, TopologyError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| TopologyError::UnknownNode(id.to_string()))
    }

    fn claim_port(&mut self, node: usize, port: Option<usize>) -> Result<usize, TopologyError> {
        let next = self.next_port.get(&node).copied().unwrap_or(0);
        let port = port.unwrap_or(next);
        let invalid = |reason| TopologyError::InvalidPort {
            node: self.nodes[node].id.clone(),
            port: port_number(port),
            reason,
        };

        let following = port
            .checked_add(1)
            .ok_or_else(|| invalid("port index out of range"))?;
        if self.used_ports.contains(&(node, port)) {
            return Err(invalid("port is already linked"));
        }
        self.used_ports.insert((node, port));
        if port >= next {
            self.next_port.insert(node, following);
        }
        Ok(port)
    }

    fn release_port(&mut self, node: usize, port: usize) {
        self.used_ports.remove(&(node, port));
        let highest = self
            .used_ports
            .iter()
            .filter(|(n, _)| *n == node)
            .map(|(_, p)| p + 1)
            .max()
            .unwrap_or(0);
        self.next_port.insert(node, highest);
    }
}

/// Port index as reported in errors; indices past `i64::MAX` saturate
fn port_number(port: usize) -> i64 {
    i64::try_from(port).unwrap_or(i64::MAX)
}
