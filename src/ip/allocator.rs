//! Address assignment.
//!
//! Each link is one `/24` broadcast domain inside `10.0.0.0/16`: the third
//! octet is the link ordinal plus one (or an explicit per-link override) and
//! the fourth octet is picked by endpoint role. Routers take `.1`, hosts take
//! `.2`; two endpoints of the same role are numbered in the order the link
//! declares them. Switch endpoints are address-transparent, so a link to a
//! switch only addresses the other side, by that side's role.
//!
//! The plan is a pure function of the graph: regenerating it from the same
//! topology yields the same addresses.

use ipnet::{Ipv4Net, PrefixLenError};
use log::{debug, info};
use serde::Serialize;
use std::collections::HashMap;
use std::net::Ipv4Addr;

use super::mac::MacAddr;
use super::registry::AddressRegistry;
use crate::topology::{Endpoint, NodeKind, TopologyGraph};

/// First two octets of every generated address
pub const BASE_NETWORK: [u8; 2] = [10, 0];

/// Prefix length of every link subnet
pub const SUBNET_PREFIX_LEN: u8 = 24;

/// Third-octet values `1..=254` are available for link subnets
pub const MAX_SUBNETS: usize = 254;

/// Address plan errors. No partial plan is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressPlanError {
    #[error("Address space exhausted: {links} links declared, at most {max} subnets available")]
    AddressSpaceExhausted { links: usize, max: usize },

    #[error("Link {link} requests subnet {subnet}, outside 1..=254")]
    InvalidSubnet { link: usize, subnet: u8 },

    #[error("Subnet 10.0.{subnet}.0/24 assigned to both link {first} and link {second}")]
    SubnetCollision { subnet: u8, first: usize, second: usize },

    #[error("MAC space exhausted for {kind} #{ordinal} port {port}")]
    MacSpaceExhausted {
        kind: NodeKind,
        ordinal: usize,
        port: usize,
    },

    #[error("Inconsistent link endpoints: {0}")]
    InconsistentEndpoints(String),

    #[error("Address {address} assigned to both {first} and {second}")]
    DuplicateAddress {
        address: String,
        first: String,
        second: String,
    },

    #[error(transparent)]
    PrefixLen(#[from] PrefixLenError),
}

/// The `/24` assigned to one link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Subnet {
    /// Ordinal of the link this subnet belongs to
    pub link: usize,
    pub index: u8,
    pub net: Ipv4Net,
}

impl Subnet {
    fn new(link: usize, index: u8) -> Result<Self, AddressPlanError> {
        let network = Ipv4Addr::new(BASE_NETWORK[0], BASE_NETWORK[1], index, 0);
        Ok(Self {
            link,
            index,
            net: Ipv4Net::new(network, SUBNET_PREFIX_LEN)?,
        })
    }

    pub fn host(&self, host_id: u8) -> Ipv4Addr {
        let [a, b, c, _] = self.net.network().octets();
        Ipv4Addr::new(a, b, c, host_id)
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        self.net.contains(&ip)
    }
}

/// Addresses of one interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceAddress {
    pub node: String,
    pub kind: NodeKind,
    pub port: usize,
    pub name: String,
    pub ip: Ipv4Addr,
    /// Network of the link the interface sits on
    pub net: Ipv4Net,
    pub mac: MacAddr,
    /// Ordinal of the link the interface sits on
    pub link: usize,
}

impl InterfaceAddress {
    pub fn netmask(&self) -> Ipv4Addr {
        self.net.netmask()
    }
}

/// Complete, validated address assignment for one graph
#[derive(Debug, Clone)]
pub struct AddressPlan {
    subnets: Vec<Subnet>,
    /// Sorted by node ordinal, then port
    interfaces: Vec<InterfaceAddress>,
    index: HashMap<(String, usize), usize>,
    registry: AddressRegistry,
}

impl AddressPlan {
    /// Assign subnets, IPs and MACs to every addressed interface of `graph`
    pub fn assign(graph: &TopologyGraph) -> Result<Self, AddressPlanError> {
        let subnets = assign_subnets(graph)?;
        let kind_ordinals = kind_ordinals(graph);
        let mut registry = AddressRegistry::new();
        let mut interfaces = Vec::new();

        for (link, subnet) in graph.links().iter().zip(&subnets) {
            let kind_a = endpoint_kind(graph, &link.a)?;
            let kind_b = endpoint_kind(graph, &link.b)?;
            let (host_a, host_b) = host_ids(kind_a, kind_b);

            for (endpoint, kind, host_id) in [(&link.a, kind_a, host_a), (&link.b, kind_b, host_b)]
            {
                let Some(host_id) = host_id else {
                    continue;
                };
                let ordinal = kind_ordinals
                    .get(endpoint.node.as_str())
                    .copied()
                    .ok_or_else(|| {
                        AddressPlanError::InconsistentEndpoints(format!(
                            "node {} is not in the graph",
                            endpoint.node
                        ))
                    })?;
                let name = endpoint.interface_name();
                let ip = subnet.host(host_id);
                let mac = MacAddr::derive(kind, ordinal, endpoint.port)?;
                registry.register(&name, ip, mac)?;
                debug!("{} -> {} {}", name, ip, mac);

                interfaces.push(InterfaceAddress {
                    node: endpoint.node.clone(),
                    kind,
                    port: endpoint.port,
                    name,
                    ip,
                    net: subnet.net,
                    mac,
                    link: link.ordinal,
                });
            }
        }

        interfaces.sort_by_key(|iface| {
            (
                graph.node(&iface.node).map_or(usize::MAX, |node| node.ordinal),
                iface.port,
            )
        });
        let index = interfaces
            .iter()
            .enumerate()
            .map(|(i, iface)| ((iface.node.clone(), iface.port), i))
            .collect();

        let plan = Self {
            subnets,
            interfaces,
            index,
            registry,
        };
        plan.verify(graph)?;

        info!(
            "Address plan for {}: {} subnets, {} addressed interfaces",
            graph.name(),
            plan.subnets.len(),
            plan.interfaces.len()
        );
        Ok(plan)
    }

    /// Check that both addressed endpoints of every link share its prefix
    pub fn verify(&self, graph: &TopologyGraph) -> Result<(), AddressPlanError> {
        for link in graph.links() {
            let subnet = self.subnet_of_link(link.ordinal).ok_or_else(|| {
                AddressPlanError::InconsistentEndpoints(format!("link {} has no subnet", link.ordinal))
            })?;
            let a = self.address_of(&link.a);
            let b = self.address_of(&link.b);

            for iface in [a, b].into_iter().flatten() {
                if !subnet.contains(iface.ip) {
                    return Err(AddressPlanError::InconsistentEndpoints(format!(
                        "{} ({}) is outside {}",
                        iface.name, iface.ip, subnet.net
                    )));
                }
            }
            if let (Some(a), Some(b)) = (a, b) {
                if a.net != b.net {
                    return Err(AddressPlanError::InconsistentEndpoints(format!(
                        "{} and {} are on different networks",
                        a.name, b.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    pub fn subnet_of_link(&self, link: usize) -> Option<&Subnet> {
        self.subnets.get(link)
    }

    /// All addressed interfaces, ordered by node declaration then port
    pub fn interfaces(&self) -> &[InterfaceAddress] {
        &self.interfaces
    }

    /// Addressed interfaces of `node`, in ascending port order
    pub fn interfaces_of<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a InterfaceAddress> + 'a {
        self.interfaces.iter().filter(move |iface| iface.node == node)
    }

    pub fn interface(&self, node: &str, port: usize) -> Option<&InterfaceAddress> {
        self.index
            .get(&(node.to_string(), port))
            .map(|&i| &self.interfaces[i])
    }

    pub fn address_of(&self, endpoint: &Endpoint) -> Option<&InterfaceAddress> {
        self.interface(&endpoint.node, endpoint.port)
    }

    /// Name of the interface holding `ip`, if any
    pub fn owner_of(&self, ip: Ipv4Addr) -> Option<&str> {
        self.registry.owner_of_ip(ip)
    }
}

fn assign_subnets(graph: &TopologyGraph) -> Result<Vec<Subnet>, AddressPlanError> {
    let links = graph.links();
    let mut taken: HashMap<u8, usize> = HashMap::new();
    let mut subnets = Vec::with_capacity(links.len());

    for link in links {
        let index = match link.options.subnet {
            Some(index) if index == 0 || usize::from(index) > MAX_SUBNETS => {
                return Err(AddressPlanError::InvalidSubnet {
                    link: link.ordinal,
                    subnet: index,
                });
            }
            Some(index) => index,
            None => u8::try_from(link.ordinal + 1)
                .ok()
                .filter(|&index| usize::from(index) <= MAX_SUBNETS)
                .ok_or(AddressPlanError::AddressSpaceExhausted {
                    links: links.len(),
                    max: MAX_SUBNETS,
                })?,
        };

        if let Some(&first) = taken.get(&index) {
            return Err(AddressPlanError::SubnetCollision {
                subnet: index,
                first,
                second: link.ordinal,
            });
        }
        taken.insert(index, link.ordinal);
        subnets.push(Subnet::new(link.ordinal, index)?);
    }

    Ok(subnets)
}

/// Position of every node among the nodes of its own kind
fn kind_ordinals(graph: &TopologyGraph) -> HashMap<&str, usize> {
    let mut counters: HashMap<NodeKind, usize> = HashMap::new();
    graph
        .nodes()
        .iter()
        .map(|node| {
            let counter = counters.entry(node.kind).or_insert(0);
            let ordinal = *counter;
            *counter += 1;
            (node.id.as_str(), ordinal)
        })
        .collect()
}

fn endpoint_kind(graph: &TopologyGraph, endpoint: &Endpoint) -> Result<NodeKind, AddressPlanError> {
    graph.kind_of(&endpoint.node).ok_or_else(|| {
        AddressPlanError::InconsistentEndpoints(format!("node {} is not in the graph", endpoint.node))
    })
}

/// Lower rank gets the lower host number; switches get none
fn role_rank(kind: NodeKind) -> Option<u8> {
    match kind {
        NodeKind::Router => Some(0),
        NodeKind::Host => Some(1),
        NodeKind::Switch => None,
    }
}

/// Fourth octet for each side of a link
fn host_ids(a: NodeKind, b: NodeKind) -> (Option<u8>, Option<u8>) {
    match (role_rank(a), role_rank(b)) {
        (Some(rank_a), Some(rank_b)) if rank_b < rank_a => (Some(2), Some(1)),
        (Some(_), Some(_)) => (Some(1), Some(2)),
        (Some(rank), None) => (Some(rank + 1), None),
        (None, Some(rank)) => (None, Some(rank + 1)),
        (None, None) => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::LinkOptions;

    fn graph_with(nodes: &[(&str, NodeKind)], links: &[(&str, &str)]) -> TopologyGraph {
        let mut graph = TopologyGraph::new("test");
        for (id, kind) in nodes {
            graph.add_node(id, *kind).unwrap();
        }
        for (a, b) in links {
            graph.add_link(a, None, b, None, LinkOptions::default()).unwrap();
        }
        graph
    }

    #[test]
    fn test_routers_take_the_lower_host_number() {
        // Declared host-first, like the humber h0 <-> r0 link
        let graph = graph_with(
            &[("r0", NodeKind::Router), ("h0", NodeKind::Host)],
            &[("h0", "r0")],
        );
        let plan = AddressPlan::assign(&graph).unwrap();

        assert_eq!(plan.interface("r0", 0).unwrap().ip, Ipv4Addr::new(10, 0, 1, 1));
        assert_eq!(plan.interface("h0", 0).unwrap().ip, Ipv4Addr::new(10, 0, 1, 2));
        assert_eq!(plan.interface("h0", 0).unwrap().netmask(), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(plan.subnets()[0].net.to_string(), "10.0.1.0/24");
        assert_eq!(plan.owner_of(Ipv4Addr::new(10, 0, 1, 2)), Some("h0-eth0"));
        assert_eq!(plan.owner_of(Ipv4Addr::new(10, 0, 1, 3)), None);
    }

    #[test]
    fn test_same_role_uses_declaration_order() {
        let graph = graph_with(
            &[("r0", NodeKind::Router), ("r1", NodeKind::Router)],
            &[("r1", "r0")],
        );
        let plan = AddressPlan::assign(&graph).unwrap();
        assert_eq!(plan.interface("r1", 0).unwrap().ip, Ipv4Addr::new(10, 0, 1, 1));
        assert_eq!(plan.interface("r0", 0).unwrap().ip, Ipv4Addr::new(10, 0, 1, 2));
    }

    #[test]
    fn test_switches_are_addressless() {
        let graph = graph_with(
            &[("s0", NodeKind::Switch), ("r0", NodeKind::Router), ("h0", NodeKind::Host)],
            &[("s0", "r0"), ("s0", "h0")],
        );
        let plan = AddressPlan::assign(&graph).unwrap();

        assert!(plan.interfaces_of("s0").next().is_none());
        assert_eq!(plan.interface("r0", 0).unwrap().ip, Ipv4Addr::new(10, 0, 1, 1));
        assert_eq!(plan.interface("h0", 0).unwrap().ip, Ipv4Addr::new(10, 0, 2, 2));
        assert_eq!(plan.interfaces().len(), 2);
    }

    #[test]
    fn test_subnet_override_and_collision() {
        let mut graph = graph_with(
            &[("r0", NodeKind::Router), ("h0", NodeKind::Host), ("h1", NodeKind::Host)],
            &[("r0", "h0")],
        );
        graph
            .add_link(
                "r0",
                None,
                "h1",
                None,
                LinkOptions {
                    subnet: Some(12),
                    ..LinkOptions::default()
                },
            )
            .unwrap();
        let plan = AddressPlan::assign(&graph).unwrap();
        assert_eq!(plan.interface("h1", 0).unwrap().ip, Ipv4Addr::new(10, 0, 12, 2));

        graph.add_node("h2", NodeKind::Host).unwrap();
        graph
            .add_link(
                "r0",
                None,
                "h2",
                None,
                LinkOptions {
                    subnet: Some(1),
                    ..LinkOptions::default()
                },
            )
            .unwrap();
        assert_eq!(
            AddressPlan::assign(&graph).unwrap_err(),
            AddressPlanError::SubnetCollision {
                subnet: 1,
                first: 0,
                second: 2
            }
        );
    }

    #[test]
    fn test_invalid_subnet_override() {
        let mut graph = graph_with(&[("r0", NodeKind::Router), ("h0", NodeKind::Host)], &[]);
        graph
            .add_link(
                "r0",
                None,
                "h0",
                None,
                LinkOptions {
                    subnet: Some(255),
                    ..LinkOptions::default()
                },
            )
            .unwrap();
        assert!(matches!(
            AddressPlan::assign(&graph),
            Err(AddressPlanError::InvalidSubnet { subnet: 255, .. })
        ));
    }

    #[test]
    fn test_address_space_exhausted() {
        let mut graph = TopologyGraph::new("big");
        graph.add_node("r0", NodeKind::Router).unwrap();
        for i in 0..=MAX_SUBNETS {
            let switch = format!("s{}", i);
            graph.add_node(&switch, NodeKind::Switch).unwrap();
            graph.add_link("r0", None, &switch, None, LinkOptions::default()).unwrap();
        }
        assert_eq!(
            AddressPlan::assign(&graph).unwrap_err(),
            AddressPlanError::AddressSpaceExhausted {
                links: MAX_SUBNETS + 1,
                max: MAX_SUBNETS
            }
        );
    }

    #[test]
    fn test_macs_are_unique_per_interface() {
        let graph = graph_with(
            &[
                ("r0", NodeKind::Router),
                ("r1", NodeKind::Router),
                ("h0", NodeKind::Host),
                ("h1", NodeKind::Host),
            ],
            &[("r0", "r1"), ("r0", "h0"), ("r1", "h1")],
        );
        let plan = AddressPlan::assign(&graph).unwrap();
        let mut macs: Vec<_> = plan.interfaces().iter().map(|iface| iface.mac).collect();
        macs.sort();
        macs.dedup();
        assert_eq!(macs.len(), plan.interfaces().len());
        assert_eq!(plan.interface("r1", 1).unwrap().mac.to_string(), "02:00:00:00:01:02");
        assert_eq!(plan.interface("h1", 0).unwrap().mac.to_string(), "02:00:00:10:01:01");
    }

    #[test]
    fn test_interfaces_ordered_by_node_then_port() {
        let graph = graph_with(
            &[("r0", NodeKind::Router), ("h0", NodeKind::Host), ("h1", NodeKind::Host)],
            &[("h1", "r0"), ("h0", "r0")],
        );
        let plan = AddressPlan::assign(&graph).unwrap();
        let names: Vec<&str> = plan.interfaces().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["r0-eth0", "r0-eth1", "h0-eth0", "h1-eth0"]);
    }
}
