//! Emulation driver boundary.
//!
//! An external emulator instantiates the nodes and links and applies the
//! addresses at the OS level. It gets everything it needs from one JSON
//! manifest: the node list, the per-interface address list and the links with
//! their rate limits.

use log::info;
use serde::Serialize;
use std::net::Ipv4Addr;

use crate::ip::{AddressPlan, MacAddr};
use crate::topology::{Bandwidth, Mode, NodeKind, TopologyGraph};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeManifestEntry {
    pub id: String,
    pub kind: NodeKind,
    pub interfaces: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressManifestEntry {
    pub node: String,
    pub port: usize,
    pub interface: String,
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    pub netmask: Ipv4Addr,
    /// Default gateway for hosts: the router address on the host's link
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway: Option<Ipv4Addr>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkManifestEntry {
    pub ordinal: usize,
    pub a: String,
    pub b: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<Bandwidth>,
}

/// Everything an emulator needs to instantiate one generated network
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverManifest {
    pub topology: String,
    pub mode: Mode,
    pub nodes: Vec<NodeManifestEntry>,
    pub addresses: Vec<AddressManifestEntry>,
    pub links: Vec<LinkManifestEntry>,
    /// Border router interface facing the external gateway
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uplink: Option<String>,
}

impl DriverManifest {
    pub fn build(graph: &TopologyGraph, plan: &AddressPlan, mode: Mode) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| NodeManifestEntry {
                id: node.id.clone(),
                kind: node.kind,
                interfaces: graph.interface_count(&node.id),
            })
            .collect();

        let addresses = plan
            .interfaces()
            .iter()
            .map(|iface| AddressManifestEntry {
                node: iface.node.clone(),
                port: iface.port,
                interface: iface.name.clone(),
                ip: iface.ip,
                mac: iface.mac,
                netmask: iface.netmask(),
                gateway: host_gateway(graph, plan, &iface.node, iface.port, iface.kind),
            })
            .collect();

        let links = graph
            .links()
            .iter()
            .map(|link| LinkManifestEntry {
                ordinal: link.ordinal,
                a: link.a.interface_name(),
                b: link.b.interface_name(),
                bandwidth: link.options.bandwidth,
            })
            .collect();

        let manifest = Self {
            topology: graph.name().to_string(),
            mode,
            nodes,
            addresses,
            links,
            uplink: graph.uplink().map(|endpoint| endpoint.interface_name()),
        };
        info!(
            "Driver manifest: {} nodes, {} addresses, {} links",
            manifest.nodes.len(),
            manifest.addresses.len(),
            manifest.links.len()
        );
        manifest
    }

    /// Ordered `(node id, kind, interface count)`
    pub fn node_list(&self) -> impl Iterator<Item = (&str, NodeKind, usize)> {
        self.nodes
            .iter()
            .map(|node| (node.id.as_str(), node.kind, node.interfaces))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Router address across the link from a host interface, if any
fn host_gateway(
    graph: &TopologyGraph,
    plan: &AddressPlan,
    node: &str,
    port: usize,
    kind: NodeKind,
) -> Option<Ipv4Addr> {
    if kind != NodeKind::Host {
        return None;
    }
    graph
        .slots(node)
        .into_iter()
        .find(|slot| slot.port() == port)
        .filter(|slot| graph.kind_of(&slot.remote.node) == Some(NodeKind::Router))
        .and_then(|slot| plan.address_of(slot.remote))
        .map(|router| router.ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::LinkOptions;

    fn tyne() -> (TopologyGraph, AddressPlan) {
        let mut graph = TopologyGraph::new("tyne");
        graph.add_node("s0", NodeKind::Switch).unwrap();
        graph.add_node("r0", NodeKind::Router).unwrap();
        graph.add_node("h0", NodeKind::Host).unwrap();
        graph.add_node("h1", NodeKind::Host).unwrap();
        graph.add_link("s0", None, "r0", None, LinkOptions::default()).unwrap();
        graph.add_link("r0", None, "h0", None, LinkOptions::default()).unwrap();
        graph
            .add_link(
                "r0",
                None,
                "h1",
                None,
                LinkOptions {
                    bandwidth: Some(Bandwidth {
                        up_mbit: 1,
                        down_mbit: 10,
                    }),
                    subnet: None,
                },
            )
            .unwrap();
        graph.set_uplink("r0", 0).unwrap();
        let plan = AddressPlan::assign(&graph).unwrap();
        (graph, plan)
    }

    #[test]
    fn test_node_list() {
        let (graph, plan) = tyne();
        let manifest = DriverManifest::build(&graph, &plan, Mode::Router);
        let nodes: Vec<_> = manifest.node_list().collect();
        assert_eq!(
            nodes,
            vec![
                ("s0", NodeKind::Switch, 1),
                ("r0", NodeKind::Router, 3),
                ("h0", NodeKind::Host, 1),
                ("h1", NodeKind::Host, 1),
            ]
        );
        assert_eq!(manifest.uplink.as_deref(), Some("r0-eth0"));
    }

    #[test]
    fn test_hosts_get_their_router_as_gateway() {
        let (graph, plan) = tyne();
        let manifest = DriverManifest::build(&graph, &plan, Mode::Router);

        let h1 = manifest.addresses.iter().find(|a| a.node == "h1").unwrap();
        assert_eq!(h1.ip, Ipv4Addr::new(10, 0, 3, 2));
        assert_eq!(h1.gateway, Some(Ipv4Addr::new(10, 0, 3, 1)));

        let r0 = manifest.addresses.iter().find(|a| a.interface == "r0-eth0").unwrap();
        assert_eq!(r0.gateway, None);
        assert!(manifest.addresses.iter().all(|a| a.node != "s0"));
    }

    #[test]
    fn test_json_shape() {
        let (graph, plan) = tyne();
        let json = DriverManifest::build(&graph, &plan, Mode::Router).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["topology"], "tyne");
        assert_eq!(value["mode"], "router");
        assert_eq!(value["nodes"][0]["kind"], "switch");
        assert_eq!(value["addresses"][0]["mac"], "02:00:00:00:00:01");
        assert_eq!(value["links"][2]["bandwidth"]["down_mbit"], 10);
        assert!(value["links"][0].get("bandwidth").is_none());
    }
}
