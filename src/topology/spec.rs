//! Declarative topology descriptions.
//!
//! A topology is written once as a list of nodes and links (usually YAML) and
//! built into a [`TopologyGraph`] for either the router-mode or the
//! switch-mode variant.

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::graph::TopologyGraph;
use super::types::{Bandwidth, LinkOptions, Mode, NodeKind, TopologyError};

/// Declarative topology: `(node, kind)` and `(link)` tuples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopologySpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
    /// Border router interface facing the external gateway
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uplink: Option<UplinkSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    pub id: String,
    pub kind: NodeKind,
    /// Id used when a router is replaced by a switch in switch mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub switch_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkSpec {
    pub a: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_port: Option<i64>,
    pub b: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b_port: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<Bandwidth>,
    /// Omit this link from the switch-mode variant
    #[serde(default)]
    pub router_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UplinkSpec {
    pub node: String,
    pub port: i64,
}

impl TopologySpec {
    /// Check the description before anything is built
    pub fn validate(&self) -> Result<(), TopologyError> {
        if self.name.trim().is_empty() {
            return Err(TopologyError::InvalidSpec(
                "topology name cannot be empty".to_string(),
            ));
        }
        if self.nodes.is_empty() {
            return Err(TopologyError::InvalidSpec(format!(
                "topology {} declares no nodes",
                self.name
            )));
        }
        for node in &self.nodes {
            if node.switch_id.is_some() && node.kind != NodeKind::Router {
                return Err(TopologyError::InvalidSpec(format!(
                    "switch_id is only meaningful on routers (node {})",
                    node.id
                )));
            }
        }
        Ok(())
    }

    /// Build the graph for the requested variant.
    ///
    /// Switch mode turns routers into switches (renamed to `switch_id` when
    /// set), drops `router_only` links and drops the uplink.
    pub fn build(&self, mode: Mode) -> Result<TopologyGraph, TopologyError> {
        self.validate()?;

        let mut graph = TopologyGraph::new(&self.name);
        let mut renamed: HashMap<&str, &str> = HashMap::new();

        for node in &self.nodes {
            let (id, kind) = match (node.kind, mode) {
                (NodeKind::Router, Mode::Switch) => (
                    node.switch_id.as_deref().unwrap_or(node.id.as_str()),
                    NodeKind::Switch,
                ),
                (kind, _) => (node.id.as_str(), kind),
            };
            renamed.insert(node.id.as_str(), id);
            graph.add_node(id, kind)?;
        }
        info!(
            "Created {} routers, {} hosts and {} switches for {} ({} mode)",
            graph.nodes_of_kind(NodeKind::Router).count(),
            graph.nodes_of_kind(NodeKind::Host).count(),
            graph.nodes_of_kind(NodeKind::Switch).count(),
            self.name,
            mode
        );

        info!("Creating links");
        for link in &self.links {
            if link.router_only && mode == Mode::Switch {
                debug!("Skipping router-only link {} <-> {}", link.a, link.b);
                continue;
            }
            let a = resolve(&renamed, &link.a)?;
            let b = resolve(&renamed, &link.b)?;
            let port_a = link.a_port.map(|p| to_port(a, p)).transpose()?;
            let port_b = link.b_port.map(|p| to_port(b, p)).transpose()?;
            let options = LinkOptions {
                bandwidth: link.bandwidth,
                subnet: link.subnet,
            };
            graph.add_link(a, port_a, b, port_b, options)?;
        }

        if let Some(uplink) = &self.uplink {
            if mode == Mode::Router {
                let node = resolve(&renamed, &uplink.node)?;
                graph.set_uplink(node, to_port(node, uplink.port)?)?;
            } else {
                debug!("Switch mode: uplink on {} is not used", uplink.node);
            }
        }

        Ok(graph)
    }
}

fn resolve<'a>(renamed: &HashMap<&str, &'a str>, id: &str) -> Result<&'a str, TopologyError> {
    renamed
        .get(id)
        .copied()
        .ok_or_else(|| TopologyError::UnknownNode(id.to_string()))
}

fn to_port(node: &str, port: i64) -> Result<usize, TopologyError> {
    usize::try_from(port).map_err(|_| TopologyError::InvalidPort {
        node: node.to_string(),
        port,
        reason: "port index cannot be negative",
    })
}
