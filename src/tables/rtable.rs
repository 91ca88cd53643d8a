//! Routing Table generation.
//!
//! Every router gets one on-link entry per addressed interface. Static mode
//! adds an entry for every other routable subnet in the network, and the
//! default entry points at the external gateway from the border router (and,
//! in static mode, toward the border router from everywhere else).
//!
//! Entries are ordered connected, static, default, and serialized as
//! `prefix nexthop netmask iface`.

use ipnet::Ipv4Net;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::Path;

use super::paths::RouterAdjacency;
use crate::ip::AddressPlan;
use crate::topology::{NodeKind, TopologyGraph};

/// Next hop written for destinations reachable on-link
pub const ON_LINK: Ipv4Addr = Ipv4Addr::UNSPECIFIED;

/// How much of the forwarding state is written up front
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingMode {
    /// Connected subnets plus the default entry; a dynamic protocol running
    /// on the routers learns the rest
    #[default]
    Minimal,
    /// Complete tables for every router
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingOptions {
    pub mode: RoutingMode,
    /// Whether the network is connected to the outside world
    pub internet: bool,
    /// External gateway reachable through the border router's uplink
    pub gateway: Option<Ipv4Addr>,
}

impl Default for RoutingOptions {
    fn default() -> Self {
        Self {
            mode: RoutingMode::Minimal,
            internet: true,
            gateway: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingConfigError {
    #[error("Connecting to the internet in static mode, but no external gateway is set")]
    MissingGateway,

    #[error("External gateway {0} given for a network that is not connected to the internet")]
    GatewayWithoutInternet(Ipv4Addr),

    #[error("External gateway given, but topology {0} declares no uplink")]
    NoUplink(String),

    #[error("Invalid external gateway {gateway}: {reason}")]
    InvalidGateway { gateway: Ipv4Addr, reason: String },

    #[error("No path from {router} to {destination}")]
    Unreachable { router: String, destination: String },

    #[error("{0} is not a router")]
    NotARouter(String),
}

impl RoutingOptions {
    /// Check the options against a topology and its address plan before
    /// any table is generated
    pub fn validate(
        &self,
        graph: &TopologyGraph,
        plan: &AddressPlan,
    ) -> Result<(), RoutingConfigError> {
        match self.gateway {
            Some(gateway) if !self.internet => {
                Err(RoutingConfigError::GatewayWithoutInternet(gateway))
            }
            Some(gateway) => check_gateway(graph, plan, gateway),
            None if self.internet && self.mode == RoutingMode::Static => {
                Err(RoutingConfigError::MissingGateway)
            }
            None => Ok(()),
        }
    }

    fn default_gateway(&self) -> Option<Ipv4Addr> {
        if self.internet {
            self.gateway
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteKind {
    Connected,
    Static,
    Default,
}

/// The gateway must be a free host address on the uplink's subnet
fn check_gateway(
    graph: &TopologyGraph,
    plan: &AddressPlan,
    gateway: Ipv4Addr,
) -> Result<(), RoutingConfigError> {
    let uplink = graph
        .uplink()
        .and_then(|uplink| plan.address_of(uplink))
        .ok_or_else(|| RoutingConfigError::NoUplink(graph.name().to_string()))?;
    let invalid = |reason: String| RoutingConfigError::InvalidGateway { gateway, reason };

    if gateway.is_unspecified() {
        return Err(invalid("the unspecified address is not a next hop".to_string()));
    }
    if !uplink.net.contains(&gateway) {
        return Err(invalid(format!("outside {} on uplink {}", uplink.net, uplink.name)));
    }
    if gateway == uplink.net.network() || gateway == uplink.net.broadcast() {
        return Err(invalid(format!("not a host address of {}", uplink.net)));
    }
    if let Some(owner) = plan.owner_of(gateway) {
        return Err(invalid(format!("already assigned to {}", owner)));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingEntry {
    pub destination: Ipv4Net,
    pub next_hop: Ipv4Addr,
    pub interface: String,
    pub kind: RouteKind,
}

impl RoutingEntry {
    pub fn is_default(&self) -> bool {
        self.kind == RouteKind::Default
    }

    pub fn netmask(&self) -> Ipv4Addr {
        self.destination.netmask()
    }
}

impl fmt::Display for RoutingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.destination.network(),
            self.next_hop,
            self.netmask(),
            self.interface
        )
    }
}

/// Initial forwarding table of one router
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingTable {
    pub router: String,
    pub entries: Vec<RoutingEntry>,
}

impl RoutingTable {
    /// Compute the table of `router`.
    ///
    /// `adjacency` must have been built from the same graph and plan.
    pub fn generate(
        graph: &TopologyGraph,
        plan: &AddressPlan,
        adjacency: &RouterAdjacency,
        router: &str,
        options: &RoutingOptions,
    ) -> Result<Self, RoutingConfigError> {
        if graph.kind_of(router) != Some(NodeKind::Router) {
            return Err(RoutingConfigError::NotARouter(router.to_string()));
        }
        options.validate(graph, plan)?;

        let mut entries: Vec<RoutingEntry> = plan
            .interfaces_of(router)
            .map(|iface| RoutingEntry {
                destination: iface.net,
                next_hop: ON_LINK,
                interface: iface.name.clone(),
                kind: RouteKind::Connected,
            })
            .collect();

        if options.mode == RoutingMode::Static {
            info!("Creating full static rtable for {}", router);
            entries.extend(static_entries(graph, plan, adjacency, router)?);
        }

        if let Some(gateway) = options.default_gateway() {
            if let Some(entry) = default_entry(graph, plan, adjacency, router, gateway, options.mode)? {
                info!("Adding external gateway to rtable for {}", router);
                entries.push(entry);
            }
        }

        Ok(Self {
            router: router.to_string(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: RouteKind) -> usize {
        self.entries.iter().filter(|entry| entry.kind == kind).count()
    }

    pub fn default_entry(&self) -> Option<&RoutingEntry> {
        self.entries.iter().find(|entry| entry.is_default())
    }

    /// Egress interface names referenced by this table
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.interface.as_str())
    }

    pub fn to_text(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("{}\n", entry))
            .collect()
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.to_text())
    }
}

/// One entry per routable subnet the router is not attached to
fn static_entries(
    graph: &TopologyGraph,
    plan: &AddressPlan,
    adjacency: &RouterAdjacency,
    router: &str,
) -> Result<Vec<RoutingEntry>, RoutingConfigError> {
    let mut entries = Vec::new();

    for subnet in plan.subnets() {
        let Some(link) = graph.links().get(subnet.link) else {
            continue;
        };
        if link.endpoint_of(router).is_some() {
            continue;
        }

        let targets: Vec<&str> = [&link.a, &link.b]
            .into_iter()
            .filter(|endpoint| graph.kind_of(&endpoint.node) == Some(NodeKind::Router))
            .map(|endpoint| endpoint.node.as_str())
            .collect();
        if targets.is_empty() {
            debug!("{} has no router attached, not routable", subnet.net);
            continue;
        }

        let hop = adjacency
            .first_hop(router, &targets)
            .ok_or_else(|| RoutingConfigError::Unreachable {
                router: router.to_string(),
                destination: subnet.net.to_string(),
            })?;
        entries.push(RoutingEntry {
            destination: subnet.net,
            next_hop: hop.next_hop,
            interface: hop.egress.clone(),
            kind: RouteKind::Static,
        });
    }

    Ok(entries)
}

fn default_entry(
    graph: &TopologyGraph,
    plan: &AddressPlan,
    adjacency: &RouterAdjacency,
    router: &str,
    gateway: Ipv4Addr,
    mode: RoutingMode,
) -> Result<Option<RoutingEntry>, RoutingConfigError> {
    let Some(uplink) = graph.uplink() else {
        return Ok(None);
    };

    let (next_hop, interface) = if uplink.node == router {
        let iface = plan
            .address_of(uplink)
            .ok_or_else(|| RoutingConfigError::NoUplink(graph.name().to_string()))?;
        (gateway, iface.name.clone())
    } else if mode == RoutingMode::Static {
        let hop = adjacency
            .first_hop(router, &[uplink.node.as_str()])
            .ok_or_else(|| RoutingConfigError::Unreachable {
                router: router.to_string(),
                destination: Ipv4Net::default().to_string(),
            })?;
        (hop.next_hop, hop.egress.clone())
    } else {
        return Ok(None);
    };

    Ok(Some(RoutingEntry {
        destination: Ipv4Net::default(),
        next_hop,
        interface,
        kind: RouteKind::Default,
    }))
}
