//! Interface Table generation.
//!
//! One record per addressed router interface, in ascending port order,
//! serialized as `name ip netmask mac`.

use log::info;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::io;
use std::net::Ipv4Addr;
use std::path::Path;

use crate::ip::{AddressPlan, InterfaceAddress, MacAddr};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceRecord {
    pub name: String,
    pub ip: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub mac: MacAddr,
}

impl From<&InterfaceAddress> for InterfaceRecord {
    fn from(iface: &InterfaceAddress) -> Self {
        Self {
            name: iface.name.clone(),
            ip: iface.ip,
            netmask: iface.netmask(),
            mac: iface.mac,
        }
    }
}

impl fmt::Display for InterfaceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.name, self.ip, self.netmask, self.mac)
    }
}

/// Interface configuration of one router
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceTable {
    pub router: String,
    pub records: Vec<InterfaceRecord>,
}

impl InterfaceTable {
    /// Collect the interface records of `router` from a validated plan
    pub fn generate(plan: &AddressPlan, router: &str) -> Self {
        info!("Creating itable for {}", router);
        Self {
            router: router.to_string(),
            records: plan.interfaces_of(router).map(InterfaceRecord::from).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Interface names referenced by this table
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.name.as_str())
    }

    /// File contents: one line per record, each terminated by a newline
    pub fn to_text(&self) -> String {
        self.records
            .iter()
            .map(|record| format!("{}\n", record))
            .collect()
    }

    /// Replace `path` with this table
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{LinkOptions, NodeKind, TopologyGraph};

    fn forth() -> AddressPlan {
        let mut graph = TopologyGraph::new("forth");
        graph.add_node("r0", NodeKind::Router).unwrap();
        for host in ["h0", "h1", "h2"] {
            graph.add_node(host, NodeKind::Host).unwrap();
            graph.add_link("r0", None, host, None, LinkOptions::default()).unwrap();
        }
        AddressPlan::assign(&graph).unwrap()
    }

    #[test]
    fn test_one_line_per_router_interface() {
        let table = InterfaceTable::generate(&forth(), "r0");
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.to_text(),
            "r0-eth0 10.0.1.1 255.255.255.0 02:00:00:00:00:01\n\
             r0-eth1 10.0.2.1 255.255.255.0 02:00:00:00:00:02\n\
             r0-eth2 10.0.3.1 255.255.255.0 02:00:00:00:00:03\n"
        );
    }

    #[test]
    fn test_unknown_router_yields_empty_table() {
        let table = InterfaceTable::generate(&forth(), "r9");
        assert!(table.is_empty());
        assert_eq!(table.to_text(), "");
    }

    #[test]
    fn test_write_to_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("itable.conf");
        fs::write(&path, "stale contents that are longer than the table\n".repeat(10)).unwrap();

        let table = InterfaceTable::generate(&forth(), "r0");
        table.write_to(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), table.to_text());
    }
}
