//! Address registry.
//!
//! Tracks which interface owns each assigned IP and MAC so that a collision
//! is caught while the plan is built instead of in the emulated network.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use super::allocator::AddressPlanError;
use super::mac::MacAddr;

/// Owner lookup for assigned addresses, keyed by address
#[derive(Debug, Clone, Default)]
pub struct AddressRegistry {
    /// IP -> interface name
    ips: HashMap<Ipv4Addr, String>,
    /// MAC -> interface name
    macs: HashMap<MacAddr, String>,
}

impl AddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register both addresses of one interface. Nothing is recorded if
    /// either address is already taken.
    pub fn register(
        &mut self,
        interface: &str,
        ip: Ipv4Addr,
        mac: MacAddr,
    ) -> Result<(), AddressPlanError> {
        if let Some(owner) = self.ips.get(&ip) {
            return Err(AddressPlanError::DuplicateAddress {
                address: ip.to_string(),
                first: owner.clone(),
                second: interface.to_string(),
            });
        }
        if let Some(owner) = self.macs.get(&mac) {
            return Err(AddressPlanError::DuplicateAddress {
                address: mac.to_string(),
                first: owner.clone(),
                second: interface.to_string(),
            });
        }

        self.ips.insert(ip, interface.to_string());
        self.macs.insert(mac, interface.to_string());
        Ok(())
    }

    pub fn owner_of_ip(&self, ip: Ipv4Addr) -> Option<&str> {
        self.ips.get(&ip).map(String::as_str)
    }
}
