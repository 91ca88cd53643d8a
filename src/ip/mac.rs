//! MAC address derivation.
//!
//! Every addressed interface gets a locally administered MAC of the form
//! `02:00:00:<class>:<ordinal>:<port + 1>`, where `class` separates routers
//! from hosts and `ordinal` is the node's position among nodes of its kind.

use serde::{Serialize, Serializer};
use std::fmt;

use super::allocator::AddressPlanError;
use crate::topology::NodeKind;

/// Locally administered, unicast prefix shared by all generated MACs
pub const MAC_PREFIX: [u8; 3] = [0x02, 0x00, 0x00];

const ROUTER_CLASS: u8 = 0x00;
const HOST_CLASS: u8 = 0x10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Derive the MAC for `port` on the `ordinal`-th node of `kind`.
    ///
    /// Switches are address-transparent and have no MAC in the plan.
    pub fn derive(kind: NodeKind, ordinal: usize, port: usize) -> Result<Self, AddressPlanError> {
        let class = match kind {
            NodeKind::Router => ROUTER_CLASS,
            NodeKind::Host => HOST_CLASS,
            NodeKind::Switch => {
                return Err(AddressPlanError::InconsistentEndpoints(
                    "switch interfaces are not addressed".to_string(),
                ))
            }
        };
        let ordinal = u8::try_from(ordinal).map_err(|_| AddressPlanError::MacSpaceExhausted {
            kind,
            ordinal,
            port,
        })?;
        let slot = u8::try_from(port + 1).map_err(|_| AddressPlanError::MacSpaceExhausted {
            kind,
            ordinal: usize::from(ordinal),
            port,
        })?;

        Ok(Self([
            MAC_PREFIX[0],
            MAC_PREFIX[1],
            MAC_PREFIX[2],
            class,
            ordinal,
            slot,
        ]))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_router_and_host_macs() {
        let r1 = MacAddr::derive(NodeKind::Router, 1, 2).unwrap();
        assert_eq!(r1.to_string(), "02:00:00:00:01:03");
        assert_eq!(r1.0[0] & 0x03, 0x02);

        let h0 = MacAddr::derive(NodeKind::Host, 0, 0).unwrap();
        assert_eq!(h0.to_string(), "02:00:00:10:00:01");
        assert_ne!(MacAddr::derive(NodeKind::Router, 0, 0).unwrap(), h0);
    }

    #[test]
    fn test_mac_space_exhausted() {
        assert!(matches!(
            MacAddr::derive(NodeKind::Router, 256, 0),
            Err(AddressPlanError::MacSpaceExhausted { ordinal: 256, .. })
        ));
        assert!(matches!(
            MacAddr::derive(NodeKind::Host, 0, 255),
            Err(AddressPlanError::MacSpaceExhausted { port: 255, .. })
        ));
        assert!(MacAddr::derive(NodeKind::Switch, 0, 0).is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let mac = MacAddr::derive(NodeKind::Host, 2, 0).unwrap();
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"02:00:00:10:02:01\"");
    }
}
