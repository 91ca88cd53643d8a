//! IP and MAC address assignment.
//!
//! This module turns a finalized topology graph into an address plan: one
//! subnet per link, one IP and MAC per addressed interface, with uniqueness
//! checked across the whole generated network.

pub mod allocator;
pub mod mac;
pub mod registry;

// Re-export commonly used types
pub use allocator::{AddressPlan, AddressPlanError, InterfaceAddress, Subnet};
pub use mac::MacAddr;
pub use registry::AddressRegistry;
