use std::collections::HashMap;

use crate::core::repr::{
    EthernetAddress,
    Ipv4Address,
};
use crate::core::stack::NicId;

/// Maintains the IPv4 -> Ethernet address mappings learned on each NIC.
///
/// There is at most one mapping per (NIC, IPv4 address) pair and the most
/// recent one wins. Entries never expire.
#[derive(Debug, Default)]
pub struct LinkAddrCache {
    entries: HashMap<(NicId, Ipv4Address), EthernetAddress>,
}

impl LinkAddrCache {
    pub fn new() -> LinkAddrCache {
        LinkAddrCache {
            entries: HashMap::new(),
        }
    }

    /// Lookup the Ethernet address for an IPv4 address on a NIC.
    pub fn link_addr(&self, nic_id: NicId, addr: Ipv4Address) -> Option<EthernetAddress> {
        self.entries.get(&(nic_id, addr)).cloned()
    }

    /// Create or update the Ethernet address mapping for an IPv4 address.
    pub fn set_link_addr(&mut self, nic_id: NicId, addr: Ipv4Address, link_addr: EthernetAddress) {
        self.entries.insert((nic_id, addr), link_addr);
    }

    /// Drops every mapping learned on a NIC.
    pub fn remove_nic(&mut self, nic_id: NicId) {
        self.entries.retain(|&(id, _), _| id != nic_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
