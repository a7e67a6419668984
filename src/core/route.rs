use crate::core::repr::{
    EthernetAddress,
    Ipv4Address,
};
use crate::core::stack::NicId;

/// Describes both ends of an exchange over a NIC.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Route {
    /// Network protocol number (EtherType) carried over the route.
    pub net_proto: u16,
    pub nic_id: NicId,
    pub local_addr: Ipv4Address,
    pub remote_addr: Ipv4Address,
    /// Link address of the NIC the route goes out of.
    pub local_link_addr: EthernetAddress,
    /// Link address of the next hop, or broadcast.
    pub remote_link_addr: EthernetAddress,
}
