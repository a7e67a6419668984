//! Serialization and deserialization of frames.
//!
//! The `repr` module provides views over byte buffers for the link and
//! resolution layers, plus the address types shared across the stack.

pub mod arp;
pub mod ethernet;
pub mod ipv4;

pub use self::arp::{
    hw_types as arp_hw_types,
    proto_types as arp_proto_types,
    Arp,
    Frame as ArpFrame,
    Op as ArpOp,
    ARP_SIZE,
};
pub use self::ethernet::{
    eth_types,
    Address as EthernetAddress,
    Frame as EthernetFrame,
};
pub use self::ipv4::Address as Ipv4Address;
