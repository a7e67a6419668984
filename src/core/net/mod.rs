//! Network layer protocols and the endpoints they create on each NIC.

pub mod arp;
pub mod resolver;

use std::collections::HashMap;
use std::sync::{
    Arc,
    Weak,
};

use crate::core::link::LinkEndpoint;
use crate::core::repr::Ipv4Address;
use crate::core::route::Route;
use crate::core::stack::{
    NicId,
    ProtocolHandler,
    Stack,
};
use crate::core::storage::Prependable;
use crate::{
    Error,
    Result,
};

/// Identifies a network endpoint by its local address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NetworkEndpointId {
    pub local_addr: Option<Ipv4Address>,
}

/// Everything a protocol needs to create an endpoint on a NIC.
#[derive(Clone)]
pub struct NetworkEndpointConfig {
    pub nic_id: NicId,
    /// Link the endpoint sends through.
    pub link: Arc<dyn LinkEndpoint>,
    /// Handler invoked with every frame the endpoint accepts, in addition to
    /// the endpoint's own processing.
    pub default_handler: Option<ProtocolHandler>,
    pub stack: Weak<Stack>,
}

/// Per NIC instance of a network protocol.
pub trait NetworkEndpoint: Send + Sync {
    /// Returns the link MTU minus this endpoint's header length.
    fn mtu(&self) -> u32;

    fn nic_id(&self) -> NicId;

    fn id(&self) -> NetworkEndpointId;

    /// Returns the link header length plus this endpoint's header length.
    fn max_header_len(&self) -> u16;

    /// Sends a transport payload behind this endpoint's headers.
    fn write_packet(
        &self,
        route: &Route,
        hdr: Prependable,
        payload: &[u8],
        protocol: u8,
    ) -> Result<()>;

    /// Processes an inbound frame. Protocols have no one to report errors to
    /// here, so bad frames are dropped.
    fn handle_packet(&self, route: &Route, view: &[u8]);
}

/// A network protocol, e.g. ARP.
pub trait NetworkProtocol: Send + Sync {
    /// Returns the protocol number (EtherType).
    fn number(&self) -> u16;

    /// Returns the smallest valid frame for the protocol.
    fn minimum_packet_size(&self) -> usize;

    /// Returns the source and destination addresses carried by a frame, if the
    /// protocol has any.
    fn parse_addresses(&self, view: &[u8]) -> (Option<Ipv4Address>, Option<Ipv4Address>);

    fn new_endpoint(&self, config: NetworkEndpointConfig) -> Result<Box<dyn NetworkEndpoint>>;
}

/// Set of network protocols a stack is built with.
#[derive(Clone, Default)]
pub struct ProtocolRegistry {
    protocols: HashMap<String, Arc<dyn NetworkProtocol>>,
}

impl ProtocolRegistry {
    /// Creates an empty registry.
    pub fn new() -> ProtocolRegistry {
        ProtocolRegistry {
            protocols: HashMap::new(),
        }
    }

    /// Creates a registry with every protocol this crate implements.
    pub fn with_defaults() -> ProtocolRegistry {
        let mut registry = ProtocolRegistry::new();
        registry.protocols.insert(
            arp::PROTOCOL_NAME.to_string(),
            Arc::new(arp::ArpProtocol::new()),
        );
        registry
    }

    /// Registers a protocol under a name. Names and protocol numbers must be
    /// unique.
    pub fn register(&mut self, name: &str, protocol: Arc<dyn NetworkProtocol>) -> Result<()> {
        if self.protocols.contains_key(name) || self.by_number(protocol.number()).is_some() {
            return Err(Error::Duplicate);
        }

        debug!(
            "Registering network protocol {} ({:#06x}).",
            name,
            protocol.number()
        );
        self.protocols.insert(name.to_string(), protocol);
        Ok(())
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<dyn NetworkProtocol>> {
        self.protocols.get(name).cloned()
    }

    pub fn by_number(&self, number: u16) -> Option<Arc<dyn NetworkProtocol>> {
        self.protocols
            .values()
            .find(|protocol| protocol.number() == number)
            .cloned()
    }

    /// Returns an iterator over all of the registered protocols.
    pub fn iter<'a>(&'a self) -> impl Iterator<Item = &'a Arc<dyn NetworkProtocol>> + 'a {
        self.protocols.values()
    }

    pub fn len(&self) -> usize {
        self.protocols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.protocols.is_empty()
    }
}
