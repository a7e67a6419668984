//! NIC and address registry shared by every protocol in a stack.

use std::collections::{
    BTreeMap,
    HashMap,
};
use std::sync::{
    Arc,
    Mutex,
    RwLock,
};

use crate::core::link::LinkEndpoint;
use crate::core::link_cache::LinkAddrCache;
use crate::core::net::{
    NetworkEndpoint,
    NetworkEndpointConfig,
    ProtocolRegistry,
};
use crate::core::net::resolver::Waiters;
use crate::core::repr::{
    EthernetAddress,
    EthernetFrame,
    Ipv4Address,
};
use crate::core::route::Route;
use crate::core::sync::{
    lock,
    read,
    write,
};
use crate::{
    Error,
    Result,
};

/// Identifies a NIC within a stack.
pub type NicId = u32;

/// Handler for inbound frames of a network protocol. Returns true if the frame
/// was consumed.
pub type ProtocolHandler = Arc<dyn Fn(&Route, &[u8]) -> bool + Send + Sync>;

struct Nic {
    link: Arc<dyn LinkEndpoint>,
    addrs: Vec<Ipv4Address>,
    endpoints: HashMap<u16, Arc<dyn NetworkEndpoint>>,
}

/// A network stack: NICs, their addresses, learned link addresses and the
/// protocols running on top.
pub struct Stack {
    protocols: ProtocolRegistry,
    nics: RwLock<BTreeMap<NicId, Nic>>,
    link_addr_cache: Mutex<LinkAddrCache>,
    handlers: RwLock<HashMap<u16, ProtocolHandler>>,
    link_addr_waiters: Mutex<Option<Arc<Mutex<Waiters>>>>,
}

impl Stack {
    /// Creates a stack running the protocols in the registry.
    pub fn new(protocols: ProtocolRegistry) -> Arc<Stack> {
        Arc::new(Stack {
            protocols,
            nics: RwLock::new(BTreeMap::new()),
            link_addr_cache: Mutex::new(LinkAddrCache::new()),
            handlers: RwLock::new(HashMap::new()),
            link_addr_waiters: Mutex::new(None),
        })
    }

    pub fn protocols(&self) -> &ProtocolRegistry {
        &self.protocols
    }

    /// Adds a NIC backed by a link and creates an endpoint on it for every
    /// registered protocol.
    pub fn create_nic(self: &Arc<Self>, nic_id: NicId, link: Arc<dyn LinkEndpoint>) -> Result<()> {
        if read(&self.nics).contains_key(&nic_id) {
            return Err(Error::Duplicate);
        }

        let mut endpoints: HashMap<u16, Arc<dyn NetworkEndpoint>> = HashMap::new();
        for protocol in self.protocols.iter() {
            let config = NetworkEndpointConfig {
                nic_id,
                link: link.clone(),
                default_handler: Some(self.default_handler(protocol.number())),
                stack: Arc::downgrade(self),
            };
            let endpoint = protocol.new_endpoint(config)?;
            endpoints.insert(protocol.number(), Arc::from(endpoint));
        }

        let mut nics = write(&self.nics);
        if nics.contains_key(&nic_id) {
            return Err(Error::Duplicate);
        }

        debug!("Created NIC {} with link address {}.", nic_id, link.link_addr());
        nics.insert(
            nic_id,
            Nic {
                link,
                addrs: vec![],
                endpoints,
            },
        );
        Ok(())
    }

    /// Removes a NIC along with the link addresses learned on it.
    pub fn remove_nic(&self, nic_id: NicId) -> Result<()> {
        if write(&self.nics).remove(&nic_id).is_none() {
            return Err(Error::Address);
        }

        lock(&self.link_addr_cache).remove_nic(nic_id);
        Ok(())
    }

    /// Assigns an address to a NIC. The first address becomes the primary.
    pub fn add_address(&self, nic_id: NicId, addr: Ipv4Address) -> Result<()> {
        let mut nics = write(&self.nics);
        let nic = nics.get_mut(&nic_id).ok_or(Error::Address)?;
        if !nic.addrs.contains(&addr) {
            nic.addrs.push(addr);
        }
        Ok(())
    }

    /// Returns the first address assigned to a NIC.
    pub fn primary_address(&self, nic_id: NicId) -> Option<Ipv4Address> {
        read(&self.nics)
            .get(&nic_id)
            .and_then(|nic| nic.addrs.first().cloned())
    }

    pub fn link_endpoint(&self, nic_id: NicId) -> Option<Arc<dyn LinkEndpoint>> {
        read(&self.nics).get(&nic_id).map(|nic| nic.link.clone())
    }

    pub fn network_endpoint(&self, nic_id: NicId, number: u16) -> Option<Arc<dyn NetworkEndpoint>> {
        read(&self.nics)
            .get(&nic_id)
            .and_then(|nic| nic.endpoints.get(&number).cloned())
    }

    /// Returns the NIC owning addr. With a hint only that NIC is checked,
    /// otherwise the lowest numbered NIC owning the address wins.
    pub fn check_local_address(&self, nic_hint: Option<NicId>, addr: Ipv4Address) -> Option<NicId> {
        let nics = read(&self.nics);
        match nic_hint {
            Some(nic_id) => nics.get(&nic_id)
                .filter(|nic| nic.addrs.contains(&addr))
                .map(|_| nic_id),
            None => nics.iter()
                .find(|&(_, nic)| nic.addrs.contains(&addr))
                .map(|(nic_id, _)| *nic_id),
        }
    }

    /// Create or update the link address for a protocol address on a NIC.
    pub fn add_link_addr_cache(&self, nic_id: NicId, addr: Ipv4Address, link_addr: EthernetAddress) {
        lock(&self.link_addr_cache).set_link_addr(nic_id, addr, link_addr);
    }

    /// Lookup the link address for a protocol address on a NIC.
    pub fn link_addr(&self, nic_id: NicId, addr: Ipv4Address) -> Option<EthernetAddress> {
        lock(&self.link_addr_cache).link_addr(nic_id, addr)
    }

    /// Returns the number of learned link addresses across all NICs.
    pub fn link_addr_cache_len(&self) -> usize {
        lock(&self.link_addr_cache).len()
    }

    /// Installs the handler for a network protocol, replacing any previous one.
    pub fn set_network_protocol_handler(&self, number: u16, handler: ProtocolHandler) {
        write(&self.handlers).insert(number, handler);
    }

    /// Runs the handler installed for a network protocol, if any.
    pub fn handle_with_protocol_handler(&self, number: u16, route: &Route, view: &[u8]) -> bool {
        let handler = read(&self.handlers).get(&number).cloned();
        match handler {
            Some(handler) => handler(route, view),
            None => false,
        }
    }

    /// Returns the callers waiting on link address resolution. The first call
    /// creates them and runs init, later calls share them.
    pub(crate) fn link_addr_waiters<F>(&self, init: F) -> Arc<Mutex<Waiters>>
    where
        F: FnOnce(&Arc<Mutex<Waiters>>),
    {
        let mut slot = lock(&self.link_addr_waiters);
        if let Some(ref waiters) = *slot {
            return waiters.clone();
        }

        let waiters = Arc::new(Mutex::new(Waiters::default()));
        init(&waiters);
        *slot = Some(waiters.clone());
        waiters
    }

    /// Receives an Ethernet frame from a NIC's link and hands its payload to
    /// the endpoint for the payload type.
    pub fn deliver_frame(&self, nic_id: NicId, eth_buffer: &[u8]) -> Result<()> {
        let eth_frame = EthernetFrame::try_new(eth_buffer)?;

        let (link, endpoint, local_addr) = {
            let nics = read(&self.nics);
            let nic = nics.get(&nic_id).ok_or(Error::Address)?;
            let endpoint = nic.endpoints.get(&eth_frame.payload_type()).cloned();
            (nic.link.clone(), endpoint, nic.addrs.first().cloned())
        };

        if eth_frame.dst_addr() != link.link_addr() && !eth_frame.dst_addr().is_broadcast() {
            debug!(
                "Ignoring Ethernet frame with destination {}.",
                eth_frame.dst_addr()
            );
            return Err(Error::Ignored);
        }

        let endpoint = match endpoint {
            Some(endpoint) => endpoint,
            None => {
                debug!(
                    "Ignoring Ethernet frame with type {:#06x}.",
                    eth_frame.payload_type()
                );
                return Err(Error::Ignored);
            }
        };

        let (src, dst) = match self.protocols.by_number(eth_frame.payload_type()) {
            Some(protocol) => protocol.parse_addresses(eth_frame.payload()),
            None => (None, None),
        };

        let route = Route {
            net_proto: eth_frame.payload_type(),
            nic_id,
            local_addr: dst.or(local_addr).unwrap_or(Ipv4Address::UNSPECIFIED),
            remote_addr: src.unwrap_or(Ipv4Address::UNSPECIFIED),
            local_link_addr: link.link_addr(),
            remote_link_addr: eth_frame.src_addr(),
        };

        endpoint.handle_packet(&route, eth_frame.payload());
        Ok(())
    }

    /// Returns a handler which forwards to whatever handler is installed for
    /// the protocol at the time a frame arrives.
    fn default_handler(self: &Arc<Self>, number: u16) -> ProtocolHandler {
        let stack = Arc::downgrade(self);
        Arc::new(move |route: &Route, view: &[u8]| match stack.upgrade() {
            Some(stack) => stack.handle_with_protocol_handler(number, route, view),
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::link::{
        ChannelLink,
        ETHERNET_MTU,
    };
    use crate::core::repr::eth_types;
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    fn eth(i: u8) -> EthernetAddress {
        EthernetAddress::new([0x02, 0, 0, 0, 0, i])
    }

    fn ipv4(i: u8) -> Ipv4Address {
        Ipv4Address::new([10, 0, 0, i])
    }

    fn stack() -> Arc<Stack> {
        let (tx, _) = crossbeam_channel::unbounded();
        let stack = Stack::new(ProtocolRegistry::with_defaults());
        stack
            .create_nic(1, Arc::new(ChannelLink::new(eth(1), ETHERNET_MTU, tx.clone())))
            .unwrap();
        stack
            .create_nic(2, Arc::new(ChannelLink::new(eth(2), ETHERNET_MTU, tx)))
            .unwrap();
        stack.add_address(1, ipv4(1)).unwrap();
        stack.add_address(2, ipv4(2)).unwrap();
        stack
    }

    #[test]
    fn test_create_duplicate_nic() {
        let (tx, _) = crossbeam_channel::unbounded();
        let stack = stack();
        assert_matches!(
            stack.create_nic(1, Arc::new(ChannelLink::new(eth(3), ETHERNET_MTU, tx))),
            Err(Error::Duplicate)
        );
    }

    #[test]
    fn test_create_nic_creates_endpoints() {
        let stack = stack();
        let endpoint = stack.network_endpoint(1, eth_types::ARP).unwrap();
        assert_eq!(endpoint.nic_id(), 1);
        assert!(stack.network_endpoint(1, eth_types::IPV4).is_none());
    }

    #[test]
    fn test_add_address_to_unknown_nic() {
        assert_matches!(stack().add_address(9, ipv4(9)), Err(Error::Address));
    }

    #[test]
    fn test_check_local_address() {
        let stack = stack();
        assert_eq!(stack.check_local_address(None, ipv4(1)), Some(1));
        assert_eq!(stack.check_local_address(None, ipv4(2)), Some(2));
        assert_eq!(stack.check_local_address(Some(1), ipv4(1)), Some(1));
        assert_matches!(stack.check_local_address(Some(2), ipv4(1)), None);
        assert_matches!(stack.check_local_address(None, ipv4(3)), None);
    }

    #[test]
    fn test_primary_address() {
        let stack = stack();
        stack.add_address(1, ipv4(5)).unwrap();
        assert_eq!(stack.primary_address(1), Some(ipv4(1)));
        assert_eq!(stack.check_local_address(None, ipv4(5)), Some(1));
    }

    #[test]
    fn test_link_addr_cache() {
        let stack = stack();
        stack.add_link_addr_cache(1, ipv4(7), eth(7));
        stack.add_link_addr_cache(1, ipv4(7), eth(8));
        assert_eq!(stack.link_addr(1, ipv4(7)), Some(eth(8)));
        assert_matches!(stack.link_addr(2, ipv4(7)), None);
        assert_eq!(stack.link_addr_cache_len(), 1);

        stack.remove_nic(1).unwrap();
        assert_matches!(stack.link_addr(1, ipv4(7)), None);
        assert_matches!(stack.remove_nic(1), Err(Error::Address));
    }

    #[test]
    fn test_protocol_handler_is_replaced() {
        let stack = stack();
        let calls = Arc::new(AtomicUsize::new(0));
        let route = Route {
            net_proto: eth_types::ARP,
            nic_id: 1,
            local_addr: ipv4(1),
            remote_addr: ipv4(2),
            local_link_addr: eth(1),
            remote_link_addr: eth(2),
        };

        assert!(!stack.handle_with_protocol_handler(eth_types::ARP, &route, &[]));

        stack.set_network_protocol_handler(eth_types::ARP, Arc::new(|_: &Route, _: &[u8]| false));
        let _calls = calls.clone();
        stack.set_network_protocol_handler(
            eth_types::ARP,
            Arc::new(move |_: &Route, _: &[u8]| {
                _calls.fetch_add(1, Ordering::SeqCst);
                true
            }),
        );

        assert!(stack.handle_with_protocol_handler(eth_types::ARP, &route, &[]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_link_addr_waiters_created_once() {
        let stack = stack();
        let inits = AtomicUsize::new(0);

        let first = stack.link_addr_waiters(|_| {
            inits.fetch_add(1, Ordering::SeqCst);
        });
        let second = stack.link_addr_waiters(|_| {
            inits.fetch_add(1, Ordering::SeqCst);
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_deliver_malformed_frame() {
        assert_matches!(stack().deliver_frame(1, &[0; 6]), Err(Error::Malformed));
    }

    #[test]
    fn test_deliver_frame_for_someone_else() {
        let mut buffer = vec![0; EthernetFrame::<&[u8]>::buffer_len(28)];
        {
            let mut eth_frame = EthernetFrame::try_new(&mut buffer[..]).unwrap();
            eth_frame.set_dst_addr(eth(9));
            eth_frame.set_payload_type(eth_types::ARP);
        }
        assert_matches!(stack().deliver_frame(1, &buffer), Err(Error::Ignored));
    }

    #[test]
    fn test_deliver_frame_with_unknown_type() {
        let mut buffer = vec![0; EthernetFrame::<&[u8]>::buffer_len(20)];
        {
            let mut eth_frame = EthernetFrame::try_new(&mut buffer[..]).unwrap();
            eth_frame.set_dst_addr(EthernetAddress::BROADCAST);
            eth_frame.set_payload_type(eth_types::IPV4);
        }
        assert_matches!(stack().deliver_frame(1, &buffer), Err(Error::Ignored));
    }
}
