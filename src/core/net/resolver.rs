//! Link address resolution over ARP.
//!
//! A resolver installs the stack's ARP protocol handler, which learns the
//! sender mapping of every ARP frame the stack accepts and wakes callers
//! waiting on the sender's address when the frame is a reply. Callers block in
//! `resolve(...)` until a reply shows up or the configured timeout elapses.
//!
//! Waking is best effort. Every waiter owns a single slot channel which the
//! handler fills without blocking and at most once; a waiter that already gave
//! up is skipped.

use std::collections::HashMap;
use std::sync::{
    Arc,
    Mutex,
    Weak,
};
use std::time::Duration;

use crossbeam_channel::{
    Receiver,
    RecvTimeoutError,
    Sender,
};

use crate::core::net::arp::PROTOCOL_NUMBER;
use crate::core::repr::{
    Arp,
    ArpFrame,
    ArpOp,
    EthernetAddress,
    Ipv4Address,
};
use crate::core::route::Route;
use crate::core::stack::{
    NicId,
    Stack,
};
use crate::core::storage::Prependable;
use crate::core::sync::lock;
use crate::{
    Error,
    Result,
};

/// Default time a resolve waits for an ARP reply.
pub const DEFAULT_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(15);

/// Link address resolution as a function value.
pub type LinkAddressLookupFn = Arc<dyn Fn(Ipv4Address) -> Result<EthernetAddress> + Send + Sync>;

#[derive(Clone, Debug)]
pub struct ResolverConfig {
    /// How long a resolve waits for an ARP reply before giving up.
    pub timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> ResolverConfig {
        ResolverConfig {
            timeout: DEFAULT_RESOLUTION_TIMEOUT,
        }
    }
}

struct Waiter {
    addr: Ipv4Address,
    tx: Sender<EthernetAddress>,
}

/// Callers waiting on a reply, keyed by a per waiter id so several callers can
/// wait on the same address. A stack has one set shared by all its resolvers.
#[derive(Default)]
pub(crate) struct Waiters {
    next_id: u64,
    pending: HashMap<u64, Waiter>,
}

impl Waiters {
    fn register(&mut self, addr: Ipv4Address, tx: Sender<EthernetAddress>) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.pending.insert(id, Waiter { addr, tx });
        id
    }

    fn cancel(&mut self, id: u64) {
        self.pending.remove(&id);
    }

    /// Hands link_addr to every waiter on addr and forgets them.
    fn notify(&mut self, addr: Ipv4Address, link_addr: EthernetAddress) {
        self.pending.retain(|_, waiter| {
            if waiter.addr != addr {
                return true;
            }

            // A full or disconnected slot means the waiter is already done.
            let _ = waiter.tx.try_send(link_addr);
            false
        });
    }
}

/// Resolves IPv4 addresses to Ethernet addresses on a NIC.
///
/// Clones share the same waiters and can resolve from different threads.
#[derive(Clone)]
pub struct Resolver {
    stack: Arc<Stack>,
    nic_id: NicId,
    local_link_addr: EthernetAddress,
    config: ResolverConfig,
    waiters: Arc<Mutex<Waiters>>,
}

/// Creates a resolver for a NIC.
///
/// The first resolver on a stack installs the stack's ARP handler. Later
/// resolvers, e.g. for other NICs, share its waiters and handler.
pub fn new_link_address_lookup(
    stack: &Arc<Stack>,
    nic_id: NicId,
    local_link_addr: EthernetAddress,
    config: ResolverConfig,
) -> Resolver {
    let waiters = stack.link_addr_waiters(|waiters| {
        let handler_stack = Arc::downgrade(stack);
        let handler_waiters = waiters.clone();
        stack.set_network_protocol_handler(
            PROTOCOL_NUMBER,
            Arc::new(move |route: &Route, view: &[u8]| {
                handle_frame(&handler_stack, &handler_waiters, route, view)
            }),
        );
    });

    Resolver {
        stack: stack.clone(),
        nic_id,
        local_link_addr,
        config,
        waiters,
    }
}

/// Learns the sender mapping of an ARP frame and wakes waiters on replies.
/// Never consumes the frame.
fn handle_frame(stack: &Weak<Stack>, waiters: &Mutex<Waiters>, route: &Route, view: &[u8]) -> bool {
    let stack = match stack.upgrade() {
        Some(stack) => stack,
        None => return false,
    };

    let arp_frame = match ArpFrame::try_new(view) {
        Ok(arp_frame) => arp_frame,
        Err(_) => return false,
    };

    let nic_id = stack
        .check_local_address(None, arp_frame.target_proto_addr())
        .unwrap_or(route.nic_id);
    let addr = arp_frame.sender_proto_addr();
    let link_addr = arp_frame.sender_hw_addr();

    debug!("Adding mapping from {} to {} on NIC {}.", addr, link_addr, nic_id);
    stack.add_link_addr_cache(nic_id, addr, link_addr);

    if arp_frame.op() != ArpOp::Reply {
        return false;
    }

    lock(waiters).notify(addr, link_addr);
    false
}

impl Resolver {
    /// Returns the Ethernet address for an IPv4 address.
    ///
    /// Known mappings are returned right away. Otherwise an ARP request is
    /// broadcast and the caller blocks until a reply from addr arrives, or
    /// fails with Error::Timeout once the configured timeout elapses.
    pub fn resolve(&self, addr: Ipv4Address) -> Result<EthernetAddress> {
        if let Some(link_addr) = self.stack.link_addr(self.nic_id, addr) {
            return Ok(link_addr);
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let id = lock(&self.waiters).register(addr, tx);

        if let Err(err) = self.send_request(addr) {
            lock(&self.waiters).cancel(id);
            return Err(err);
        }

        match rx.recv_timeout(self.config.timeout) {
            Ok(link_addr) => Ok(link_addr),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                self.give_up(id, &rx, addr)
            }
        }
    }

    /// Forgets a waiter whose wait ran out. A reply handed over before the
    /// waiter was forgotten still wins.
    fn give_up(&self, id: u64, rx: &Receiver<EthernetAddress>, addr: Ipv4Address) -> Result<EthernetAddress> {
        lock(&self.waiters).cancel(id);
        match rx.try_recv() {
            Ok(link_addr) => Ok(link_addr),
            Err(_) => {
                debug!("Timed out resolving {}.", addr);
                Err(Error::Timeout)
            }
        }
    }

    /// Returns resolve(...) as a function value.
    pub fn lookup_fn(&self) -> LinkAddressLookupFn {
        let resolver = self.clone();
        Arc::new(move |addr: Ipv4Address| resolver.resolve(addr))
    }

    /// Returns the number of callers waiting on a reply.
    pub fn pending(&self) -> usize {
        lock(&self.waiters).pending.len()
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Broadcasts an ARP request for addr from the NIC's primary address.
    fn send_request(&self, addr: Ipv4Address) -> Result<()> {
        let link = self.stack.link_endpoint(self.nic_id).ok_or(Error::Address)?;
        let local_addr = self.stack
            .primary_address(self.nic_id)
            .ok_or(Error::Address)?;

        let arp = Arp {
            op: ArpOp::Request,
            source_hw_addr: self.local_link_addr,
            source_proto_addr: local_addr,
            target_hw_addr: EthernetAddress::UNSPECIFIED,
            target_proto_addr: addr,
        };
        let mut buffer = vec![0; arp.buffer_len()];
        arp.serialize(&mut buffer)?;

        let route = Route {
            net_proto: PROTOCOL_NUMBER,
            nic_id: self.nic_id,
            local_addr,
            remote_addr: addr,
            local_link_addr: self.local_link_addr,
            remote_link_addr: EthernetAddress::BROADCAST,
        };

        debug!("Sending ARP request for {}.", addr);
        let hdr = Prependable::new(link.max_header_len() as usize);
        link.write_packet(&route, hdr, &buffer, PROTOCOL_NUMBER)
    }
}
