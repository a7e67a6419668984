use std::sync::{
    Arc,
    Weak,
};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Receiver;

use arpstack::core::link::{
    ChannelLink,
    ETHERNET_MTU,
};
use arpstack::core::net::resolver::{
    new_link_address_lookup,
    Resolver,
    ResolverConfig,
};
use arpstack::core::net::ProtocolRegistry;
use arpstack::core::repr::{
    EthernetAddress,
    Ipv4Address,
};
use arpstack::core::stack::{
    NicId,
    Stack,
};

lazy_static! {
    pub static ref HOST_IPV4: Ipv4Address = Ipv4Address::new([10, 0, 0, 102]);

    pub static ref HOST_ETH: EthernetAddress = EthernetAddress::new([0x06, 0x11, 0x22, 0x33, 0x44, 0x55]);

    pub static ref PEER_IPV4: Ipv4Address = Ipv4Address::new([10, 0, 0, 101]);

    pub static ref PEER_ETH: EthernetAddress = EthernetAddress::new([0x06, 0x66, 0x77, 0x88, 0x99, 0xAA]);
}

pub const NIC: NicId = 1;

/// Two stacks joined by a wire, each with a resolver on its only NIC.
pub struct Context {
    pub host: Arc<Stack>,
    pub host_resolver: Resolver,
    pub peer: Arc<Stack>,
    pub peer_resolver: Resolver,
}

#[allow(dead_code)]
pub fn context(timeout: Duration) -> Context {
    let (host_tx, peer_rx) = crossbeam_channel::unbounded();
    let (peer_tx, host_rx) = crossbeam_channel::unbounded();

    let host = Stack::new(ProtocolRegistry::with_defaults());
    host.create_nic(NIC, Arc::new(ChannelLink::new(*HOST_ETH, ETHERNET_MTU, host_tx)))
        .unwrap();
    host.add_address(NIC, *HOST_IPV4).unwrap();

    let peer = Stack::new(ProtocolRegistry::with_defaults());
    peer.create_nic(NIC, Arc::new(ChannelLink::new(*PEER_ETH, ETHERNET_MTU, peer_tx)))
        .unwrap();
    peer.add_address(NIC, *PEER_IPV4).unwrap();

    pump(host_rx, Arc::downgrade(&host));
    pump(peer_rx, Arc::downgrade(&peer));

    let config = ResolverConfig { timeout };

    Context {
        host_resolver: new_link_address_lookup(&host, NIC, *HOST_ETH, config.clone()),
        peer_resolver: new_link_address_lookup(&peer, NIC, *PEER_ETH, config),
        host,
        peer,
    }
}

/// Delivers frames coming off the wire to a stack until either goes away.
fn pump(rx: Receiver<Vec<u8>>, stack: Weak<Stack>) {
    thread::spawn(move || {
        for frame in rx.iter() {
            match stack.upgrade() {
                Some(stack) => {
                    let _ = stack.deliver_frame(NIC, &frame);
                }
                None => break,
            }
        }
    });
}
