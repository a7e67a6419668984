extern crate arpstack;
extern crate clap;
extern crate crossbeam_channel;
extern crate env_logger;
#[macro_use]
extern crate lazy_static;

use std::sync::{
    Arc,
    Weak,
};
use std::thread;
use std::time::{
    Duration,
    Instant,
};

use clap::{
    App,
    Arg,
};
use crossbeam_channel::Receiver;

use arpstack::core::link::{
    ChannelLink,
    ETHERNET_MTU,
};
use arpstack::core::net::resolver::{
    new_link_address_lookup,
    ResolverConfig,
};
use arpstack::core::net::ProtocolRegistry;
use arpstack::core::repr::{
    EthernetAddress,
    Ipv4Address,
};
use arpstack::core::stack::Stack;

lazy_static! {
    static ref HOST_IPV4: Ipv4Address = Ipv4Address::new([10, 0, 0, 102]);

    static ref HOST_ETH: EthernetAddress = EthernetAddress::new([0x06, 0x11, 0x22, 0x33, 0x44, 0x55]);

    static ref PEER_ETH: EthernetAddress = EthernetAddress::new([0x06, 0x66, 0x77, 0x88, 0x99, 0xAA]);
}

/// Resolves an IPv4 address between two stacks joined by an in-process wire.
fn main() {
    env_logger::init();

    let matches = App::new("resolve")
        .about("Resolves an IPv4 address to an Ethernet address over ARP")
        .arg(
            Arg::with_name("peer")
                .long("peer")
                .value_name("IPV4")
                .default_value("10.0.0.101")
                .help("Address owned by the other end of the wire"),
        )
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .value_name("MS")
                .default_value("15000")
                .help("How long to wait for a reply"),
        )
        .arg(
            Arg::with_name("ADDR")
                .required(true)
                .help("Address to resolve"),
        )
        .get_matches();

    let peer_ipv4 = match matches.value_of("peer").unwrap_or("").parse::<Ipv4Address>() {
        Ok(addr) => addr,
        Err(_) => exit("Bad --peer address."),
    };
    let addr = match matches.value_of("ADDR").unwrap_or("").parse::<Ipv4Address>() {
        Ok(addr) => addr,
        Err(_) => exit("Bad address to resolve."),
    };
    let timeout = match matches.value_of("timeout").unwrap_or("").parse::<u64>() {
        Ok(ms) => Duration::from_millis(ms),
        Err(_) => exit("Bad --timeout."),
    };

    let (host_tx, peer_rx) = crossbeam_channel::unbounded();
    let (peer_tx, host_rx) = crossbeam_channel::unbounded();

    let host = stack(*HOST_IPV4, ChannelLink::new(*HOST_ETH, ETHERNET_MTU, host_tx));
    let peer = stack(peer_ipv4, ChannelLink::new(*PEER_ETH, ETHERNET_MTU, peer_tx));
    pump(host_rx, Arc::downgrade(&host));
    pump(peer_rx, Arc::downgrade(&peer));

    let resolver = new_link_address_lookup(&host, 1, *HOST_ETH, ResolverConfig { timeout });

    let since = Instant::now();
    match resolver.resolve(addr) {
        Ok(eth_addr) => println!(
            "{} has MAC {} ({:?})!",
            addr,
            eth_addr,
            Instant::now().duration_since(since)
        ),
        Err(err) => exit(&format!("Resolving {} failed: {}.", addr, err)),
    }
}

fn stack(addr: Ipv4Address, link: ChannelLink) -> Arc<Stack> {
    let stack = Stack::new(ProtocolRegistry::with_defaults());
    if let Err(err) = stack.create_nic(1, Arc::new(link)) {
        exit(&format!("Creating NIC failed: {}.", err));
    }
    if let Err(err) = stack.add_address(1, addr) {
        exit(&format!("Adding {} failed: {}.", addr, err));
    }
    stack
}

fn pump(rx: Receiver<Vec<u8>>, stack: Weak<Stack>) {
    thread::spawn(move || {
        for frame in rx.iter() {
            match stack.upgrade() {
                Some(stack) => {
                    let _ = stack.deliver_frame(1, &frame);
                }
                None => break,
            }
        }
    });
}

fn exit(msg: &str) -> ! {
    eprintln!("{}", msg);
    std::process::exit(1);
}
