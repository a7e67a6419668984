#[macro_use]
extern crate assert_matches;
extern crate arpstack;
extern crate crossbeam_channel;
#[macro_use]
extern crate lazy_static;

mod context;

use std::thread;
use std::time::{
    Duration,
    Instant,
};

use arpstack::core::repr::Ipv4Address;
use arpstack::Error;

use context::*;

#[test]
fn resolve_peer() {
    let context = context(Duration::from_secs(5));

    let eth_addr = context.host_resolver.resolve(*PEER_IPV4).unwrap();

    assert_eq!(eth_addr, *PEER_ETH);
    assert_eq!(context.host.link_addr(NIC, *PEER_IPV4), Some(*PEER_ETH));
    assert_eq!(context.host_resolver.pending(), 0);
}

#[test]
fn resolve_teaches_peer_our_address() {
    let context = context(Duration::from_secs(5));

    context.host_resolver.resolve(*PEER_IPV4).unwrap();

    // The peer learns from the request, maybe just after the reply went out.
    let since = Instant::now();
    while context.peer.link_addr(NIC, *HOST_IPV4).is_none() {
        assert!(since.elapsed() < Duration::from_secs(5));
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(context.peer_resolver.resolve(*HOST_IPV4).unwrap(), *HOST_ETH);
}

#[test]
fn resolve_unknown_address() {
    let context = context(Duration::from_millis(100));

    let since = Instant::now();
    assert_matches!(
        context.host_resolver.resolve(Ipv4Address::new([10, 0, 0, 5])),
        Err(Error::Timeout)
    );
    assert!(since.elapsed() >= Duration::from_millis(100));
    assert_eq!(context.host_resolver.pending(), 0);
}

#[test]
fn resolve_unknown_addresses_leaves_no_waiters() {
    let context = context(Duration::from_millis(20));

    for i in 1 .. 6 {
        assert_matches!(
            context.host_resolver.resolve(Ipv4Address::new([10, 0, 1, i])),
            Err(Error::Timeout)
        );
        assert_eq!(context.host_resolver.pending(), 0);
    }
}

#[test]
fn resolve_concurrently_different_addresses() {
    let context = context(Duration::from_secs(2));

    let unknown = {
        let lookup = context.host_resolver.lookup_fn();
        thread::spawn(move || lookup(Ipv4Address::new([10, 0, 0, 200])))
    };

    let since = Instant::now();
    let known = {
        let lookup = context.host_resolver.lookup_fn();
        thread::spawn(move || lookup(*PEER_IPV4))
    };

    assert_eq!(known.join().unwrap().unwrap(), *PEER_ETH);
    assert!(since.elapsed() < Duration::from_secs(2));
    assert_matches!(unknown.join().unwrap(), Err(Error::Timeout));
    assert_eq!(context.host_resolver.pending(), 0);
}

#[test]
fn resolve_concurrently_same_address() {
    let context = context(Duration::from_secs(5));

    let waiters: Vec<_> = (0 .. 8)
        .map(|_| {
            let lookup = context.host_resolver.lookup_fn();
            thread::spawn(move || lookup(*PEER_IPV4))
        })
        .collect();

    for waiter in waiters {
        assert_eq!(waiter.join().unwrap().unwrap(), *PEER_ETH);
    }
    assert_eq!(context.host_resolver.pending(), 0);
}
