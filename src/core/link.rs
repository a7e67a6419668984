use crossbeam_channel::Sender;

use crate::core::repr::{
    EthernetAddress,
    EthernetFrame,
};
use crate::core::route::Route;
use crate::core::storage::Prependable;
use crate::{
    Error,
    Result,
};

/// Default [MTU](https://en.wikipedia.org/wiki/Maximum_transmission_unit) of
/// an Ethernet link.
pub const ETHERNET_MTU: u32 = 1500;

/// A low level interface for sending frames across a link.
///
/// Implementations are shared between the threads handling ingress and the
/// threads resolving addresses, so sending only needs a shared reference.
pub trait LinkEndpoint: Send + Sync {
    /// Returns the MTU of the link, excluding the link header.
    fn mtu(&self) -> u32;

    /// Returns the number of bytes the link prepends to every payload.
    fn max_header_len(&self) -> u16;

    /// Returns the hardware address associated with the link.
    fn link_addr(&self) -> EthernetAddress;

    /// Frames payload behind the headers in hdr and sends it across the link.
    ///
    /// hdr must have at least max_header_len() bytes available.
    fn write_packet(
        &self,
        route: &Route,
        hdr: Prependable,
        payload: &[u8],
        protocol: u16,
    ) -> Result<()>;
}

/// An Ethernet link whose frames are handed to a channel, standing in for a
/// wire between stacks in the same process.
pub struct ChannelLink {
    link_addr: EthernetAddress,
    mtu: u32,
    tx: Sender<Vec<u8>>,
}

impl ChannelLink {
    /// Creates a link which sends frames to tx.
    pub fn new(link_addr: EthernetAddress, mtu: u32, tx: Sender<Vec<u8>>) -> ChannelLink {
        ChannelLink { link_addr, mtu, tx }
    }
}

impl LinkEndpoint for ChannelLink {
    fn mtu(&self) -> u32 {
        self.mtu
    }

    fn max_header_len(&self) -> u16 {
        EthernetFrame::<&[u8]>::HEADER_LEN as u16
    }

    fn link_addr(&self) -> EthernetAddress {
        self.link_addr
    }

    fn write_packet(
        &self,
        route: &Route,
        mut hdr: Prependable,
        payload: &[u8],
        protocol: u16,
    ) -> Result<()> {
        if payload.len() > self.mtu as usize {
            return Err(Error::Exhausted);
        }

        {
            let eth_header = hdr.prepend(EthernetFrame::<&[u8]>::HEADER_LEN)?;
            let mut eth_frame = EthernetFrame::try_new(eth_header)?;
            eth_frame.set_dst_addr(route.remote_link_addr);
            eth_frame.set_src_addr(self.link_addr);
            eth_frame.set_payload_type(protocol);
        }

        let mut buffer = Vec::with_capacity(hdr.used_len() + payload.len());
        buffer.extend_from_slice(hdr.view());
        buffer.extend_from_slice(payload);

        trace!(
            "Sending {} byte frame to {} with type {:#06x}.",
            buffer.len(),
            route.remote_link_addr,
            protocol
        );

        self.tx.send(buffer).map_err(|_| Error::Link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::repr::{
        eth_types,
        Ipv4Address,
    };

    fn route() -> Route {
        Route {
            net_proto: eth_types::ARP,
            nic_id: 1,
            local_addr: Ipv4Address::new([10, 0, 0, 1]),
            remote_addr: Ipv4Address::new([10, 0, 0, 2]),
            local_link_addr: EthernetAddress::new([0x02, 0, 0, 0, 0, 1]),
            remote_link_addr: EthernetAddress::new([0x02, 0, 0, 0, 0, 2]),
        }
    }

    #[test]
    fn test_write_packet_frames_payload() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let link = ChannelLink::new(EthernetAddress::new([0x02, 0, 0, 0, 0, 1]), ETHERNET_MTU, tx);

        let hdr = Prependable::new(link.max_header_len() as usize);
        link.write_packet(&route(), hdr, &[1, 2, 3], eth_types::ARP)
            .unwrap();

        let buffer = rx.try_recv().unwrap();
        let eth_frame = EthernetFrame::try_new(&buffer[..]).unwrap();
        assert_eq!(eth_frame.dst_addr(), route().remote_link_addr);
        assert_eq!(eth_frame.src_addr(), link.link_addr());
        assert_eq!(eth_frame.payload_type(), eth_types::ARP);
        assert_eq!(eth_frame.payload(), &[1, 2, 3]);
    }

    #[test]
    fn test_write_packet_without_header_space() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let link = ChannelLink::new(EthernetAddress::new([0x02, 0, 0, 0, 0, 1]), ETHERNET_MTU, tx);
        assert_matches!(
            link.write_packet(&route(), Prependable::new(4), &[1], eth_types::ARP),
            Err(Error::Exhausted)
        );
    }

    #[test]
    fn test_write_packet_disconnected() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let link = ChannelLink::new(EthernetAddress::new([0x02, 0, 0, 0, 0, 1]), ETHERNET_MTU, tx);
        let hdr = Prependable::new(link.max_header_len() as usize);
        assert_matches!(
            link.write_packet(&route(), hdr, &[1], eth_types::ARP),
            Err(Error::Link)
        );
    }
}
