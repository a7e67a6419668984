//! [ARP](https://tools.ietf.org/html/rfc826) endpoint, answering requests for
//! addresses owned by the stack.

use std::sync::{
    Arc,
    Weak,
};

use crate::core::link::LinkEndpoint;
use crate::core::net::{
    NetworkEndpoint,
    NetworkEndpointConfig,
    NetworkEndpointId,
    NetworkProtocol,
};
use crate::core::repr::{
    eth_types,
    ArpFrame,
    ArpOp,
    Ipv4Address,
    ARP_SIZE,
};
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

pub const PROTOCOL_NAME: &str = "arp";

pub const PROTOCOL_NUMBER: u16 = eth_types::ARP;

/// The ARP network protocol.
#[derive(Debug, Default)]
pub struct ArpProtocol;

impl ArpProtocol {
    pub fn new() -> ArpProtocol {
        ArpProtocol
    }
}

impl NetworkProtocol for ArpProtocol {
    fn number(&self) -> u16 {
        PROTOCOL_NUMBER
    }

    fn minimum_packet_size(&self) -> usize {
        ARP_SIZE
    }

    fn parse_addresses(&self, _: &[u8]) -> (Option<Ipv4Address>, Option<Ipv4Address>) {
        (None, None)
    }

    fn new_endpoint(&self, config: NetworkEndpointConfig) -> Result<Box<dyn NetworkEndpoint>> {
        Ok(Box::new(ArpEndpoint {
            nic_id: config.nic_id,
            link: config.link,
            handler: config.default_handler,
            stack: config.stack,
        }))
    }
}

/// ARP endpoint for a single NIC.
pub struct ArpEndpoint {
    nic_id: NicId,
    link: Arc<dyn LinkEndpoint>,
    handler: Option<ProtocolHandler>,
    stack: Weak<Stack>,
}

impl NetworkEndpoint for ArpEndpoint {
    fn mtu(&self) -> u32 {
        self.link.mtu().saturating_sub(self.max_header_len() as u32)
    }

    fn nic_id(&self) -> NicId {
        self.nic_id
    }

    fn id(&self) -> NetworkEndpointId {
        NetworkEndpointId::default()
    }

    fn max_header_len(&self) -> u16 {
        self.link.max_header_len() + ARP_SIZE as u16
    }

    /// ARP only resolves addresses and has nothing to carry for the layers
    /// above.
    fn write_packet(&self, _: &Route, _: Prependable, _: &[u8], _: u8) -> Result<()> {
        Err(Error::NotSupported)
    }

    fn handle_packet(&self, route: &Route, view: &[u8]) {
        let arp_frame = match ArpFrame::try_new(view) {
            Ok(arp_frame) => arp_frame,
            Err(_) => {
                debug!("Dropping malformed ARP frame of {} bytes.", view.len());
                return;
            }
        };

        let stack = match self.stack.upgrade() {
            Some(stack) => stack,
            None => return,
        };

        let target_proto_addr = arp_frame.target_proto_addr();
        if stack.check_local_address(None, target_proto_addr).is_none() {
            debug!(
                "Ignoring ARP with target IPv4 address {}.",
                target_proto_addr
            );
            return;
        }

        if arp_frame.op() == ArpOp::Request {
            let mut reply = view[.. ARP_SIZE].to_vec();
            if let Ok(mut reply_frame) = ArpFrame::try_new(&mut reply[..]) {
                reply_frame.make_reply(route.local_link_addr);
            }

            debug!(
                "Sending ARP reply to {}/{}.",
                arp_frame.sender_proto_addr(),
                arp_frame.sender_hw_addr()
            );

            let hdr = Prependable::new(self.link.max_header_len() as usize);
            if let Err(err) = self.link.write_packet(route, hdr, &reply, PROTOCOL_NUMBER) {
                warn!("LinkEndpoint::write_packet(...) failed with {:?}.", err);
            }
        }

        if let Some(ref handler) = self.handler {
            handler(route, view);
        }
    }
}
