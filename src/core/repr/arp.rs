use std::io::{
    Cursor,
    Write,
};
use std::ops::Range;

use byteorder::{
    NetworkEndian,
    ReadBytesExt,
    WriteBytesExt,
};

use crate::core::repr::{
    EthernetAddress,
    Ipv4Address,
};
use crate::{
    Error,
    Result,
};

/// Size of an Ethernet/IPv4 ARP frame.
pub const ARP_SIZE: usize = 28;

/// Offset of the sender hardware address, after the fixed header.
const ADDRS_OFFSET: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
// https://www.iana.org/assignments/arp-parameters/arp-parameters.xhtml#arp-parameters-1
pub enum Op {
    Request,
    Reply,
    Unknown(u16),
}

impl From<u16> for Op {
    fn from(op: u16) -> Op {
        match op {
            0x0001 => Op::Request,
            0x0002 => Op::Reply,
            op => Op::Unknown(op),
        }
    }
}

impl From<Op> for u16 {
    fn from(op: Op) -> u16 {
        match op {
            Op::Request => 0x0001,
            Op::Reply => 0x0002,
            Op::Unknown(op) => op,
        }
    }
}

/// https://www.iana.org/assignments/arp-parameters/arp-parameters.xhtml#arp-parameters-2
pub mod hw_types {
    pub const ETHERNET: u16 = 0x0001;
}

/// https://www.iana.org/assignments/arp-parameters/arp-parameters.xhtml#arp-parameters-3
pub mod proto_types {
    pub const IPV4: u16 = 0x0800;
}

/// View of a byte buffer as an ARP frame.
///
/// Address fields are located using the hardware and protocol address sizes
/// carried in the header. Only Ethernet/IPv4 frames pass validation.
#[derive(Debug)]
pub struct Frame<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> AsRef<[u8]> for Frame<T> {
    fn as_ref(&self) -> &[u8] {
        self.buffer.as_ref()
    }
}

impl<T: AsRef<[u8]>> Frame<T> {
    /// Tries to create an ARP frame view over a byte buffer, failing if the
    /// buffer is structurally invalid.
    pub fn try_new(buffer: T) -> Result<Frame<T>> {
        let frame = Frame { buffer };
        if frame.is_valid() {
            Ok(frame)
        } else {
            Err(Error::Malformed)
        }
    }

    /// Checks the size and the fixed header fields of the frame.
    pub fn is_valid(&self) -> bool {
        let buffer = self.buffer.as_ref();
        if buffer.len() < ARP_SIZE {
            return false;
        }

        self.hw_type() == hw_types::ETHERNET && self.proto_type() == proto_types::IPV4
            && self.hw_len() == 6 && self.proto_len() == 4
    }

    pub fn hw_type(&self) -> u16 {
        read_u16(&self.buffer.as_ref()[0 .. 2])
    }

    pub fn proto_type(&self) -> u16 {
        read_u16(&self.buffer.as_ref()[2 .. 4])
    }

    pub fn hw_len(&self) -> u8 {
        self.buffer.as_ref()[4]
    }

    pub fn proto_len(&self) -> u8 {
        self.buffer.as_ref()[5]
    }

    pub fn op(&self) -> Op {
        Op::from(read_u16(&self.buffer.as_ref()[6 .. 8]))
    }

    pub fn sender_hw_bytes(&self) -> &[u8] {
        &self.buffer.as_ref()[self.sender_hw_range()]
    }

    pub fn sender_proto_bytes(&self) -> &[u8] {
        &self.buffer.as_ref()[self.sender_proto_range()]
    }

    pub fn target_hw_bytes(&self) -> &[u8] {
        &self.buffer.as_ref()[self.target_hw_range()]
    }

    pub fn target_proto_bytes(&self) -> &[u8] {
        &self.buffer.as_ref()[self.target_proto_range()]
    }

    pub fn sender_hw_addr(&self) -> EthernetAddress {
        EthernetAddress::try_new(self.sender_hw_bytes()).unwrap_or_default()
    }

    pub fn sender_proto_addr(&self) -> Ipv4Address {
        Ipv4Address::try_new(self.sender_proto_bytes()).unwrap_or_default()
    }

    pub fn target_hw_addr(&self) -> EthernetAddress {
        EthernetAddress::try_new(self.target_hw_bytes()).unwrap_or_default()
    }

    pub fn target_proto_addr(&self) -> Ipv4Address {
        Ipv4Address::try_new(self.target_proto_bytes()).unwrap_or_default()
    }

    fn sender_hw_range(&self) -> Range<usize> {
        ADDRS_OFFSET .. ADDRS_OFFSET + self.hw_len() as usize
    }

    fn sender_proto_range(&self) -> Range<usize> {
        let start = self.sender_hw_range().end;
        start .. start + self.proto_len() as usize
    }

    fn target_hw_range(&self) -> Range<usize> {
        let start = self.sender_proto_range().end;
        start .. start + self.hw_len() as usize
    }

    fn target_proto_range(&self) -> Range<usize> {
        let start = self.target_hw_range().end;
        start .. start + self.proto_len() as usize
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Frame<T> {
    pub fn set_op(&mut self, op: Op) {
        let _ = (&mut self.buffer.as_mut()[6 .. 8]).write_u16::<NetworkEndian>(op.into());
    }

    /// Rewrites a request in place into the reply a host owning the target
    /// protocol address sends back.
    ///
    /// Sender and target addresses trade places, then the sender hardware
    /// address is claimed by hw_addr.
    pub fn make_reply(&mut self, hw_addr: EthernetAddress) {
        let (sender_hw, target_hw) = (self.sender_hw_range(), self.target_hw_range());
        let (sender_proto, target_proto) = (self.sender_proto_range(), self.target_proto_range());

        {
            let buffer = self.buffer.as_mut();
            for (i, j) in sender_hw.clone().zip(target_hw) {
                buffer.swap(i, j);
            }
            for (i, j) in sender_proto.zip(target_proto) {
                buffer.swap(i, j);
            }
            buffer[sender_hw].copy_from_slice(hw_addr.as_bytes());
        }

        self.set_op(Op::Reply);
    }
}

fn read_u16(mut bytes: &[u8]) -> u16 {
    bytes.read_u16::<NetworkEndian>().unwrap_or(0)
}

/// An Ethernet/IPv4 ARP frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arp {
    pub op: Op,
    pub source_hw_addr: EthernetAddress,
    pub source_proto_addr: Ipv4Address,
    pub target_hw_addr: EthernetAddress,
    pub target_proto_addr: Ipv4Address,
}

impl Arp {
    /// Returns the size of the ARP frame when serialized to a buffer.
    pub fn buffer_len(&self) -> usize {
        ARP_SIZE
    }

    /// Attempts to deserialize a buffer into an ARP frame.
    pub fn deserialize(buffer: &[u8]) -> Result<Arp> {
        let frame = Frame::try_new(buffer)?;

        Ok(Arp {
            op: frame.op(),
            source_hw_addr: frame.sender_hw_addr(),
            source_proto_addr: frame.sender_proto_addr(),
            target_hw_addr: frame.target_hw_addr(),
            target_proto_addr: frame.target_proto_addr(),
        })
    }

    /// Serializes the ARP frame into a buffer.
    ///
    /// You should ensure buffer has at least buffer_len() bytes to avoid errors.
    pub fn serialize(&self, buffer: &mut [u8]) -> Result<()> {
        if self.buffer_len() > buffer.len() {
            return Err(Error::Exhausted);
        }

        let mut writer = Cursor::new(buffer);
        writer.write_u16::<NetworkEndian>(hw_types::ETHERNET)?;
        writer.write_u16::<NetworkEndian>(proto_types::IPV4)?;
        writer.write_u8(6)?;
        writer.write_u8(4)?;
        writer.write_u16::<NetworkEndian>(self.op.into())?;
        writer.write_all(self.source_hw_addr.as_bytes())?;
        writer.write_all(self.source_proto_addr.as_bytes())?;
        writer.write_all(self.target_hw_addr.as_bytes())?;
        writer.write_all(self.target_proto_addr.as_bytes())?;

        Ok(())
    }
}
