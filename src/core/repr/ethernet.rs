use std::fmt::{
    Display,
    Formatter,
    Result as FmtResult,
};
use std::io::Write;
use std::result::Result as StdResult;
use std::str::FromStr;

use byteorder::{
    NetworkEndian,
    ReadBytesExt,
    WriteBytesExt,
};

use crate::{
    Error,
    Result,
};

/// [MAC address](https://en.wikipedia.org/wiki/MAC_address) in network byte order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Address([u8; 6]);

impl Address {
    pub const BROADCAST: Address = Address([0xFF; 6]);

    pub const UNSPECIFIED: Address = Address([0x00; 6]);

    /// Creates a MAC address from a network byte order buffer.
    pub fn new(addr: [u8; 6]) -> Address {
        Address(addr)
    }

    /// Tries to create a MAC address from a network byte order slice.
    pub fn try_new(addr: &[u8]) -> Result<Address> {
        if addr.len() != 6 {
            return Err(Error::Malformed);
        }

        let mut _addr = [0; 6];
        _addr.copy_from_slice(addr);
        Ok(Address(_addr))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Checks if this is a broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5],
        )
    }
}

impl FromStr for Address {
    type Err = ();

    /// Parses a MAC address from an a:b:c:d:e:f style string.
    fn from_str(addr: &str) -> StdResult<Address, Self::Err> {
        let bytes = addr.split(':')
            .map(|token| u8::from_str_radix(token, 16))
            .collect::<StdResult<Vec<_>, _>>()
            .map_err(|_| ())?;

        Address::try_new(&bytes).map_err(|_| ())
    }
}

/// [https://en.wikipedia.org/wiki/EtherType](https://en.wikipedia.org/wiki/EtherType)
pub mod eth_types {
    pub const IPV4: u16 = 0x800;

    pub const ARP: u16 = 0x806;
}

mod fields {
    use std::ops::{
        Range,
        RangeFrom,
    };

    pub const DST_ADDR: Range<usize> = 0 .. 6;

    pub const SRC_ADDR: Range<usize> = 6 .. 12;

    pub const PAYLOAD_TYPE: Range<usize> = 12 .. 14;

    pub const PAYLOAD: RangeFrom<usize> = 14 ..;
}

/// View of a byte buffer as an Ethernet frame.
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
    pub const HEADER_LEN: usize = 14;

    /// Tries to create an Ethernet frame view over a byte buffer.
    pub fn try_new(buffer: T) -> Result<Frame<T>> {
        if buffer.as_ref().len() < Self::HEADER_LEN {
            Err(Error::Malformed)
        } else {
            Ok(Frame { buffer })
        }
    }

    /// Returns the length of an Ethernet frame with the specified payload size.
    pub fn buffer_len(payload_len: usize) -> usize {
        Self::HEADER_LEN + payload_len
    }

    pub fn dst_addr(&self) -> Address {
        let mut addr = [0; 6];
        addr.copy_from_slice(&self.buffer.as_ref()[fields::DST_ADDR]);
        Address(addr)
    }

    pub fn src_addr(&self) -> Address {
        let mut addr = [0; 6];
        addr.copy_from_slice(&self.buffer.as_ref()[fields::SRC_ADDR]);
        Address(addr)
    }

    pub fn payload_type(&self) -> u16 {
        (&self.buffer.as_ref()[fields::PAYLOAD_TYPE])
            .read_u16::<NetworkEndian>()
            .unwrap_or(0)
    }

    pub fn payload(&self) -> &[u8] {
        &self.buffer.as_ref()[fields::PAYLOAD]
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> Frame<T> {
    pub fn set_dst_addr(&mut self, addr: Address) {
        let _ = (&mut self.buffer.as_mut()[fields::DST_ADDR]).write(addr.as_bytes());
    }

    pub fn set_src_addr(&mut self, addr: Address) {
        let _ = (&mut self.buffer.as_mut()[fields::SRC_ADDR]).write(addr.as_bytes());
    }

    pub fn set_payload_type(&mut self, payload_type: u16) {
        let _ = (&mut self.buffer.as_mut()[fields::PAYLOAD_TYPE])
            .write_u16::<NetworkEndian>(payload_type);
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.buffer.as_mut()[fields::PAYLOAD]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let addr = "aa:bb:cc:dd:ee:ff".parse::<Address>().unwrap();
        assert_eq!(addr, Address::new([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]));
        assert_eq!(addr.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_parse_bad_address() {
        assert_matches!("aa:bb:cc:dd:ee".parse::<Address>(), Err(()));
        assert_matches!("aa:bb:cc:dd:ee:zz".parse::<Address>(), Err(()));
    }

    #[test]
    fn test_is_broadcast() {
        assert!(Address::new([0xFF; 6]).is_broadcast());
        assert!(!Address::new([0x02, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]).is_broadcast());
    }

    #[test]
    fn test_frame_too_short() {
        assert_matches!(Frame::try_new(&[0; 13][..]), Err(Error::Malformed));
    }

    #[test]
    fn test_frame_fields() {
        let mut buffer = vec![0; Frame::<&[u8]>::buffer_len(2)];
        {
            let mut frame = Frame::try_new(&mut buffer[..]).unwrap();
            frame.set_dst_addr(Address::BROADCAST);
            frame.set_src_addr(Address::new([0x02, 0, 0, 0, 0, 1]));
            frame.set_payload_type(eth_types::ARP);
            frame.payload_mut().copy_from_slice(&[7, 8]);
        }

        let frame = Frame::try_new(&buffer[..]).unwrap();
        assert!(frame.dst_addr().is_broadcast());
        assert_eq!(frame.src_addr(), Address::new([0x02, 0, 0, 0, 0, 1]));
        assert_eq!(frame.payload_type(), eth_types::ARP);
        assert_eq!(frame.payload(), &[7, 8]);
    }
}
