//! Packet descriptor and padding rules.
//!
//! The MAC exchanges one 64-bit descriptor per frame. The lower 16 bits hold the payload
//! length, the upper 48 bits hold the station address: the destination for TX, the source
//! for RX. The EtherType used in [FrameMode::EthernetII](franco::eth::FrameMode::EthernetII)
//! travels through a separate register and is never part of the descriptor.
use core::fmt;

use super::{MAX_PAYLOAD_LENGTH, MIN_PAYLOAD_LENGTH};

const LENGTH_MASK: u64 = 0xFFFF;
const ADDRESS_SHIFT: u32 = 16;

/// Station address in descriptor byte order.
///
/// Byte `i` occupies descriptor bits `16 + 8 * i..=23 + 8 * i`. The MAC shifts the address
/// out starting with the most significant byte, so byte 0 is the last octet on the wire.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub const BROADCAST: Self = Self([0xFF; 6]);

    #[inline]
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn bytes(&self) -> [u8; 6] {
        self.0
    }

    /// Address in the order the octets appear on the wire.
    pub const fn wire_order(&self) -> [u8; 6] {
        let b = self.0;
        [b[5], b[4], b[3], b[2], b[1], b[0]]
    }

    /// Builds the descriptor order address from the wire order octets.
    pub const fn from_wire_order(octets: [u8; 6]) -> Self {
        let o = octets;
        Self([o[5], o[4], o[3], o[2], o[1], o[0]])
    }
}

/// Formats the address in wire order, for example `d8:bb:c1:57:aa:16`.
impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.wire_order();
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            w[0], w[1], w[2], w[3], w[4], w[5]
        )
    }
}

impl From<[u8; 6]> for MacAddress {
    #[inline]
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

/// Packed TX/RX packet descriptor.
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor(u64);

impl Descriptor {
    pub const fn new(length: u16, address: MacAddress) -> Self {
        let mut raw = length as u64;
        let mut i = 0;
        while i < 6 {
            raw |= (address.0[i] as u64) << (ADDRESS_SHIFT + 8 * i as u32);
            i += 1;
        }
        Self(raw)
    }

    /// Descriptor for a TX frame with `payload_len` bytes. The length field holds the wire
    /// length, which includes the padding.
    ///
    /// Returns [None] if `payload_len` exceeds [MAX_PAYLOAD_LENGTH].
    pub const fn for_payload(payload_len: usize, destination: MacAddress) -> Option<Self> {
        if payload_len > MAX_PAYLOAD_LENGTH {
            return None;
        }
        Some(Self::new(wire_length(payload_len) as u16, destination))
    }

    #[inline]
    pub const fn new_with_raw_value(raw: u64) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(&self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn length(&self) -> u16 {
        (self.0 & LENGTH_MASK) as u16
    }

    pub const fn address(&self) -> MacAddress {
        let mut bytes = [0; 6];
        let mut i = 0;
        while i < 6 {
            bytes[i] = (self.0 >> (ADDRESS_SHIFT + 8 * i as u32)) as u8;
            i += 1;
        }
        MacAddress(bytes)
    }

    #[inline]
    pub const fn with_length(self, length: u16) -> Self {
        Self((self.0 & !LENGTH_MASK) | length as u64)
    }

    #[inline]
    pub const fn with_address(self, address: MacAddress) -> Self {
        Self::new(self.length(), address)
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("raw", &format_args!("{:#018x}", self.0))
            .field("length", &self.length())
            .field("address", &self.address().0)
            .finish()
    }
}

/// Number of zero bytes appended to a payload of `payload_len` bytes.
#[inline]
pub const fn padding_len(payload_len: usize) -> usize {
    MIN_PAYLOAD_LENGTH.saturating_sub(payload_len)
}

/// Number of payload bytes which are actually pushed into the TX FIFO.
#[inline]
pub const fn wire_length(payload_len: usize) -> usize {
    payload_len + padding_len(payload_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: MacAddress = MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);

    #[test]
    fn field_placement() {
        let descr = Descriptor::new(42, ADDR);
        assert_eq!(descr.raw(), 0x5544_3322_1100_002A);
        assert_eq!(descr.raw() & 0xFFFF, 42);
        assert_eq!((descr.raw() >> 16) & 0xFF, 0x00);
        assert_eq!(descr.raw() >> 56, 0x55);
    }

    #[test]
    fn decode_reverses_encode() {
        let addresses = [
            MacAddress::default(),
            ADDR,
            MacAddress::BROADCAST,
            MacAddress([0x16, 0xAA, 0x57, 0xC1, 0xBB, 0xD8]),
        ];
        for addr in addresses {
            for len in [0, 1, 41, 42, 1500, 0x8000, u16::MAX] {
                let descr = Descriptor::new(len, addr);
                assert_eq!(descr.length(), len);
                assert_eq!(descr.address(), addr);
                let copy = Descriptor::new_with_raw_value(descr.raw());
                assert_eq!(copy, descr);
            }
        }
    }

    #[test]
    fn setters_do_not_touch_other_field() {
        let descr = Descriptor::new(100, ADDR);
        let descr = descr.with_length(0xFFFF);
        assert_eq!(descr.address(), ADDR);
        let descr = descr.with_address(MacAddress::BROADCAST);
        assert_eq!(descr.length(), 0xFFFF);
        assert_eq!(descr.raw(), u64::MAX);
    }

    #[test]
    fn padding_rules() {
        assert_eq!(padding_len(0), 42);
        assert_eq!(padding_len(1), 41);
        assert_eq!(padding_len(41), 1);
        assert_eq!(padding_len(42), 0);
        assert_eq!(padding_len(1500), 0);
        assert_eq!(wire_length(1), 42);
        assert_eq!(wire_length(42), 42);
        assert_eq!(wire_length(43), 43);
    }

    #[test]
    fn descriptor_for_payload_uses_wire_length() {
        let descr = Descriptor::for_payload(1, ADDR).unwrap();
        assert_eq!(descr.length(), 42);
        assert_eq!(descr.address(), ADDR);
        assert_eq!(Descriptor::for_payload(1500, ADDR).unwrap().length(), 1500);
        assert!(Descriptor::for_payload(1501, ADDR).is_none());
    }

    #[test]
    fn address_wire_order() {
        let addr = MacAddress([0x16, 0xAA, 0x57, 0xC1, 0xBB, 0xD8]);
        assert_eq!(addr.wire_order(), [0xD8, 0xBB, 0xC1, 0x57, 0xAA, 0x16]);
        assert_eq!(MacAddress::from_wire_order(addr.wire_order()), addr);
    }

    #[test]
    fn address_display() {
        use std::string::ToString;

        let addr = MacAddress([0x16, 0xAA, 0x57, 0xC1, 0xBB, 0xD8]);
        assert_eq!(addr.to_string(), "d8:bb:c1:57:aa:16");
    }
}
