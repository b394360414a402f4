//! Ethernet II header decoding
//!
//! This module reads the fixed 14-byte Ethernet II header: destination MAC,
//! source MAC and the EtherType of the encapsulated protocol. It does not
//! decide whether a frame is interesting; that policy lives in
//! [`crate::FrameDecoder`].

use crate::cursor::{ByteCursor, OutOfBounds};
use crate::skip::SkipReason;
use bytes::BufMut;
use std::fmt;

/// Common EtherType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    IPv4,
    /// ARP (0x0806)
    ARP,
    /// VLAN-tagged frame (0x8100)
    VLAN,
    /// IPv6 (0x86DD)
    IPv6,
    /// MPLS unicast (0x8847)
    MPLS,
    /// LLDP (0x88CC)
    LLDP,
    /// Q-in-Q/802.1ad (0x88A8)
    QinQ,
    /// 802.3 length field (values up to 1500)
    Length(u16),
    /// Any other EtherType
    Custom(u16),
}

impl EtherType {
    /// Convert EtherType to u16 value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::IPv4 => 0x0800,
            EtherType::ARP => 0x0806,
            EtherType::VLAN => 0x8100,
            EtherType::IPv6 => 0x86DD,
            EtherType::MPLS => 0x8847,
            EtherType::LLDP => 0x88CC,
            EtherType::QinQ => 0x88A8,
            EtherType::Length(val) | EtherType::Custom(val) => val,
        }
    }

    /// Create EtherType from u16 value
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0800 => EtherType::IPv4,
            0x0806 => EtherType::ARP,
            0x8100 => EtherType::VLAN,
            0x86DD => EtherType::IPv6,
            0x8847 => EtherType::MPLS,
            0x88CC => EtherType::LLDP,
            0x88A8 => EtherType::QinQ,
            val if val <= 1500 => EtherType::Length(val),
            val => EtherType::Custom(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::ARP => write!(f, "ARP"),
            EtherType::VLAN => write!(f, "VLAN"),
            EtherType::IPv6 => write!(f, "IPv6"),
            EtherType::MPLS => write!(f, "MPLS"),
            EtherType::LLDP => write!(f, "LLDP"),
            EtherType::QinQ => write!(f, "Q-in-Q"),
            EtherType::Length(len) => write!(f, "802.3 length {}", len),
            EtherType::Custom(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// MAC address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Broadcast MAC address (ff:ff:ff:ff:ff:ff)
    pub const BROADCAST: MacAddress = MacAddress([0xFF; 6]);

    /// Zero MAC address (00:00:00:00:00:00)
    pub const ZERO: MacAddress = MacAddress([0x00; 6]);

    pub fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Check if this is a multicast address (bit 0 of first octet is 1)
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 == 0x01
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}

/// Ethernet II header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    /// Destination MAC address
    pub destination: MacAddress,
    /// Source MAC address
    pub source: MacAddress,
    /// EtherType or 802.3 length field, host order
    pub ether_type: u16,
}

impl EthernetHeader {
    /// Ethernet header size (dst + src + type/length)
    pub const SIZE: usize = 14;

    pub fn new(destination: MacAddress, source: MacAddress, ether_type: EtherType) -> Self {
        EthernetHeader {
            destination,
            source,
            ether_type: ether_type.to_u16(),
        }
    }

    /// Decode the header at the cursor, leaving it 14 bytes further on
    pub fn read(cursor: &mut ByteCursor<'_>) -> Result<Self, SkipReason> {
        if cursor.remaining() < Self::SIZE {
            return Err(SkipReason::TooShortForEthernet);
        }

        let short = |_: OutOfBounds| SkipReason::TooShortForEthernet;
        let destination = MacAddress(cursor.read_array().map_err(short)?);
        let source = MacAddress(cursor.read_array().map_err(short)?);
        let ether_type = cursor.read_u16_be().map_err(short)?;

        Ok(EthernetHeader {
            destination,
            source,
            ether_type,
        })
    }

    /// Typed view of the EtherType field
    pub fn kind(&self) -> EtherType {
        EtherType::from_u16(self.ether_type)
    }

    /// Encode the header in wire order
    pub fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(self.destination.as_bytes());
        buf.put_slice(self.source.as_bytes());
        buf.put_u16(self.ether_type);
    }
}
