//! IPv4 header decoding
//!
//! The IPv4 header is 20 to 60 bytes long. Its length comes from the IHL
//! nibble, which is peer-controlled, so the reader range-checks it before
//! using it to size the options and relies on [`ByteCursor`] to refuse any
//! span beyond the captured bytes.

use crate::checksum::internet_checksum;
use crate::cursor::{ByteCursor, OutOfBounds};
use crate::skip::SkipReason;
use bytes::BufMut;
use sniffer_core::Error;
use std::fmt;
use std::net::Ipv4Addr;

/// IP Protocol numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    /// ICMP (1)
    ICMP,
    /// IGMP (2)
    IGMP,
    /// TCP (6)
    TCP,
    /// UDP (17)
    UDP,
    /// GRE (47)
    GRE,
    /// ESP (50)
    ESP,
    /// OSPF (89)
    OSPF,
    /// SCTP (132)
    SCTP,
    /// Custom protocol number
    Custom(u8),
}

impl IpProtocol {
    pub fn to_u8(self) -> u8 {
        match self {
            IpProtocol::ICMP => 1,
            IpProtocol::IGMP => 2,
            IpProtocol::TCP => 6,
            IpProtocol::UDP => 17,
            IpProtocol::GRE => 47,
            IpProtocol::ESP => 50,
            IpProtocol::OSPF => 89,
            IpProtocol::SCTP => 132,
            IpProtocol::Custom(val) => val,
        }
    }

    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => IpProtocol::ICMP,
            2 => IpProtocol::IGMP,
            6 => IpProtocol::TCP,
            17 => IpProtocol::UDP,
            47 => IpProtocol::GRE,
            50 => IpProtocol::ESP,
            89 => IpProtocol::OSPF,
            132 => IpProtocol::SCTP,
            val => IpProtocol::Custom(val),
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpProtocol::ICMP => write!(f, "ICMP"),
            IpProtocol::IGMP => write!(f, "IGMP"),
            IpProtocol::TCP => write!(f, "TCP"),
            IpProtocol::UDP => write!(f, "UDP"),
            IpProtocol::GRE => write!(f, "GRE"),
            IpProtocol::ESP => write!(f, "ESP"),
            IpProtocol::OSPF => write!(f, "OSPF"),
            IpProtocol::SCTP => write!(f, "SCTP"),
            IpProtocol::Custom(val) => write!(f, "proto {}", val),
        }
    }
}

/// IP Flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IpFlags {
    /// Reserved bit (must be 0)
    pub reserved: bool,
    /// Don't Fragment flag
    pub dont_fragment: bool,
    /// More Fragments flag
    pub more_fragments: bool,
}

impl IpFlags {
    /// Don't Fragment flag set
    pub const DONT_FRAGMENT: IpFlags = IpFlags {
        reserved: false,
        dont_fragment: true,
        more_fragments: false,
    };

    /// Convert to 3-bit value
    pub fn to_u8(self) -> u8 {
        let mut flags = 0u8;
        if self.reserved {
            flags |= 0b100;
        }
        if self.dont_fragment {
            flags |= 0b010;
        }
        if self.more_fragments {
            flags |= 0b001;
        }
        flags
    }

    /// Parse from 3-bit value
    pub fn from_u8(value: u8) -> Self {
        IpFlags {
            reserved: (value & 0b100) != 0,
            dont_fragment: (value & 0b010) != 0,
            more_fragments: (value & 0b001) != 0,
        }
    }
}

/// Decoded IPv4 header
///
/// `options` and the raw header bytes borrow from the frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4Header<'a> {
    /// Version nibble (always 4 once decoded)
    pub version: u8,
    /// Internet Header Length in 32-bit words, 5..=15
    pub header_len_words: u8,
    /// Type of Service / DSCP+ECN
    pub tos: u8,
    /// Total length (header + data) as declared on the wire
    pub total_len: u16,
    /// Identification
    pub identification: u16,
    /// Flags
    pub flags: IpFlags,
    /// Fragment offset (in 8-byte blocks)
    pub fragment_offset: u16,
    /// Time to Live
    pub ttl: u8,
    /// Protocol number
    pub protocol: u8,
    /// Header checksum as carried on the wire
    pub checksum: u16,
    /// Source IP address
    pub source: Ipv4Addr,
    /// Destination IP address
    pub destination: Ipv4Addr,
    /// Option bytes, `(header_len_words - 5) * 4` long
    pub options: &'a [u8],
    raw: &'a [u8],
}

impl<'a> Ipv4Header<'a> {
    /// Minimum IPv4 header size (without options)
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Maximum IPv4 header size (with maximum options)
    pub const MAX_HEADER_SIZE: usize = 60;

    /// Decode the header at the cursor, leaving it past any options
    pub fn read(cursor: &mut ByteCursor<'a>) -> Result<Self, SkipReason> {
        let mut start = *cursor;
        let short = |_: OutOfBounds| SkipReason::TooShortForIp;

        // Version and IHL share byte 0
        let version_ihl = cursor.read_u8().map_err(short)?;
        let version = version_ihl >> 4;
        let header_len_words = version_ihl & 0x0F;

        if header_len_words < 5 {
            return Err(SkipReason::InvalidIpHeaderLength);
        }
        if version != 4 {
            return Err(SkipReason::NotIpv4);
        }

        let tos = cursor.read_u8().map_err(short)?;
        let total_len = cursor.read_u16_be().map_err(short)?;
        let identification = cursor.read_u16_be().map_err(short)?;

        let flags_and_offset = cursor.read_u16_be().map_err(short)?;
        let flags = IpFlags::from_u8((flags_and_offset >> 13) as u8);
        let fragment_offset = flags_and_offset & 0x1FFF;

        let ttl = cursor.read_u8().map_err(short)?;
        let protocol = cursor.read_u8().map_err(short)?;
        let checksum = cursor.read_u16_be().map_err(short)?;
        let source = Ipv4Addr::from(cursor.read_array::<4>().map_err(short)?);
        let destination = Ipv4Addr::from(cursor.read_array::<4>().map_err(short)?);

        let header_len = usize::from(header_len_words) * 4;
        let options = cursor
            .read_bytes(header_len - Self::MIN_HEADER_SIZE)
            .map_err(short)?;

        let raw = start.read_bytes(header_len).map_err(short)?;

        Ok(Ipv4Header {
            version,
            header_len_words,
            tos,
            total_len,
            identification,
            flags,
            fragment_offset,
            ttl,
            protocol,
            checksum,
            source,
            destination,
            options,
            raw,
        })
    }

    /// Header size in bytes, options included
    pub fn header_len(&self) -> usize {
        usize::from(self.header_len_words) * 4
    }

    /// Typed view of the protocol field
    pub fn kind(&self) -> IpProtocol {
        IpProtocol::from_u8(self.protocol)
    }

    /// Payload length the header declares, which may disagree with what was captured
    pub fn declared_payload_len(&self) -> usize {
        usize::from(self.total_len).saturating_sub(self.header_len())
    }

    /// Whether the header checksum verifies over the captured header bytes
    pub fn checksum_valid(&self) -> bool {
        internet_checksum(self.raw) == 0
    }

    /// Whether this is one piece of a fragmented datagram
    pub fn is_fragment(&self) -> bool {
        self.flags.more_fragments || self.fragment_offset != 0
    }
}

/// Fields needed to encode an IPv4 header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Fields {
    pub tos: u8,
    pub identification: u16,
    pub flags: IpFlags,
    pub fragment_offset: u16,
    pub ttl: u8,
    pub protocol: IpProtocol,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// Option bytes; padded with zeros to a 4-byte boundary when written
    pub options: Vec<u8>,
}

impl Ipv4Fields {
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr, protocol: IpProtocol) -> Self {
        Ipv4Fields {
            tos: 0,
            identification: 0,
            flags: IpFlags::DONT_FRAGMENT,
            fragment_offset: 0,
            ttl: 64,
            protocol,
            source,
            destination,
            options: Vec::new(),
        }
    }

    /// Options length after padding
    pub fn padded_options_len(&self) -> usize {
        (self.options.len() + 3) & !3
    }

    /// Header length in bytes once encoded
    pub fn header_len(&self) -> usize {
        Ipv4Header::MIN_HEADER_SIZE + self.padded_options_len()
    }

    /// Encode the header with a valid checksum for a datagram of `payload_len` bytes
    ///
    /// Fails without writing anything when the options exceed 40 bytes or the
    /// datagram does not fit the 16-bit total length.
    pub fn write<B: BufMut>(&self, payload_len: usize, buf: &mut B) -> sniffer_core::Result<()> {
        let header_len = self.header_len();
        if header_len > Ipv4Header::MAX_HEADER_SIZE {
            return Err(Error::PacketConstruction(format!(
                "IPv4 options exceed 40 bytes ({})",
                self.options.len()
            )));
        }
        let total_len = u16::try_from(header_len + payload_len).map_err(|_| {
            Error::PacketConstruction("IPv4 datagram exceeds 65535 bytes".into())
        })?;

        let mut header = Vec::with_capacity(header_len);

        // Version (4 bits) + IHL (4 bits)
        header.put_u8((4 << 4) | ((header_len / 4) as u8 & 0x0F));
        header.put_u8(self.tos);
        header.put_u16(total_len);
        header.put_u16(self.identification);
        let flags_and_offset =
            (u16::from(self.flags.to_u8()) << 13) | (self.fragment_offset & 0x1FFF);
        header.put_u16(flags_and_offset);
        header.put_u8(self.ttl);
        header.put_u8(self.protocol.to_u8());
        header.put_u16(0);
        header.put_slice(&self.source.octets());
        header.put_slice(&self.destination.octets());
        header.put_slice(&self.options);
        header.resize(header_len, 0);

        let checksum = internet_checksum(&header);
        header[10..12].copy_from_slice(&checksum.to_be_bytes());

        buf.put_slice(&header);
        Ok(())
    }
}
