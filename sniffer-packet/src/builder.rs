//! Frame builder for synthesising Ethernet/IPv4/TCP frames
//!
//! Produces byte-exact frames with correct IPv4 and TCP checksums. The
//! decoder tests use it to build known frames, and it is handy for replaying
//! hand-made traffic through a [`sniffer_core::MemorySource`].

use crate::checksum::transport_checksum;
use crate::ethernet::{EtherType, EthernetHeader, MacAddress};
use crate::ipv4::{IpProtocol, Ipv4Fields};
use crate::tcp::{TcpFields, TcpFlags};
use bytes::{BufMut, BytesMut};
use sniffer_core::{Error, Result};
use std::net::Ipv4Addr;

/// Frame builder with a fluent API
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use sniffer_packet::{FrameBuilder, FrameDecoder, MacAddress};
///
/// let frame = FrameBuilder::new()
///     .ethernet(MacAddress([0x02, 0, 0, 0, 0, 1]), MacAddress::BROADCAST)
///     .ipv4(Ipv4Addr::new(192, 168, 1, 10), Ipv4Addr::new(192, 168, 1, 1))
///     .tcp(51000, 443)
///     .payload(b"hello".to_vec())
///     .build()
///     .unwrap();
///
/// let decoded = FrameDecoder::new().decode_bytes(&frame).unwrap();
/// assert_eq!(decoded.payload, b"hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FrameBuilder {
    ethernet: Option<EthernetHeader>,
    ipv4: Option<Ipv4Fields>,
    tcp: Option<TcpFields>,
    payload: Vec<u8>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an Ethernet layer carrying IPv4
    pub fn ethernet(mut self, src: MacAddress, dst: MacAddress) -> Self {
        self.ethernet = Some(EthernetHeader::new(dst, src, EtherType::IPv4));
        self
    }

    /// Override the EtherType
    ///
    /// Must be called after `ethernet()`.
    pub fn ether_type(mut self, ether_type: EtherType) -> Self {
        if let Some(ethernet) = self.ethernet.as_mut() {
            ethernet.ether_type = ether_type.to_u16();
        }
        self
    }

    /// Add an IPv4 layer carrying TCP
    pub fn ipv4(mut self, src: Ipv4Addr, dst: Ipv4Addr) -> Self {
        self.ipv4 = Some(Ipv4Fields::new(src, dst, IpProtocol::TCP));
        self
    }

    /// Override the IP protocol number
    ///
    /// Must be called after `ipv4()`.
    pub fn ip_protocol(mut self, protocol: IpProtocol) -> Self {
        if let Some(ip) = self.ipv4.as_mut() {
            ip.protocol = protocol;
        }
        self
    }

    /// Set the TTL for the IPv4 layer
    ///
    /// Must be called after `ipv4()`.
    pub fn ttl(mut self, ttl: u8) -> Self {
        if let Some(ip) = self.ipv4.as_mut() {
            ip.ttl = ttl;
        }
        self
    }

    /// Set IPv4 option bytes (zero-padded to a word boundary)
    ///
    /// Must be called after `ipv4()`.
    pub fn ip_options(mut self, options: Vec<u8>) -> Self {
        if let Some(ip) = self.ipv4.as_mut() {
            ip.options = options;
        }
        self
    }

    /// Add a TCP layer
    pub fn tcp(mut self, src_port: u16, dst_port: u16) -> Self {
        self.tcp = Some(TcpFields::new(src_port, dst_port));
        self
    }

    /// Set sequence and acknowledgment numbers
    ///
    /// Must be called after `tcp()`.
    pub fn sequence(mut self, seq: u32, ack: u32) -> Self {
        if let Some(tcp) = self.tcp.as_mut() {
            tcp.seq = seq;
            tcp.ack = ack;
        }
        self
    }

    /// Set TCP flags
    ///
    /// Must be called after `tcp()`.
    pub fn tcp_flags(mut self, flags: TcpFlags) -> Self {
        if let Some(tcp) = self.tcp.as_mut() {
            tcp.flags = flags;
        }
        self
    }

    /// Set the TCP window
    ///
    /// Must be called after `tcp()`.
    pub fn window(mut self, window: u16) -> Self {
        if let Some(tcp) = self.tcp.as_mut() {
            tcp.window = window;
        }
        self
    }

    /// Set TCP option bytes (zero-padded to a word boundary)
    ///
    /// Must be called after `tcp()`.
    pub fn tcp_options(mut self, options: Vec<u8>) -> Self {
        if let Some(tcp) = self.tcp.as_mut() {
            tcp.options = options;
        }
        self
    }

    /// Set the innermost payload
    pub fn payload(mut self, data: Vec<u8>) -> Self {
        self.payload = data;
        self
    }

    /// Build the frame
    pub fn build(self) -> Result<Vec<u8>> {
        let ethernet = self
            .ethernet
            .ok_or_else(|| Error::PacketConstruction("Ethernet layer is required".into()))?;

        if self.tcp.is_some() && self.ipv4.is_none() {
            return Err(Error::PacketConstruction(
                "TCP layer requires an IPv4 layer".into(),
            ));
        }

        for (name, len) in [
            (
                "IPv4 options",
                self.ipv4.as_ref().map_or(0, |ip| ip.options.len()),
            ),
            (
                "TCP options",
                self.tcp.as_ref().map_or(0, |tcp| tcp.options.len()),
            ),
        ] {
            if len > 40 {
                return Err(Error::PacketConstruction(format!(
                    "{} exceed 40 bytes ({})",
                    name, len
                )));
            }
        }

        let mut transport = BytesMut::new();
        match (&self.ipv4, &self.tcp) {
            (Some(ip), Some(tcp)) => {
                let mut header = BytesMut::with_capacity(tcp.header_len());
                tcp.write(0, &mut header)?;
                let checksum = transport_checksum(
                    &ip.source.octets(),
                    &ip.destination.octets(),
                    IpProtocol::TCP.to_u8(),
                    &[&header[..], &self.payload[..]],
                );
                tcp.write(checksum, &mut transport)?;
                transport.put_slice(&self.payload);
            }
            _ => transport.put_slice(&self.payload),
        }

        let mut frame = BytesMut::with_capacity(EthernetHeader::SIZE + 60 + transport.len());
        ethernet.write(&mut frame);
        if let Some(ip) = &self.ipv4 {
            ip.write(transport.len(), &mut frame)?;
        }
        frame.put_slice(&transport);

        Ok(frame.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::internet_checksum;

    fn base() -> FrameBuilder {
        FrameBuilder::new().ethernet(
            MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
            MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
        )
    }

    #[test]
    fn test_builder_ethernet_only() {
        let frame = base()
            .ether_type(EtherType::ARP)
            .payload(vec![0x00, 0x01])
            .build()
            .unwrap();

        assert_eq!(frame.len(), 16);
        assert_eq!(&frame[0..6], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(&frame[6..12], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(&frame[12..14], &[0x08, 0x06]);
    }

    #[test]
    fn test_builder_ethernet_ip_tcp() {
        let frame = base()
            .ipv4(Ipv4Addr::new(192, 168, 1, 1), Ipv4Addr::new(192, 168, 1, 2))
            .ttl(128)
            .tcp(12345, 80)
            .sequence(1000, 0)
            .payload(vec![0xAB; 10])
            .build()
            .unwrap();

        assert_eq!(frame.len(), 14 + 20 + 20 + 10);
        // IPv4: version/IHL, TTL, protocol, total length
        assert_eq!(frame[14], 0x45);
        assert_eq!(frame[14 + 8], 128);
        assert_eq!(frame[14 + 9], 6);
        assert_eq!(u16::from_be_bytes([frame[16], frame[17]]), 50);
        assert_eq!(internet_checksum(&frame[14..34]), 0);
        // TCP: ports, sequence, data offset
        assert_eq!(u16::from_be_bytes([frame[34], frame[35]]), 12345);
        assert_eq!(u16::from_be_bytes([frame[36], frame[37]]), 80);
        assert_eq!(
            u32::from_be_bytes([frame[38], frame[39], frame[40], frame[41]]),
            1000
        );
        assert_eq!(frame[46], 0x50);
    }

    #[test]
    fn test_builder_options_set_header_lengths() {
        let frame = base()
            .ipv4(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2))
            .ip_options(vec![0x01; 6])
            .tcp(1, 2)
            .tcp_options(vec![0x02, 0x04, 0x05, 0xb4])
            .build()
            .unwrap();

        assert_eq!(frame[14], 0x47);
        assert_eq!(frame.len(), 14 + 28 + 24);
        assert_eq!(frame[14 + 28 + 12], 0x60);
    }

    #[test]
    fn test_builder_udp_over_ipv4() {
        let frame = base()
            .ipv4(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2))
            .ip_protocol(IpProtocol::UDP)
            .payload(vec![0x00, 0x35, 0x00, 0x35, 0x00, 0x08, 0x00, 0x00])
            .build()
            .unwrap();

        assert_eq!(frame[14 + 9], 17);
        assert_eq!(frame.len(), 14 + 20 + 8);
    }

    #[test]
    fn test_builder_missing_ethernet() {
        let result = FrameBuilder::new().payload(vec![1, 2, 3]).build();
        assert!(matches!(result, Err(Error::PacketConstruction(_))));
    }

    #[test]
    fn test_builder_tcp_without_ipv4() {
        let result = base().tcp(1, 2).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_oversized_options() {
        let result = base()
            .ipv4(Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST)
            .ip_options(vec![0; 41])
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_oversized_datagram() {
        let result = base()
            .ipv4(Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST)
            .tcp(1, 2)
            .payload(vec![0; 65535 - 40 + 1])
            .build();
        assert!(matches!(result, Err(Error::PacketConstruction(_))));
    }
}
