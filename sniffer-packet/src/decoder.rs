//! Frame decoding pipeline
//!
//! [`FrameDecoder`] runs the Ethernet, IPv4 and TCP readers in encapsulation
//! order over one captured frame and either returns a [`DecodedFrame`] or the
//! [`SkipReason`] it stopped at. It keeps no state between frames, so one
//! decoder can be shared freely between threads.

use crate::checksum::transport_checksum;
use crate::cursor::ByteCursor;
use crate::ethernet::{EtherType, EthernetHeader};
use crate::ipv4::{IpProtocol, Ipv4Header};
use crate::skip::SkipReason;
use crate::tcp::TcpHeader;
use sniffer_core::RawFrame;

/// Default number of payload bytes shown in a preview
pub const DEFAULT_PREVIEW_CAP: usize = 20;

/// Decoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Upper bound on the payload preview length
    pub preview_cap: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            preview_cap: DEFAULT_PREVIEW_CAP,
        }
    }
}

/// A frame decoded down to its TCP payload
///
/// Every slice in here borrows from the buffer of the [`RawFrame`] that was
/// decoded, so a `DecodedFrame<'a>` cannot outlive that buffer. Copy the
/// payload out if it needs to be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame<'a> {
    pub ethernet: EthernetHeader,
    pub ip: Ipv4Header<'a>,
    pub tcp: TcpHeader<'a>,
    /// Every captured byte after the TCP header; possibly empty
    pub payload: &'a [u8],
    /// Captured bytes actually present for the whole frame
    pub captured_total: u32,
    /// Bytes on the wire for the whole frame
    pub wire_len: u32,
    preview_len: usize,
}

impl<'a> DecodedFrame<'a> {
    /// True payload length within the captured bytes
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the segment carried no captured payload
    pub fn has_payload(&self) -> bool {
        !self.payload.is_empty()
    }

    /// The first `min(preview_cap, payload_len)` payload bytes
    pub fn preview(&self) -> &'a [u8] {
        &self.payload[..self.preview_len]
    }

    /// Combined length of the three headers
    pub fn headers_len(&self) -> usize {
        EthernetHeader::SIZE + self.ip.header_len() + self.tcp.header_len()
    }

    /// Verify the TCP checksum
    ///
    /// Returns `None` when the capture holds less of the segment than the IPv4
    /// header declares, since the checksum cannot be computed from a partial
    /// segment.
    pub fn tcp_checksum_valid(&self) -> Option<bool> {
        let segment_len = self.ip.declared_payload_len();
        let data_len = segment_len.checked_sub(self.tcp.header_len())?;
        let data = self.payload.get(..data_len)?;
        let sum = transport_checksum(
            &self.ip.source.octets(),
            &self.ip.destination.octets(),
            IpProtocol::TCP.to_u8(),
            &[self.tcp.raw, data],
        );
        Some(sum == 0)
    }
}

/// Stateless Ethernet/IPv4/TCP frame decoder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameDecoder {
    config: DecoderConfig,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one frame
    ///
    /// Reads never go past `frame.caplen()`; every header length taken from
    /// the wire is range-checked before it is used.
    pub fn decode<'a>(&self, frame: &RawFrame<'a>) -> Result<DecodedFrame<'a>, SkipReason> {
        let bytes = frame.bytes();
        let mut cursor = ByteCursor::new(bytes);

        let ethernet = EthernetHeader::read(&mut cursor)?;
        if ethernet.kind() != EtherType::IPv4 {
            return Err(SkipReason::NotIpv4);
        }

        let ip = Ipv4Header::read(&mut cursor)?;
        if ip.kind() != IpProtocol::TCP {
            return Err(SkipReason::NotTcp);
        }

        let tcp = TcpHeader::read(&mut cursor)?;

        let payload = cursor.rest();
        let preview_len = payload.len().min(self.config.preview_cap);

        Ok(DecodedFrame {
            ethernet,
            ip,
            tcp,
            payload,
            captured_total: u32::try_from(bytes.len()).unwrap_or(u32::MAX),
            wire_len: frame.wire_len(),
            preview_len,
        })
    }

    /// Decode one frame from a plain byte slice
    pub fn decode_bytes<'a>(&self, data: &'a [u8]) -> Result<DecodedFrame<'a>, SkipReason> {
        self.decode(&RawFrame::from_bytes(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FrameBuilder;
    use crate::ethernet::MacAddress;
    use crate::tcp::TcpFlags;
    use std::net::Ipv4Addr;

    fn http_frame(payload: &[u8]) -> Vec<u8> {
        FrameBuilder::new()
            .ethernet(
                MacAddress([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]),
                MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            )
            .ipv4(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2))
            .tcp(40000, 80)
            .tcp_flags(TcpFlags::PSH_ACK)
            .payload(payload.to_vec())
            .build()
            .unwrap()
    }

    #[test]
    fn test_decode_tcp_frame() {
        let data = http_frame(b"GET / HTTP/1.1\r\n");
        let decoded = FrameDecoder::new().decode_bytes(&data).unwrap();

        assert_eq!(decoded.ethernet.source.to_string(), "00:11:22:33:44:55");
        assert_eq!(decoded.ethernet.destination.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(decoded.ip.source, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(decoded.ip.destination, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(decoded.tcp.src_port, 40000);
        assert_eq!(decoded.tcp.dst_port, 80);
        assert_eq!(decoded.payload, b"GET / HTTP/1.1\r\n");
        assert_eq!(decoded.payload_len(), 16);
        assert_eq!(decoded.preview(), b"GET / HTTP/1.1\r\n");
        assert_eq!(decoded.headers_len(), 54);
        assert_eq!(decoded.captured_total as usize, data.len());
        assert!(decoded.ip.checksum_valid());
        assert_eq!(decoded.tcp_checksum_valid(), Some(true));
    }

    #[test]
    fn test_captured_total_counts_bytes_present() {
        let data = http_frame(b"abcd");
        let declared = data.len() as u32 + 100;
        let frame = RawFrame::new(&data, declared, declared);

        let decoded = FrameDecoder::new().decode(&frame).unwrap();
        assert_eq!(decoded.captured_total as usize, data.len());
        assert_eq!(
            decoded.headers_len() + decoded.payload_len(),
            decoded.captured_total as usize
        );
        assert_eq!(decoded.wire_len, declared);
    }

    #[test]
    fn test_preview_is_capped() {
        let payload: Vec<u8> = (0..64).collect();
        let data = http_frame(&payload);

        let decoded = FrameDecoder::new().decode_bytes(&data).unwrap();
        assert_eq!(decoded.payload_len(), 64);
        assert_eq!(decoded.preview(), &payload[..DEFAULT_PREVIEW_CAP]);

        let decoder = FrameDecoder::with_config(DecoderConfig { preview_cap: 4 });
        assert_eq!(decoder.decode_bytes(&data).unwrap().preview(), &[0u8, 1, 2, 3]);
    }

    #[test]
    fn test_short_payload_preview_not_padded() {
        let data = http_frame(&[0xdeu8, 0xad]);
        let decoded = FrameDecoder::new().decode_bytes(&data).unwrap();
        assert_eq!(decoded.preview(), &[0xdeu8, 0xad]);
    }

    #[test]
    fn test_caplen_bounds_decoding() {
        let data = http_frame(b"0123456789");
        // Snapshot cut the frame 4 bytes into the payload
        let frame = RawFrame::new(&data, 58, data.len() as u32);

        let decoded = FrameDecoder::new().decode(&frame).unwrap();
        assert_eq!(decoded.payload, b"0123");
        assert_eq!(decoded.captured_total, 58);
        assert_eq!(decoded.wire_len as usize, data.len());
        assert_eq!(decoded.tcp_checksum_valid(), None);
    }

    #[test]
    fn test_corrupted_tcp_checksum_detected() {
        let mut data = http_frame(b"hello");
        let last = data.len() - 1;
        data[last] ^= 0xFF;

        let decoded = FrameDecoder::new().decode_bytes(&data).unwrap();
        assert_eq!(decoded.tcp_checksum_valid(), Some(false));
    }

    #[test]
    fn test_decoder_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FrameDecoder>();
        assert_send_sync::<DecodedFrame<'static>>();
    }
}
