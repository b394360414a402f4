//! Ethernet/IPv4/TCP header decoding for the sniffer
//!
//! This crate turns a captured frame into typed headers and a borrowed view
//! of the TCP payload, without trusting any length field in the frame. It
//! includes:
//!
//! - **Bounds-checked cursor** that every header read goes through
//! - **Ethernet II**, **IPv4** and **TCP** header readers, options included
//! - **Frame decoder** that runs the readers in order and filters for TCP over IPv4
//! - **Checksums** for verifying IPv4 and TCP headers
//! - **Frame builder** for synthesising frames in tests and replays
//!
//! # Architecture
//!
//! - [`cursor`] - Bounds-checked big-endian reads
//! - [`ethernet`] - Ethernet II header
//! - [`ipv4`] - IPv4 header and options
//! - [`tcp`] - TCP header, flags and options
//! - [`decoder`] - The decoding pipeline and its output
//! - [`skip`] - Why a frame was not decoded
//! - [`sink`] - Consumers of decode outcomes
//! - [`checksum`] - Internet checksum
//! - [`builder`] - Frame synthesis
//!
//! # Quick Start
//!
//! ```rust
//! use sniffer_core::RawFrame;
//! use sniffer_packet::{FrameDecoder, SkipReason};
//!
//! // An ARP frame: decoded as far as Ethernet, then skipped
//! let mut arp = vec![0xFF; 12];
//! arp.extend_from_slice(&[0x08, 0x06]);
//! arp.extend_from_slice(&[0u8; 28]);
//!
//! let decoder = FrameDecoder::new();
//! let outcome = decoder.decode(&RawFrame::from_bytes(&arp));
//! assert_eq!(outcome.unwrap_err(), SkipReason::NotIpv4);
//! ```

pub mod builder;
pub mod checksum;
pub mod cursor;
pub mod decoder;
pub mod ethernet;
pub mod ipv4;
pub mod sink;
pub mod skip;
pub mod tcp;

// Re-export main types
pub use builder::FrameBuilder;
pub use cursor::{ByteCursor, OutOfBounds};
pub use decoder::{DecodedFrame, DecoderConfig, FrameDecoder, DEFAULT_PREVIEW_CAP};
pub use ethernet::{EtherType, EthernetHeader, MacAddress};
pub use ipv4::{IpFlags, IpProtocol, Ipv4Header};
pub use sink::{dispatch, CountingSink, RecordSink};
pub use skip::SkipReason;
pub use tcp::{TcpFlags, TcpHeader, TcpOption, TcpOptions};
