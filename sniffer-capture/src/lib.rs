//! Frame capture for the sniffer
//!
//! This crate feeds raw frames to the decoder and drives the read loop.
//!
//! ## Features
//!
//! - **Live and offline capture**: pcap devices and savefiles behind one [`sniffer_core::FrameSource`]
//! - **Interface Management**: List, query, and select network interfaces
//! - **BPF Filters**: Builders for kernel-side filter expressions
//! - **Statistics**: Decode outcome counters merged with pcap's drop counters
//! - **Stop handle**: End or pause a capture from another thread
//!
//! ## Example
//!
//! ```no_run
//! use sniffer_capture::{filters, pipeline, CaptureConfig, PacketCapture, StatsAccumulator};
//! use sniffer_packet::{CountingSink, FrameDecoder};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut capture = PacketCapture::open("eth0", &CaptureConfig::default())?;
//! capture.set_filter(&filters::tcp_over_ipv4_filter())?;
//!
//! let stats = StatsAccumulator::new();
//! let mut sink = CountingSink::new();
//! pipeline::run(&mut capture, &FrameDecoder::new(), &mut sink, &stats, Some(100))?;
//!
//! println!("{}", capture.annotate_stats(stats.snapshot()));
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod filters;
pub mod interface;
pub mod pipeline;
pub mod stats;

// Re-export main types
pub use capture::{CaptureConfig, CaptureOrigin, CaptureState, PacketCapture, StopHandle};
pub use interface::{default_interface, get_interface, list_interfaces, InterfaceInfo};
pub use stats::{CaptureStats, StatsAccumulator};
