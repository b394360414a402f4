//! CLI argument parsing

use clap::Parser;
use sniffer_capture::CaptureConfig;
use sniffer_packet::{DecoderConfig, DEFAULT_PREVIEW_CAP};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "sniffer")]
#[command(
    version,
    about = "Print Ethernet, IPv4 and TCP headers of captured frames",
    long_about = None
)]
pub struct Cli {
    /// Network interface to capture on (defaults to the first capture-capable one)
    #[arg(value_name = "INTERFACE", conflicts_with = "read")]
    pub interface: Option<String>,

    /// Read frames from a pcap file instead of a live interface
    #[arg(short = 'r', long, value_name = "FILE")]
    pub read: Option<PathBuf>,

    /// Stop after this many decoded TCP frames
    #[arg(short = 'c', long, value_name = "N")]
    pub count: Option<u64>,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<u64>,

    /// Additional BPF filter, combined with "ip and tcp"
    #[arg(short = 'f', long, value_name = "BPF")]
    pub filter: Option<String>,

    /// Do not add the "ip and tcp" kernel filter
    #[arg(long)]
    pub all_traffic: bool,

    /// Maximum payload bytes shown per frame
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_PREVIEW_CAP)]
    pub preview: usize,

    /// Snapshot length passed to pcap
    #[arg(long, value_name = "BYTES", default_value_t = sniffer_capture::capture::DEFAULT_SNAPLEN)]
    pub snaplen: i32,

    /// Read timeout passed to pcap
    #[arg(long, value_name = "MS", default_value_t = sniffer_capture::capture::DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: i32,

    /// Kernel capture buffer size (0 keeps the platform default)
    #[arg(long, value_name = "BYTES", default_value_t = 0)]
    pub buffer_size: i32,

    /// Do not put the interface into promiscuous mode
    #[arg(long)]
    pub no_promisc: bool,

    /// Report skipped frames and their reason
    #[arg(long)]
    pub show_skips: bool,

    /// Print capture statistics on exit
    #[arg(long)]
    pub stats: bool,

    /// List network interfaces and exit
    #[arg(short = 'L', long)]
    pub list_interfaces: bool,

    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level for the given number of `-v` flags
    pub fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    pub fn capture_config(&self) -> CaptureConfig {
        CaptureConfig {
            snaplen: self.snaplen,
            timeout_ms: self.timeout_ms,
            promiscuous: !self.no_promisc,
            buffer_size: self.buffer_size,
            ..CaptureConfig::default()
        }
    }

    pub fn decoder_config(&self) -> DecoderConfig {
        DecoderConfig {
            preview_cap: self.preview,
        }
    }

    /// Kernel filter to install, if any
    pub fn bpf_filter(&self) -> Option<String> {
        sniffer_capture::filters::capture_filter(self.filter.as_deref(), !self.all_traffic)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration.map(Duration::from_secs)
    }
}
