//! Frame capture wrapper around pcap

use parking_lot::RwLock;
use pcap::{Activated, Capture, Device, Linktype};
use sniffer_core::{Error, FrameSource, RawFrame, Result};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::interface::get_interface;
use crate::stats::CaptureStats;

/// Default snapshot length (maximum bytes per frame)
pub const DEFAULT_SNAPLEN: i32 = 65535;

/// Default read timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: i32 = 1000;

/// Configuration for a live capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Maximum bytes to capture per frame
    pub snaplen: i32,
    /// Read timeout in milliseconds
    pub timeout_ms: i32,
    /// Enable promiscuous mode
    pub promiscuous: bool,
    /// Kernel buffer size (0 = default)
    pub buffer_size: i32,
    /// Deliver frames as soon as they arrive
    pub immediate_mode: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            promiscuous: true,
            buffer_size: 0,
            immediate_mode: true,
        }
    }
}

impl CaptureConfig {
    /// Reject values pcap would misbehave with
    pub fn validate(&self) -> Result<()> {
        if self.snaplen < 14 {
            return Err(Error::config(
                "snaplen".to_string(),
                format!("{} is shorter than an Ethernet header", self.snaplen),
            ));
        }
        if self.timeout_ms <= 0 {
            return Err(Error::config(
                "timeout_ms".to_string(),
                format!("{} must be positive", self.timeout_ms),
            ));
        }
        if self.buffer_size < 0 {
            return Err(Error::config(
                "buffer_size".to_string(),
                format!("{} must not be negative", self.buffer_size),
            ));
        }
        Ok(())
    }
}

/// State of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Capture is not delivering frames and will not again
    Stopped,
    /// Capture is delivering frames
    Running,
    /// Capture is holding frames back until resumed
    Paused,
}

/// Handle for controlling a capture from another thread
#[derive(Debug, Clone)]
pub struct StopHandle {
    state: Arc<RwLock<CaptureState>>,
}

impl StopHandle {
    fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(CaptureState::Running)),
        }
    }

    /// Current capture state
    pub fn state(&self) -> CaptureState {
        *self.state.read()
    }

    /// Stop the capture; it returns no further frames
    pub fn stop(&self) {
        *self.state.write() = CaptureState::Stopped;
    }

    /// Pause the capture
    pub fn pause(&self) -> Result<()> {
        let mut state = self.state.write();
        if *state != CaptureState::Running {
            return Err(Error::capture("Capture not running"));
        }
        *state = CaptureState::Paused;
        Ok(())
    }

    /// Resume a paused capture
    pub fn resume(&self) -> Result<()> {
        let mut state = self.state.write();
        if *state != CaptureState::Paused {
            return Err(Error::capture("Capture not paused"));
        }
        *state = CaptureState::Running;
        Ok(())
    }

    /// Stop the capture once `after` has elapsed
    pub fn stop_after(&self, after: Duration) -> thread::JoinHandle<()> {
        let handle = self.clone();
        thread::spawn(move || {
            thread::sleep(after);
            debug!("Capture time limit of {:?} reached", after);
            handle.stop();
        })
    }
}

/// Where the frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOrigin {
    /// A live network interface
    Interface(String),
    /// A pcap savefile
    File(String),
}

impl CaptureOrigin {
    pub fn name(&self) -> &str {
        match self {
            CaptureOrigin::Interface(name) | CaptureOrigin::File(name) => name,
        }
    }
}

/// Pull-based frame capture from a live interface or a pcap file
pub struct PacketCapture {
    origin: CaptureOrigin,
    capture: Capture<dyn Activated>,
    filter: Option<String>,
    control: StopHandle,
    buffer: Vec<u8>,
}

impl PacketCapture {
    /// Open a live capture on the specified interface
    pub fn open(interface: &str, config: &CaptureConfig) -> Result<Self> {
        config.validate()?;

        let interface_info = get_interface(interface)?;
        if !interface_info.is_up {
            return Err(Error::Capture(format!(
                "Interface '{}' is not up",
                interface
            )));
        }

        debug!("Initializing pcap capture on {}", interface);

        let device = Device::from(interface);
        let mut capture = Capture::from_device(device)
            .map_err(|e| Error::Capture(format!("Failed to create capture: {}", e)))?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.timeout_ms)
            .immediate_mode(config.immediate_mode);

        if config.buffer_size > 0 {
            capture = capture.buffer_size(config.buffer_size);
        }

        let capture = capture
            .open()
            .map_err(|e| Error::Capture(format!("Failed to open capture: {}", e)))?;

        info!(
            "Capture opened on {} (snaplen {}, promiscuous {})",
            interface, config.snaplen, config.promiscuous
        );

        Ok(Self::from_activated(
            CaptureOrigin::Interface(interface.to_string()),
            capture.into(),
        ))
    }

    /// Open a pcap savefile for offline decoding
    pub fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let capture = Capture::from_file(path).map_err(|e| {
            Error::Capture(format!("Failed to open '{}': {}", path.display(), e))
        })?;

        info!("Reading frames from {}", path.display());

        Ok(Self::from_activated(
            CaptureOrigin::File(path.display().to_string()),
            capture.into(),
        ))
    }

    fn from_activated(origin: CaptureOrigin, capture: Capture<dyn Activated>) -> Self {
        let datalink = capture.get_datalink();
        if datalink != Linktype::ETHERNET {
            warn!(
                "{} has link type {:?}; only Ethernet frames will decode",
                origin.name(),
                datalink
            );
        }

        Self {
            origin,
            capture,
            filter: None,
            control: StopHandle::new(),
            buffer: Vec::with_capacity(DEFAULT_SNAPLEN as usize),
        }
    }

    /// Install a BPF filter
    pub fn set_filter(&mut self, bpf: &str) -> Result<()> {
        debug!("Setting BPF filter: {}", bpf);

        self.capture
            .filter(bpf, true)
            .map_err(|e| Error::invalid_filter(bpf.to_string(), e.to_string()))?;
        self.filter = Some(bpf.to_string());

        info!("BPF filter set: {}", bpf);
        Ok(())
    }

    /// Currently installed BPF filter
    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Where frames are read from
    pub fn origin(&self) -> &CaptureOrigin {
        &self.origin
    }

    /// Get the datalink type
    pub fn datalink(&self) -> Linktype {
        self.capture.get_datalink()
    }

    /// Handle that can stop or pause this capture from another thread
    pub fn stop_handle(&self) -> StopHandle {
        self.control.clone()
    }

    /// Get current capture state
    pub fn state(&self) -> CaptureState {
        self.control.state()
    }

    /// Kernel counters from pcap; not available for savefiles
    pub fn pcap_stats(&mut self) -> Option<pcap::Stat> {
        if matches!(self.origin, CaptureOrigin::File(_)) {
            return None;
        }
        match self.capture.stats() {
            Ok(stats) => Some(stats),
            Err(e) => {
                debug!("pcap stats unavailable: {}", e);
                None
            }
        }
    }

    /// Merge pcap's kernel counters into decode statistics
    pub fn annotate_stats(&mut self, stats: CaptureStats) -> CaptureStats {
        match self.pcap_stats() {
            Some(pcap_stats) => stats.with_pcap_stats(pcap_stats),
            None => stats,
        }
    }
}

impl FrameSource for PacketCapture {
    fn next_frame(&mut self) -> Result<Option<RawFrame<'_>>> {
        let (caplen, len) = loop {
            match self.control.state() {
                CaptureState::Stopped => {
                    debug!("Capture on {} stopped", self.origin.name());
                    return Ok(None);
                }
                CaptureState::Paused => {
                    thread::sleep(Duration::from_millis(100));
                    continue;
                }
                CaptureState::Running => {}
            }

            match self.capture.next_packet() {
                Ok(packet) => {
                    self.buffer.clear();
                    self.buffer.extend_from_slice(packet.data);
                    break (packet.header.caplen, packet.header.len);
                }
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(pcap::Error::NoMorePackets) => {
                    info!("End of capture from {}", self.origin.name());
                    self.control.stop();
                    return Ok(None);
                }
                Err(e) => {
                    self.control.stop();
                    return Err(Error::Capture(format!(
                        "Packet capture error on {}: {}",
                        self.origin.name(),
                        e
                    )));
                }
            }
        };

        Ok(Some(RawFrame::new(&self.buffer, caplen, len)))
    }
}

impl Drop for PacketCapture {
    fn drop(&mut self) {
        self.control.stop();
    }
}
