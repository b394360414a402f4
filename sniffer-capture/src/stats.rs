//! Capture and decode statistics

use sniffer_core::RawFrame;
use sniffer_packet::SkipReason;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Point-in-time statistics for a capture session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureStats {
    /// Frames handed to the decoder
    pub frames_seen: u64,
    /// Captured bytes handed to the decoder
    pub bytes_captured: u64,
    /// Frames whose snapshot was shorter than the wire length
    pub frames_truncated: u64,
    /// Frames decoded down to TCP
    pub decoded: u64,
    /// Skipped frames, indexed by [`SkipReason::index`]
    pub skipped: [u64; SkipReason::ALL.len()],
    /// Frames dropped by the kernel, when the capture reports it
    pub kernel_dropped: Option<u64>,
    /// Frames dropped by the interface, when the capture reports it
    pub if_dropped: Option<u64>,
    /// Capture duration
    pub duration: Duration,
}

impl CaptureStats {
    /// Skips recorded for one reason
    pub fn skipped_for(&self, reason: SkipReason) -> u64 {
        self.skipped[reason.index()]
    }

    /// Skips recorded for every reason
    pub fn total_skipped(&self) -> u64 {
        self.skipped.iter().sum()
    }

    /// Skips caused by malformed frames rather than other protocols
    pub fn malformed(&self) -> u64 {
        SkipReason::ALL
            .iter()
            .filter(|reason| reason.is_malformed())
            .map(|reason| self.skipped_for(*reason))
            .sum()
    }

    /// Frames per second over the capture duration
    pub fn frames_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.frames_seen as f64 / secs
        } else {
            0.0
        }
    }

    /// Calculate kernel drop rate as percentage of frames seen plus dropped
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.kernel_dropped.unwrap_or(0);
        let total = self.frames_seen + dropped;
        if total == 0 {
            return 0.0;
        }
        (dropped as f64 / total as f64) * 100.0
    }

    /// Attach pcap's kernel counters
    pub fn with_pcap_stats(mut self, stats: pcap::Stat) -> Self {
        self.kernel_dropped = Some(u64::from(stats.dropped));
        self.if_dropped = Some(u64::from(stats.if_dropped));
        self
    }
}

impl fmt::Display for CaptureStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Frames: {} ({} bytes, {} truncated)",
            self.frames_seen, self.bytes_captured, self.frames_truncated
        )?;
        writeln!(f, "Decoded TCP: {}", self.decoded)?;
        writeln!(
            f,
            "Skipped: {} ({} malformed)",
            self.total_skipped(),
            self.malformed()
        )?;
        for reason in SkipReason::ALL {
            let count = self.skipped_for(reason);
            if count > 0 {
                writeln!(f, "  {}: {}", reason, count)?;
            }
        }
        if let Some(dropped) = self.kernel_dropped {
            writeln!(f, "Dropped: {} ({:.2}%)", dropped, self.drop_rate())?;
        }
        if let Some(if_dropped) = self.if_dropped {
            writeln!(f, "IF Dropped: {}", if_dropped)?;
        }
        write!(
            f,
            "Duration: {:.2}s, Rate: {:.2} fps",
            self.duration.as_secs_f64(),
            self.frames_per_second()
        )
    }
}

/// Thread-safe statistics accumulator for a running capture
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    frames_seen: Arc<AtomicU64>,
    bytes_captured: Arc<AtomicU64>,
    frames_truncated: Arc<AtomicU64>,
    decoded: Arc<AtomicU64>,
    skipped: Arc<[AtomicU64; SkipReason::ALL.len()]>,
    start_time: Instant,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self {
            frames_seen: Arc::new(AtomicU64::new(0)),
            bytes_captured: Arc::new(AtomicU64::new(0)),
            frames_truncated: Arc::new(AtomicU64::new(0)),
            decoded: Arc::new(AtomicU64::new(0)),
            skipped: Arc::new(std::array::from_fn(|_| AtomicU64::new(0))),
            start_time: Instant::now(),
        }
    }

    /// Record a frame arriving from the source
    pub fn record_frame(&self, frame: &RawFrame<'_>) {
        self.frames_seen.fetch_add(1, Ordering::Relaxed);
        self.bytes_captured
            .fetch_add(u64::from(frame.caplen()), Ordering::Relaxed);
        if frame.is_truncated() {
            self.frames_truncated.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a successful decode
    pub fn record_decoded(&self) {
        self.decoded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a skipped frame
    pub fn record_skip(&self, reason: SkipReason) {
        self.skipped[reason.index()].fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics snapshot
    pub fn snapshot(&self) -> CaptureStats {
        let mut skipped = [0u64; SkipReason::ALL.len()];
        for (slot, counter) in skipped.iter_mut().zip(self.skipped.iter()) {
            *slot = counter.load(Ordering::Relaxed);
        }

        CaptureStats {
            frames_seen: self.frames_seen.load(Ordering::Relaxed),
            bytes_captured: self.bytes_captured.load(Ordering::Relaxed),
            frames_truncated: self.frames_truncated.load(Ordering::Relaxed),
            decoded: self.decoded.load(Ordering::Relaxed),
            skipped,
            kernel_dropped: None,
            if_dropped: None,
            duration: self.start_time.elapsed(),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.frames_seen.store(0, Ordering::Relaxed);
        self.bytes_captured.store(0, Ordering::Relaxed);
        self.frames_truncated.store(0, Ordering::Relaxed);
        self.decoded.store(0, Ordering::Relaxed);
        for counter in self.skipped.iter() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Get frames seen count
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen.load(Ordering::Relaxed)
    }

    /// Get decoded frame count
    pub fn decoded(&self) -> u64 {
        self.decoded.load(Ordering::Relaxed)
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_capture_stats_default() {
        let stats = CaptureStats::default();
        assert_eq!(stats.frames_seen, 0);
        assert_eq!(stats.total_skipped(), 0);
        assert_eq!(stats.drop_rate(), 0.0);
        assert_eq!(stats.frames_per_second(), 0.0);
    }

    #[test]
    fn test_drop_rate() {
        let stats = CaptureStats {
            frames_seen: 90,
            kernel_dropped: Some(10),
            ..CaptureStats::default()
        };
        assert_eq!(stats.drop_rate(), 10.0);
    }

    #[test]
    fn test_record_frames_and_outcomes() {
        let acc = StatsAccumulator::new();
        let data = [0u8; 60];

        acc.record_frame(&RawFrame::new(&data, 60, 60));
        acc.record_frame(&RawFrame::new(&data, 54, 1514));
        acc.record_decoded();
        acc.record_skip(SkipReason::NotTcp);
        acc.record_skip(SkipReason::InvalidTcpHeaderLength);

        let stats = acc.snapshot();
        assert_eq!(stats.frames_seen, 2);
        assert_eq!(stats.bytes_captured, 114);
        assert_eq!(stats.frames_truncated, 1);
        assert_eq!(stats.decoded, 1);
        assert_eq!(stats.skipped_for(SkipReason::NotTcp), 1);
        assert_eq!(stats.total_skipped(), 2);
        assert_eq!(stats.malformed(), 1);
    }

    #[test]
    fn test_display_lists_nonzero_reasons() {
        let acc = StatsAccumulator::new();
        acc.record_skip(SkipReason::NotIpv4);
        let text = acc.snapshot().to_string();
        assert!(text.contains("Skipped: 1 (0 malformed)"));
        assert!(text.contains("not an IPv4 frame: 1"));
        assert!(!text.contains("not a TCP segment"));
        assert!(!text.contains("Dropped"));
    }

    #[test]
    fn test_concurrent_recording() {
        let acc = StatsAccumulator::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let acc = acc.clone();
                thread::spawn(move || {
                    for _ in 0..250 {
                        acc.record_decoded();
                        acc.record_skip(SkipReason::NotIpv4);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(acc.decoded(), 1000);
        assert_eq!(acc.snapshot().skipped_for(SkipReason::NotIpv4), 1000);
    }

    #[test]
    fn test_reset() {
        let acc = StatsAccumulator::new();
        let data = [0u8; 14];
        acc.record_frame(&RawFrame::from_bytes(&data));
        acc.record_skip(SkipReason::NotIpv4);
        acc.reset();

        let stats = acc.snapshot();
        assert_eq!(stats.frames_seen, 0);
        assert_eq!(stats.total_skipped(), 0);
        assert_eq!(acc.frames_seen(), 0);
    }
}
