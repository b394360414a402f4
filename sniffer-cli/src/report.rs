//! Console output of decoded frames

use sniffer_packet::{DecodedFrame, RecordSink, SkipReason};
use std::io::{self, Write};
use tracing::{info, warn};

/// Writes one block per decoded frame in the classic pcap-test layout
pub struct ConsoleReport<W: Write> {
    out: W,
    show_skips: bool,
    records: u64,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            show_skips: false,
            records: 0,
            error: None,
        }
    }

    /// Log skipped frames at info level instead of debug
    pub fn show_skips(mut self, show: bool) -> Self {
        self.show_skips = show;
        self
    }

    /// Number of frames written so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// First write error, if output failed
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, frame: &DecodedFrame<'_>) -> io::Result<()> {
        let out = &mut self.out;

        writeln!(out, "{} bytes captured", frame.captured_total)?;
        writeln!(out)?;

        writeln!(out, "Ethernet Address")?;
        writeln!(out, "src MAC : {}", frame.ethernet.source)?;
        writeln!(out, "dest MAC : {}", frame.ethernet.destination)?;
        writeln!(out)?;

        if frame.ip.checksum_valid() {
            writeln!(out, "IP Address")?;
        } else {
            writeln!(out, "IP Address (bad checksum)")?;
        }
        writeln!(out, "src IP : {}", frame.ip.source)?;
        writeln!(out, "dest IP : {}", frame.ip.destination)?;
        writeln!(out)?;

        writeln!(out, "PORT Address")?;
        writeln!(out, "src PORT : {}", frame.tcp.src_port)?;
        writeln!(out, "dest PORT : {}", frame.tcp.dst_port)?;

        if frame.has_payload() {
            for byte in frame.preview() {
                write!(out, "{:02x} ", byte)?;
            }
            write!(out, "\n\n\n")?;
        } else {
            write!(out, "No data\n\n\n")?;
        }

        out.flush()
    }
}

impl<W: Write> RecordSink for ConsoleReport<W> {
    fn record(&mut self, frame: &DecodedFrame<'_>) {
        if self.error.is_some() {
            return;
        }
        match self.write_frame(frame) {
            Ok(()) => self.records += 1,
            Err(e) => {
                warn!("Failed to write frame report: {}", e);
                self.error = Some(e);
            }
        }
    }

    fn skip(&mut self, reason: SkipReason) {
        if self.show_skips {
            info!("Skipped frame: {}", reason);
        }
    }

    fn is_closed(&self) -> bool {
        self.error.is_some()
    }

    fn finish(&mut self) {
        if let Err(e) = self.out.flush() {
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sniffer_capture::{pipeline, StatsAccumulator};
    use sniffer_core::{MemorySource, RawFrame};
    use sniffer_packet::{FrameBuilder, FrameDecoder, MacAddress};
    use std::cell::RefCell;
    use std::io::BufWriter;
    use std::net::Ipv4Addr;
    use std::rc::Rc;

    fn frame(payload: &[u8]) -> Vec<u8> {
        FrameBuilder::new()
            .ethernet(
                MacAddress([0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E]),
                MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            )
            .ipv4(Ipv4Addr::new(192, 168, 0, 10), Ipv4Addr::new(93, 184, 216, 34))
            .tcp(51234, 443)
            .payload(payload.to_vec())
            .build()
            .unwrap()
    }

    fn render(data: &[u8]) -> String {
        let mut report = ConsoleReport::new(Vec::new());
        let decoded = FrameDecoder::new().decode_bytes(data).unwrap();
        report.record(&decoded);
        report.finish();
        assert!(report.take_error().is_none());
        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn test_report_with_payload() {
        let data = frame(&[0x16, 0x03, 0x01]);
        let text = render(&data);

        let expected = format!(
            "{} bytes captured\n\n\
             Ethernet Address\n\
             src MAC : 00:1a:2b:3c:4d:5e\n\
             dest MAC : aa:bb:cc:dd:ee:ff\n\n\
             IP Address\n\
             src IP : 192.168.0.10\n\
             dest IP : 93.184.216.34\n\n\
             PORT Address\n\
             src PORT : 51234\n\
             dest PORT : 443\n\
             16 03 01 \n\n\n",
            data.len()
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_report_without_payload() {
        let text = render(&frame(&[]));
        assert!(text.starts_with("54 bytes captured\n\n"));
        assert!(text.ends_with("dest PORT : 443\nNo data\n\n\n"));
    }

    #[test]
    fn test_report_preview_is_capped() {
        let text = render(&frame(&[0xAB; 64]));
        let line = text
            .lines()
            .find(|line| line.starts_with("ab "))
            .unwrap();
        assert_eq!(line.split_whitespace().count(), 20);
    }

    #[test]
    fn test_report_flags_bad_ip_checksum() {
        let mut data = frame(b"x");
        data[14 + 10] ^= 0xFF;
        let text = render(&data);
        assert!(text.contains("IP Address (bad checksum)\n"));
    }

    #[test]
    fn test_report_ignores_skips() {
        let mut report = ConsoleReport::new(Vec::new()).show_skips(true);
        let raw = [0u8; 6];
        if let Err(reason) = FrameDecoder::new().decode(&RawFrame::from_bytes(&raw)) {
            report.skip(reason);
        }
        assert_eq!(report.records(), 0);
        assert!(report.into_inner().is_empty());
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_report_keeps_write_error() {
        let data = frame(b"abc");
        let decoded = FrameDecoder::new().decode_bytes(&data).unwrap();

        let mut report = ConsoleReport::new(BrokenPipe);
        report.record(&decoded);
        report.record(&decoded);

        assert_eq!(report.records(), 0);
        let err = report.take_error().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_broken_output_ends_read_loop() {
        let mut source = MemorySource::from_buffers((0..1000).map(|_| frame(b"abc")));
        let mut report = ConsoleReport::new(BrokenPipe);
        let stats = StatsAccumulator::new();

        let decoded =
            pipeline::run(&mut source, &FrameDecoder::new(), &mut report, &stats, None).unwrap();

        assert_eq!(decoded, 1);
        assert!(report.is_closed());
        assert_eq!(source.remaining(), 999);
    }

    /// Writer whose contents stay readable while a `BufWriter` owns it
    #[derive(Clone, Default)]
    struct SharedOutput(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_each_record_reaches_output_immediately() {
        let shared = SharedOutput::default();
        let mut report = ConsoleReport::new(BufWriter::new(shared.clone()));

        let data = frame(b"hi");
        let decoded = FrameDecoder::new().decode_bytes(&data).unwrap();
        report.record(&decoded);

        let written = String::from_utf8(shared.0.borrow().clone()).unwrap();
        assert!(written.starts_with(&format!("{} bytes captured\n", data.len())));
        assert!(written.ends_with("68 69 \n\n\n"));
        assert!(!report.is_closed());
    }
}
