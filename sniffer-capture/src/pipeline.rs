//! The read loop: pull a frame, decode it, hand the outcome to a sink

use sniffer_core::{FrameSource, Result};
use sniffer_packet::{FrameDecoder, RecordSink};
use tracing::{debug, trace};

use crate::stats::StatsAccumulator;

/// Drive `source` until it is exhausted, `limit` frames have decoded, or the
/// sink closes.
///
/// Every frame is decoded independently; a skipped frame never ends the
/// loop. An error from the source ends it after the sink is finished.
/// Returns the number of frames decoded during this call.
pub fn run<S, K>(
    source: &mut S,
    decoder: &FrameDecoder,
    sink: &mut K,
    stats: &StatsAccumulator,
    limit: Option<u64>,
) -> Result<u64>
where
    S: FrameSource + ?Sized,
    K: RecordSink + ?Sized,
{
    let mut decoded = 0u64;

    loop {
        if limit.is_some_and(|max| decoded >= max) {
            debug!("Decoded frame limit of {} reached", decoded);
            break;
        }
        if sink.is_closed() {
            debug!("Record sink closed, ending read loop");
            break;
        }

        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                sink.finish();
                return Err(e);
            }
        };

        stats.record_frame(&frame);
        trace!(
            "Frame: {} bytes captured, {} on the wire",
            frame.caplen(),
            frame.wire_len()
        );

        match decoder.decode(&frame) {
            Ok(record) => {
                stats.record_decoded();
                decoded += 1;
                sink.record(&record);
            }
            Err(reason) => {
                stats.record_skip(reason);
                debug!("Skipped frame of {} bytes: {}", frame.caplen(), reason);
                sink.skip(reason);
            }
        }
    }

    sink.finish();
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sniffer_core::{Error, MemorySource, RawFrame};
    use sniffer_packet::{CountingSink, FrameBuilder, IpProtocol, MacAddress, SkipReason};
    use std::net::Ipv4Addr;

    fn tcp_frame(payload: &[u8]) -> Vec<u8> {
        FrameBuilder::new()
            .ethernet(MacAddress([2, 0, 0, 0, 0, 1]), MacAddress([2, 0, 0, 0, 0, 2]))
            .ipv4(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2))
            .tcp(40000, 80)
            .payload(payload.to_vec())
            .build()
            .unwrap()
    }

    fn udp_frame() -> Vec<u8> {
        FrameBuilder::new()
            .ethernet(MacAddress([2, 0, 0, 0, 0, 1]), MacAddress([2, 0, 0, 0, 0, 2]))
            .ipv4(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2))
            .ip_protocol(IpProtocol::UDP)
            .payload(vec![0u8; 8])
            .build()
            .unwrap()
    }

    #[test]
    fn test_run_counts_every_outcome() {
        let mut source = MemorySource::from_buffers(vec![
            tcp_frame(b"GET / HTTP/1.1\r\n"),
            vec![0u8; 10],
            udp_frame(),
            tcp_frame(b""),
        ]);
        let mut sink = CountingSink::new();
        let stats = StatsAccumulator::new();

        let decoded = run(&mut source, &FrameDecoder::new(), &mut sink, &stats, None).unwrap();

        assert_eq!(decoded, 2);
        assert_eq!(sink.decoded, 2);
        assert_eq!(sink.skipped_for(SkipReason::TooShortForEthernet), 1);
        assert_eq!(sink.skipped_for(SkipReason::NotTcp), 1);
        assert!(sink.finished);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_seen, 4);
        assert_eq!(snapshot.decoded, 2);
        assert_eq!(snapshot.total_skipped(), 2);
    }

    #[test]
    fn test_run_stops_at_limit() {
        let mut source = MemorySource::from_buffers(vec![
            tcp_frame(b"a"),
            vec![0u8; 4],
            tcp_frame(b"b"),
            tcp_frame(b"c"),
        ]);
        let mut sink = CountingSink::new();
        let stats = StatsAccumulator::new();

        let decoded = run(&mut source, &FrameDecoder::new(), &mut sink, &stats, Some(2)).unwrap();

        assert_eq!(decoded, 2);
        assert_eq!(sink.total_skipped(), 1);
        assert_eq!(source.remaining(), 1);
    }

    #[test]
    fn test_run_zero_limit_reads_nothing() {
        let mut source = MemorySource::from_buffers(vec![tcp_frame(b"x")]);
        let mut sink = CountingSink::new();
        let stats = StatsAccumulator::new();

        let decoded = run(&mut source, &FrameDecoder::new(), &mut sink, &stats, Some(0)).unwrap();

        assert_eq!(decoded, 0);
        assert_eq!(source.remaining(), 1);
        assert_eq!(stats.frames_seen(), 0);
    }

    /// Accepts one record and then reports itself closed
    #[derive(Default)]
    struct OneShotSink {
        records: u64,
        finished: bool,
    }

    impl RecordSink for OneShotSink {
        fn record(&mut self, _frame: &sniffer_packet::DecodedFrame<'_>) {
            self.records += 1;
        }

        fn skip(&mut self, _reason: SkipReason) {}

        fn is_closed(&self) -> bool {
            self.records > 0
        }

        fn finish(&mut self) {
            self.finished = true;
        }
    }

    #[test]
    fn test_run_stops_when_sink_closes() {
        let mut source = MemorySource::from_buffers((0..1000).map(|_| tcp_frame(b"data")));
        let mut sink = OneShotSink::default();
        let stats = StatsAccumulator::new();

        let decoded = run(&mut source, &FrameDecoder::new(), &mut sink, &stats, None).unwrap();

        assert_eq!(decoded, 1);
        assert_eq!(sink.records, 1);
        assert!(sink.finished);
        assert_eq!(source.remaining(), 999);
        assert_eq!(stats.frames_seen(), 1);
    }

    struct FailingSource {
        frame: Vec<u8>,
        served: bool,
    }

    impl FrameSource for FailingSource {
        fn next_frame(&mut self) -> Result<Option<RawFrame<'_>>> {
            if self.served {
                return Err(Error::capture("device went away"));
            }
            self.served = true;
            Ok(Some(RawFrame::from_bytes(&self.frame)))
        }
    }

    #[test]
    fn test_run_propagates_source_errors() {
        let mut source = FailingSource {
            frame: tcp_frame(b"hello"),
            served: false,
        };
        let mut sink = CountingSink::new();
        let stats = StatsAccumulator::new();

        let result = run(&mut source, &FrameDecoder::new(), &mut sink, &stats, None);

        assert!(matches!(result, Err(Error::Capture(_))));
        assert_eq!(sink.decoded, 1);
        assert!(sink.finished);
    }
}
