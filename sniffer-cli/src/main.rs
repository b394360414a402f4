use sniffer_capture::{
    default_interface, list_interfaces, pipeline, CaptureOrigin, PacketCapture, StatsAccumulator,
};
use sniffer_cli::{Cli, ConsoleReport};
use sniffer_core::{Error, Result};
use sniffer_packet::FrameDecoder;
use std::io::{self, BufWriter};
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Logs go to stderr; stdout carries only frame reports
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(io::stderr)
        .init();

    match execute(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("sniffer: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: &Cli) -> Result<()> {
    if cli.list_interfaces {
        for iface in list_interfaces()? {
            println!("{}", iface);
        }
        return Ok(());
    }

    let mut capture = open_capture(cli)?;

    if let Some(filter) = cli.bpf_filter() {
        capture.set_filter(&filter)?;
    }

    if let Some(limit) = cli.duration() {
        if matches!(capture.origin(), CaptureOrigin::Interface(_)) {
            capture.stop_handle().stop_after(limit);
        }
    }

    let decoder = FrameDecoder::with_config(cli.decoder_config());
    let stats = StatsAccumulator::new();
    let stdout = io::stdout();
    let mut report = ConsoleReport::new(BufWriter::new(stdout.lock())).show_skips(cli.show_skips);

    let decoded = pipeline::run(&mut capture, &decoder, &mut report, &stats, cli.count)?;
    info!(
        "Decoded {} of {} frames from {}",
        decoded,
        stats.frames_seen(),
        capture.origin().name()
    );

    if let Some(e) = report.take_error() {
        // A closed pipe (e.g. `| head`) is a normal way to stop reading
        if e.kind() != io::ErrorKind::BrokenPipe {
            return Err(Error::Io(e));
        }
    }

    if cli.stats {
        let summary = capture.annotate_stats(stats.snapshot());
        eprintln!("{}", summary);
    }

    Ok(())
}

fn open_capture(cli: &Cli) -> Result<PacketCapture> {
    if let Some(path) = &cli.read {
        return PacketCapture::open_file(path);
    }

    let interface = match &cli.interface {
        Some(name) => name.clone(),
        None => {
            let iface = default_interface()?;
            info!("No interface given, using {}", iface.name);
            iface.name
        }
    };

    PacketCapture::open(&interface, &cli.capture_config())
}
