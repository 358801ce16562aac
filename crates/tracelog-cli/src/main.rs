//! tracelog - Replay binary event-trace logs
//!
//! This tool decodes trace files written by the tracelog instrumentation
//! and prints each recorded event with its arguments.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracelog_core::{open_file_with_config, render_record, DecoderConfig, Error as DecodeError};
use tracing::{debug, error, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Replay binary event-trace logs
#[derive(Parser, Debug)]
#[command(name = "tracelog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Print every decoded record
    #[arg(short, long)]
    print: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Abort on the first malformed record instead of skipping it
    #[arg(long)]
    strict: bool,

    /// Maximum number of records to decode per file (0 = unlimited)
    #[arg(long, default_value = "0")]
    max_records: u64,

    /// File extension of trace files when replaying a directory
    #[arg(long, default_value = "dat")]
    extension: String,

    /// Print a summary with record count, decode throughput and output digest
    #[arg(long)]
    stats: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct InputMode {
    /// Path to a single trace file to replay
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Path to a directory of trace files to replay
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

/// Totals across every replayed file
struct ReplaySummary {
    files: usize,
    records: u64,
    skipped: u64,
    bytes: u64,
    /// Time spent decoding, excluding rendering and output
    elapsed: Duration,
    /// Hash of the rendered output, for comparing replays
    digest: blake3::Hasher,
}

impl ReplaySummary {
    fn new() -> Self {
        Self {
            files: 0,
            records: 0,
            skipped: 0,
            bytes: 0,
            elapsed: Duration::ZERO,
            digest: blake3::Hasher::new(),
        }
    }

    /// Events per second over the decode time alone
    fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.records as f64 / secs
        }
    }

    fn print_summary(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "Trace files: {}", self.files)?;
        writeln!(out, "Bytes read: {}", self.bytes)?;
        writeln!(out, "Events decoded: {}", self.records)?;
        writeln!(out, "Events skipped: {}", self.skipped)?;
        writeln!(out, "Decode time: {:.3} s", self.elapsed.as_secs_f64())?;
        writeln!(out, "Rate: {:.3} events/s", self.rate())?;
        writeln!(out, "Output digest: {}", self.digest.finalize().to_hex())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut summary = ReplaySummary::new();

    // Dispatch based on input mode
    if let Some(ref file) = cli.input.file {
        process_single_file(&cli, file, &mut summary, &mut out)?;
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory, &mut summary, &mut out)?;
    } else {
        bail!("Either --file or --directory must be specified")
    }

    if cli.stats {
        summary.print_summary(&mut out)?;
    }
    out.flush()?;

    Ok(())
}

/// Replay a single trace file
fn process_single_file(
    cli: &Cli,
    file: &Path,
    summary: &mut ReplaySummary,
    out: &mut impl Write,
) -> Result<()> {
    if !file.exists() {
        bail!("Input file does not exist: {}", file.display());
    }
    if !file.is_file() {
        bail!("Input path is not a file: {}", file.display());
    }

    replay_file(cli, file, summary, out)
}

/// Replay every trace file below a directory
fn process_directory(
    cli: &Cli,
    directory: &Path,
    summary: &mut ReplaySummary,
    out: &mut impl Write,
) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut entries: Vec<PathBuf> = WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.is_file() && is_trace_file(path, &cli.extension))
        .collect();

    // Deterministic order keeps the output digest stable
    entries.sort();

    let mut failed = 0;
    for path in &entries {
        debug!("Replaying trace: {}", path.display());
        if let Err(e) = replay_file(cli, path, summary, out) {
            // Log error but continue with other files
            warn!("Error replaying {}: {:#}", path.display(), e);
            failed += 1;
        }
    }

    info!("Replayed {} trace files", entries.len());
    if failed > 0 {
        bail!("{} trace files failed to decode", failed);
    }
    Ok(())
}

/// Returns true for visible files carrying the trace extension
fn is_trace_file(path: &Path, extension: &str) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true);
    if hidden {
        return false;
    }

    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Decode one trace file, printing records as requested
fn replay_file(
    cli: &Cli,
    path: &Path,
    summary: &mut ReplaySummary,
    out: &mut impl Write,
) -> Result<()> {
    trace!("Opening {}", path.display());
    let config = DecoderConfig::new()
        .max_records(cli.max_records)
        .skip_malformed(!cli.strict);
    let mut decoder = open_file_with_config(path, config)
        .with_context(|| format!("Failed to open trace file: {}", path.display()))?;

    let render = cli.print || cli.stats;
    let mut decode_time = Duration::ZERO;

    let result = loop {
        let started = Instant::now();
        let next = decoder.next_record();
        decode_time += started.elapsed();

        match next {
            Ok(Some(record)) => {
                if !render {
                    continue;
                }
                let line = render_record(&record);
                summary.digest.update(line.as_bytes());
                summary.digest.update(b"\n");
                if cli.print {
                    writeln!(out, "{}", line).context("Failed to write output")?;
                }
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    let stats = decoder.stats();
    summary.files += 1;
    summary.records += stats.records;
    summary.skipped += stats.skipped;
    summary.bytes += stats.bytes;
    summary.elapsed += decode_time;

    debug!(
        "{}: {} records, {} skipped, {} bytes",
        path.display(),
        stats.records,
        stats.skipped,
        stats.bytes
    );

    result.map_err(|e: DecodeError| {
        error!("Replay of {} stopped: {}", path.display(), e);
        anyhow::Error::new(e).context(format!("Failed to decode trace: {}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tracelog_core::{Field, TraceProducer, TraceWriter};

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("tracelog").chain(args.iter().copied()))
    }

    fn write_trace(path: &Path, count: i32) {
        let mut writer = TraceWriter::create(path).unwrap();
        for i in 0..count {
            let name = format!("event{}", i);
            writer
                .emit(i * 10, 1, &[Field::FixedInt16(i as i16), Field::cstring(name)])
                .unwrap();
        }
        writer.flush().unwrap();
    }

    #[test]
    fn test_replay_prints_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trace.dat");
        write_trace(&path, 2);

        let cli = cli(&["-p", "--file", path.to_str().unwrap()]);
        let mut summary = ReplaySummary::new();
        let mut out = Vec::new();
        process_single_file(&cli, &path, &mut summary, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "timestamp 0 id 1 args=(short=0 string=\"event0\")\n\
             timestamp 10 id 1 args=(short=1 string=\"event1\")\n"
        );
        assert_eq!(summary.records, 2);
        assert_eq!(summary.files, 1);
    }

    #[test]
    fn test_replay_without_print_is_silent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trace.dat");
        write_trace(&path, 3);

        let cli = cli(&["--file", path.to_str().unwrap()]);
        let mut summary = ReplaySummary::new();
        let mut out = Vec::new();
        replay_file(&cli, &path, &mut summary, &mut out).unwrap();

        assert!(out.is_empty());
        assert_eq!(summary.records, 3);
    }

    #[test]
    fn test_malformed_record_skipped_unless_strict() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.dat");
        let mut data = vec![0, 0, 0, 1, 0, 1, 3, 0x00, 0x01, b'x'];
        data.extend_from_slice(&[0, 0, 0, 2, 0, 1, 3, 0x00, 0x02, 0x00]);
        std::fs::write(&path, &data).unwrap();

        let lenient = cli(&["--file", path.to_str().unwrap()]);
        let mut summary = ReplaySummary::new();
        replay_file(&lenient, &path, &mut summary, &mut Vec::new()).unwrap();
        assert_eq!(summary.records, 1);
        assert_eq!(summary.skipped, 1);

        let strict = cli(&["--strict", "--file", path.to_str().unwrap()]);
        let mut summary = ReplaySummary::new();
        assert!(replay_file(&strict, &path, &mut summary, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_truncated_trace_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("cut.dat");
        std::fs::write(&path, [0, 0, 0, 1, 0]).unwrap();

        let cli = cli(&["--file", path.to_str().unwrap()]);
        let err = replay_file(&cli, &path, &mut ReplaySummary::new(), &mut Vec::new()).unwrap_err();
        assert!(format!("{:#}", err).contains("truncated record"));
    }

    #[test]
    fn test_directory_replay_is_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        write_trace(&temp_dir.path().join("b.dat"), 2);
        write_trace(&temp_dir.path().join("a.dat"), 1);
        std::fs::write(temp_dir.path().join("notes.txt"), "not a trace").unwrap();

        let dir = temp_dir.path().to_str().unwrap();
        let run = || {
            let cli = cli(&["--stats", "--directory", dir]);
            let mut summary = ReplaySummary::new();
            process_directory(&cli, temp_dir.path(), &mut summary, &mut Vec::new()).unwrap();
            summary
        };

        let first = run();
        let second = run();
        assert_eq!(first.files, 2);
        assert_eq!(first.records, 3);
        assert_eq!(first.digest.finalize(), second.digest.finalize());
    }

    #[test]
    fn test_directory_with_truncated_trace_fails() {
        let temp_dir = TempDir::new().unwrap();
        write_trace(&temp_dir.path().join("good.dat"), 2);
        std::fs::write(temp_dir.path().join("cut.dat"), [0, 0, 0, 1, 0]).unwrap();

        let cli = cli(&["--directory", temp_dir.path().to_str().unwrap()]);
        let mut summary = ReplaySummary::new();
        let err = process_directory(&cli, temp_dir.path(), &mut summary, &mut Vec::new())
            .unwrap_err();

        assert!(err.to_string().contains("1 trace files failed to decode"));
        // The healthy file is still replayed
        assert_eq!(summary.files, 2);
        assert_eq!(summary.records, 2);
    }

    #[test]
    fn test_strict_malformed_record_fails_directory() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("bad.dat"),
            [0, 0, 0, 1, 0, 1, 3, 0x00, 0x01, b'x'],
        )
        .unwrap();

        let dir = temp_dir.path().to_str().unwrap();
        let lenient = cli(&["--directory", dir]);
        let mut summary = ReplaySummary::new();
        process_directory(&lenient, temp_dir.path(), &mut summary, &mut Vec::new()).unwrap();
        assert_eq!(summary.skipped, 1);

        let strict = cli(&["--strict", "--directory", dir]);
        let mut summary = ReplaySummary::new();
        assert!(process_directory(&strict, temp_dir.path(), &mut summary, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_decode_time_excludes_output() {
        struct SlowSink;

        impl Write for SlowSink {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                std::thread::sleep(Duration::from_millis(20));
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trace.dat");
        write_trace(&path, 5);

        let cli = cli(&["-p", "--stats", "--file", path.to_str().unwrap()]);
        let mut summary = ReplaySummary::new();
        let started = Instant::now();
        replay_file(&cli, &path, &mut summary, &mut SlowSink).unwrap();
        let wall = started.elapsed();

        // Five slow writes take at least 100ms of wall time
        assert!(wall >= Duration::from_millis(100));
        assert!(summary.elapsed < Duration::from_millis(100));
        assert_eq!(summary.records, 5);
    }

    #[test]
    fn test_is_trace_file() {
        assert!(is_trace_file(Path::new("/tmp/trace.dat"), "dat"));
        assert!(is_trace_file(Path::new("/tmp/trace.DAT"), "dat"));
        assert!(!is_trace_file(Path::new("/tmp/.trace.dat"), "dat"));
        assert!(!is_trace_file(Path::new("/tmp/trace.txt"), "dat"));
        assert!(!is_trace_file(Path::new("/tmp/trace"), "dat"));
    }

    #[test]
    fn test_summary_output() {
        let mut summary = ReplaySummary::new();
        summary.records = 10;
        summary.elapsed = Duration::from_secs(2);

        let mut out = Vec::new();
        summary.print_summary(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Events decoded: 10"));
        assert!(text.contains("Rate: 5.000 events/s"));
        assert!(text.contains("Output digest: "));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
