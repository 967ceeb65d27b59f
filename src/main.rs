use anyhow::{Context, Result};
use clap::Parser;
use glob::glob;
use origin_stamp::{
    BatchStamper, DirectorySink, InputFile, IntakeMode, ProcessingState, ProgressObserver,
    StampConfig, StampError, StampParams,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Stamp "Made In China" at the bottom center of every page
#[derive(Parser, Debug)]
#[command(name = "origin_stamp", about = "Stamp \"Made In China\" onto every page of PDF files")]
struct Args {
    /// PDF files or glob patterns, processed in the order given
    #[arg(required = true)]
    inputs: Vec<String>,
    /// Directory that receives <name>-processed.pdf files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
    /// single: only the first input is used and must be a PDF
    #[arg(long, value_enum, default_value_t = IntakeMode::Batch)]
    mode: IntakeMode,
    /// Font size in points
    #[arg(long, default_value_t = origin_stamp::stamp_params::DEFAULT_FONT_SIZE)]
    font_size: f64,
    /// Baseline height above the bottom edge, in multiples of the font size
    #[arg(long, default_value_t = origin_stamp::stamp_params::DEFAULT_OFFSET_FACTOR)]
    offset_factor: f64,
    /// Pause at 100% before going idle (milliseconds)
    #[arg(long, default_value_t = 1000)]
    reset_delay_ms: u64,
    /// Leave content streams uncompressed
    #[arg(long, default_value_t = false)]
    no_compress: bool,
    /// Print the batch report as JSON on stdout
    #[arg(long, default_value_t = false)]
    json: bool,
    /// No progress lines
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

impl Args {
    fn config(&self) -> StampConfig {
        StampConfig {
            params: StampParams {
                font_size: self.font_size,
                offset_factor: self.offset_factor,
            },
            mode: self.mode,
            reset_delay: Duration::from_millis(self.reset_delay_ms),
            compress: !self.no_compress,
        }
    }
}

/// Expand each pattern in order; a pattern with no match stays a literal path
/// so the file still shows up (and fails) under its own name.
fn collect_inputs(patterns: &[String]) -> Result<Vec<InputFile>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let mut paths: Vec<PathBuf> = glob(pattern)
            .with_context(|| format!("bad glob pattern: {pattern}"))?
            .filter_map(|e| e.ok())
            .collect();
        paths.sort();
        if paths.is_empty() {
            paths.push(PathBuf::from(pattern));
        }
        files.extend(paths.into_iter().map(InputFile::from_path));
    }
    Ok(files)
}

/// Progress bar stand-in: one status line per update on stderr.
struct TerminalObserver {
    quiet: bool,
    batch: bool,
}

impl ProgressObserver for TerminalObserver {
    fn on_file_start(&mut self, name: &str, remaining: usize) {
        if self.quiet {
            return;
        }
        if self.batch {
            eprintln!("Processing {name} ({remaining} remaining in queue)");
        } else {
            eprintln!("Processing {name}");
        }
    }

    fn on_progress(&mut self, state: &ProcessingState) {
        if !self.quiet {
            eprintln!("  [{:>3}%] {}", state.progress(), state.current_file_name());
        }
    }

    fn on_file_complete(&mut self, _name: &str, artifact_name: &str) {
        if !self.quiet {
            eprintln!("  -> {artifact_name}");
        }
    }

    fn on_alert(&mut self, error: &StampError) {
        eprintln!("error: {error}");
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let files = collect_inputs(&args.inputs)?;
    let mut sink = DirectorySink::new(&args.out_dir).map_err(|err| {
        anyhow::anyhow!("cannot use output directory {}: {err}", args.out_dir.display())
    })?;
    let mut observer = TerminalObserver {
        quiet: args.quiet,
        batch: args.mode == IntakeMode::Batch,
    };

    let mut stamper = BatchStamper::new(args.config());
    let report = stamper.submit(files, &mut sink, &mut observer);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !args.quiet {
        eprintln!(
            "Done. {} saved, {} failed.",
            report.delivered.len(),
            report.failures.len()
        );
    }

    Ok(if report.is_clean() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
