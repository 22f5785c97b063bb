// mysqldump2csv: stream a MySQL dump into one CSV file per table.
// CREATE TABLE blocks give each file its typed header; rows come from the
// extended INSERT statements that follow.

mod converter;
mod cursor;
mod error;
mod logger;
mod parser;
mod progress;
mod signal;
mod sink;

use clap::Parser;
use converter::{ConversionSummary, ConvertOptions, Converter};
use cursor::LineCursor;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, error};

// Command-line flags and positional arguments.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Dump files to read, in order. Reads stdin when none are given; "-" also means stdin.
    inputs: Vec<String>,

    /// Directory the per-table CSV files are written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Enable debug logging (disables progress bars).
    #[arg(long)]
    debug: bool,

    /// Never show a progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Write the run summary as JSON to this file.
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init(args.debug);
    let stop = signal::watch_interrupt();

    match run(&args, stop) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(
    args: &Args,
    stop: Arc<AtomicBool>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    debug!("main: inputs {:?}", args.inputs);
    debug!("main: output directory {}", args.output_dir.display());

    // Progress bars are disabled in debug mode to avoid mangled output.
    let progress = progress::ProgressManager::new(!args.debug && !args.no_progress);
    let bar = progress.new_input_bar(&args.inputs, "Converting");

    let mut cursor = LineCursor::from_paths(&args.inputs).with_progress(bar);
    let mut converter = Converter::new(ConvertOptions {
        output_dir: args.output_dir.clone(),
    })
    .with_stop_flag(stop);
    let summary = converter.run(&mut cursor)?;

    if let Some(path) = args.summary_json.as_ref() {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json)?;
        debug!("main: summary written to {}", path.display());
    }

    print_summary(&summary)?;
    Ok(())
}

fn print_summary(summary: &ConversionSummary) -> io::Result<()> {
    let sep = "=".repeat(60);
    let mut stderr = io::stderr().lock();
    writeln!(stderr, "\n{}\nSUMMARY\n{}", sep, sep)?;
    for table in &summary.tables {
        writeln!(stderr, "{:<40} {:>12} rows", table.path, table.rows)?;
    }
    writeln!(stderr, "Tables:      {}", summary.tables.len())?;
    writeln!(stderr, "Rows:        {}", summary.rows)?;
    if summary.dropped_rows > 0 {
        writeln!(stderr, "Dropped:     {}", summary.dropped_rows)?;
    }
    writeln!(stderr, "Lines read:  {}", summary.lines_read)?;
    writeln!(stderr, "Elapsed:     {} ms", summary.elapsed_ms)?;
    if summary.interrupted {
        writeln!(stderr, "Interrupted before the end of input")?;
    }
    writeln!(stderr, "{}", sep)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_inputs_and_flags() {
        let args = Args::parse_from([
            "mysqldump2csv",
            "--output-dir",
            "out",
            "--debug",
            "a.sql",
            "-",
        ]);
        assert_eq!(args.inputs, vec!["a.sql", "-"]);
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert!(args.debug);
        assert!(!args.no_progress);
        assert!(args.summary_json.is_none());

        let args = Args::parse_from(["mysqldump2csv"]);
        assert!(args.inputs.is_empty());
        assert_eq!(args.output_dir, PathBuf::from("."));
    }
}
