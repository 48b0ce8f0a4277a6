//! pmtop — watch Apple Silicon breathe, one powermetrics round at a time.

mod tui;

use std::path::PathBuf;

use clap::Parser;
use log::debug;

use pmtop_core::{DEFAULT_INTERVAL_MS, SampleStream, Sampler};

#[derive(Parser, Debug)]
#[command(name = "pmtop")]
#[command(about = "pmtop — per-core clocks, activity, and power rails, live")]
#[command(version = pmtop_core::VERSION)]
struct Cli {
    /// Sampling interval in milliseconds passed to powermetrics
    #[arg(short = 'i', long = "interval", value_name = "MS", default_value_t = DEFAULT_INTERVAL_MS)]
    interval: u64,

    /// Hide the E/P cluster rows
    #[arg(long)]
    no_clusters: bool,

    /// Replay a captured powermetrics transcript instead of sampling live
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,
}

/// Rewrite a bare trailing `-i` to carry the default interval. The upstream
/// tool accepts `-i`, `-i500`, and `-i 500`; clap expresses the last two but
/// treats a value-less `-i` as an error, so it is patched before parsing.
fn normalize(mut args: Vec<String>) -> Vec<String> {
    if let Some(last) = args.last_mut() {
        if last == "-i" {
            *last = format!("-i{DEFAULT_INTERVAL_MS}");
        }
    }
    args
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse_from(normalize(std::env::args().collect())) {
        Ok(cli) => cli,
        Err(e) => {
            // Usage, --help, and --version all land here; none signal failure.
            let _ = e.print();
            std::process::exit(0);
        }
    };

    let stream = match &cli.replay {
        Some(path) => SampleStream::replay(path),
        None => {
            debug!("sampling live every {} ms", cli.interval);
            Sampler::new(cli.interval).spawn()
        }
    };
    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("Can't open powermetrics stream: {e}");
            std::process::exit(1);
        }
    };

    let mut app = tui::app::App::new(stream, !cli.no_clusters, cli.replay.is_some());
    if let Err(e) = app.run() {
        eprintln!("TUI error: {e}");
        std::process::exit(1);
    }
}
