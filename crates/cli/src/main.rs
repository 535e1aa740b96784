use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use hotboard_core::pipeline::{self, CaptureConfig, CaptureSource};
use hotboard_core::store::{self, SnapshotStore};

#[derive(Parser)]
#[command(name = "hotboard", about = "Trending-topics snapshot collector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CaptureOpts {
    /// Target board URL
    #[arg(long, default_value = pipeline::DEFAULT_TARGET_URL)]
    url: String,

    /// Ledger file to append snapshots to
    #[arg(long, default_value = store::DEFAULT_LEDGER_NAME)]
    ledger: PathBuf,

    /// Skip the browser path and fetch over plain HTTP only
    #[arg(long)]
    no_browser: bool,

    /// Directory for fetched-page debug artifacts (default: working directory)
    #[arg(long)]
    debug_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one extraction and append the snapshot to the ledger
    Capture {
        #[command(flatten)]
        opts: CaptureOpts,
    },
    /// Capture on a fixed interval until interrupted
    Watch {
        #[command(flatten)]
        opts: CaptureOpts,

        /// Minutes between captures
        #[arg(long, default_value_t = 30)]
        interval_mins: u64,
    },
    /// Read-only ledger report: row counts, column check, newest rows
    Inspect {
        /// Ledger file; defaults to discovery in the current directory
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Capture { opts } => {
            if !run_capture(&opts) {
                std::process::exit(1);
            }
        }
        Commands::Watch {
            opts,
            interval_mins,
        } => run_watch(&opts, interval_mins),
        Commands::Inspect { ledger } => {
            if !run_inspect(ledger.as_deref()) {
                std::process::exit(1);
            }
        }
    }
}

fn build_config(opts: &CaptureOpts) -> CaptureConfig {
    let mut config = CaptureConfig {
        url: opts.url.clone(),
        use_browser: !opts.no_browser,
        ..Default::default()
    };
    // Artifact capture stays on by default; the flag only relocates it.
    if let Some(dir) = &opts.debug_dir {
        config.http.debug_dir = Some(dir.clone());
        config.browser.debug_dir = Some(dir.clone());
    }
    config
}

/// One run. True unless both the primary ledger and the backup failed.
fn run_capture(opts: &CaptureOpts) -> bool {
    let started = Local::now().format("%Y-%m-%d %H:%M:%S");
    println!("capture started at {}", started);

    let config = build_config(opts);
    let report = pipeline::capture(&config);

    let source = match report.source {
        CaptureSource::Browser => "browser",
        CaptureSource::Http => "http",
        CaptureSource::Synthetic => "synthetic (degraded)",
    };
    println!("{} items via {}", report.snapshot.items.len(), source);
    if let Some(strategy) = report.strategy {
        println!("strategy: {}", strategy);
    }
    for item in report.snapshot.items.iter().take(3) {
        println!("  {}. {} [{}]", item.rank, item.title, item.hot_index);
    }

    let ledger = SnapshotStore::new(&opts.ledger);
    match ledger.append(&report.snapshot) {
        Ok(outcome) => {
            println!("snapshot appended to {}", outcome.path().display());
            true
        }
        Err(e) => {
            eprintln!("error: snapshot lost, ledger and backup both failed: {}", e);
            false
        }
    }
}

fn run_watch(opts: &CaptureOpts, interval_mins: u64) {
    let interval = Duration::from_secs(interval_mins.max(1) * 60);
    let tick = Duration::from_secs(10);
    println!("watching every {} minutes, Ctrl-C stops", interval_mins.max(1));

    loop {
        let run_started = Instant::now();
        if !run_capture(opts) {
            log_watch_error("capture run failed: ledger and backup writes both failed");
        }

        // Fixed-interval schedule with a coarse tick, one job in flight.
        while run_started.elapsed() < interval {
            std::thread::sleep(tick);
        }
    }
}

fn log_watch_error(message: &str) {
    let name = format!("watch_error_{}.log", Local::now().format("%Y%m%d"));
    let line = format!(
        "[{}] {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        message
    );
    let result = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&name)
        .and_then(|mut f| f.write_all(line.as_bytes()));
    match result {
        Ok(()) => eprintln!("error recorded in {}", name),
        Err(e) => eprintln!("could not write error log {}: {}", name, e),
    }
}

fn run_inspect(ledger: Option<&Path>) -> bool {
    let path = match ledger {
        Some(path) => path.to_path_buf(),
        None => match store::discover_ledger(Path::new(".")) {
            Some(path) => path,
            None => {
                eprintln!("no ledger found; run `hotboard capture` first");
                return false;
            }
        },
    };

    let rows = match store::read_ledger(&path) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("could not read {}: {}", path.display(), e);
            return false;
        }
    };

    println!("ledger: {}", path.display());
    println!("rows: {} (excluding header)", rows.len());
    println!(
        "columns: {}, {} (both present)",
        store::CAPTURE_TIME_COLUMN,
        store::PAYLOAD_COLUMN
    );

    let preview = rows.len().min(2);
    if preview > 0 {
        println!("\nnewest {} row(s):", preview);
    }
    for row in rows.iter().rev().take(preview).rev() {
        println!("time: {}", row.capture_time);
        match row.items() {
            Ok(items) => {
                println!("  {} items", items.len());
                for item in items.iter().take(2) {
                    println!("  {}. {} [{}]", item.rank, item.title, item.hot_index);
                }
            }
            Err(e) => {
                println!("  payload did not decode: {}", e);
                let head: String = row.json_payload.chars().take(100).collect();
                println!("  payload head: {}", head);
            }
        }
    }

    let valid = rows.iter().filter(|r| r.items().is_ok()).count();
    println!("\nvalid payloads: {}/{}", valid, rows.len());

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let backups = store::list_backups(dir);
    println!("backup ledgers: {}", backups.len());
    if let Some(newest) = backups.last() {
        println!("newest backup: {}", newest.display());
    }
    true
}
