//! abacus-distinct CLI - distributed distinct-product counting.

use abacus_distinct::{count_distinct, CountConfig, CountReport, Traversal};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;

/// Count the distinct products in the N x N multiplication table.
///
/// Splits the rows across a fixed pool of workers, routes every product to
/// a deterministic owner, deduplicates locally and sums the per-worker
/// counts. No worker ever holds the full table.
#[derive(Parser, Debug)]
#[command(name = "abacus-distinct")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Table size N (counts distinct values of i*j for 1 <= i, j <= N).
    #[arg(value_name = "N")]
    n: Option<u32>,

    /// Number of workers in the pool (defaults to the available CPU cores).
    #[arg(short, long)]
    workers: Option<usize>,

    /// Generate every column of every row instead of the triangular half.
    #[arg(long)]
    full_table: bool,

    /// Output the report as JSON.
    #[arg(long)]
    json: bool,

    /// Verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Show a progress spinner while the run is in flight.
    #[arg(long)]
    progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Create a spinner for indeterminate progress.
fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Default worker count: one per available core.
fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1)
}

fn print_report(report: &CountReport, verbose: bool) {
    if verbose {
        eprintln!();
        eprintln!("Count Results:");
        eprintln!("  Table size:        {}x{}", report.n, report.n);
        eprintln!("  Workers:           {}", report.workers);
        eprintln!("  Distinct products: {}", report.distinct);
        eprintln!();
        eprintln!("Performance:");
        eprintln!("  Elapsed:           {:.3}s", report.elapsed_secs);
        if report.elapsed_secs > 0.0 {
            eprintln!(
                "  Throughput:        {:.0} cells/sec",
                (u64::from(report.n) * u64::from(report.n)) as f64 / report.elapsed_secs
            );
        }
        eprintln!();
    }
    println!(
        "distinct products in {}x{} table: {} ({:.3}s)",
        report.n, report.n, report.distinct, report.elapsed_secs
    );
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    // Handle completions subcommand
    if let Some(Commands::Completions { shell }) = args.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "abacus-distinct", &mut io::stdout());
        return Ok(());
    }

    // Validate arguments before any worker is spawned; a half-started pool
    // cannot agree on its collective phases.
    let n = args.n.ok_or("table size N is required")?;

    let workers = args.workers.unwrap_or_else(default_workers);
    if workers == 0 {
        eprintln!("Error: worker count must be at least 1");
        std::process::exit(1);
    }

    let traversal = if args.full_table {
        Traversal::Full
    } else {
        Traversal::Triangular
    };
    let config = CountConfig::new(n, workers).with_traversal(traversal);

    if args.verbose && !args.json {
        eprintln!("Configuration:");
        eprintln!("  Table size (N): {n}");
        eprintln!("  Workers:        {workers}");
        eprintln!("  Traversal:      {traversal:?}");
        eprintln!();
    }

    let pb = if args.progress && !args.json {
        Some(create_spinner("Counting distinct products..."))
    } else {
        None
    };

    let result = count_distinct(&config);

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let report = match result {
        Ok(report) => report,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, args.verbose);
    }

    Ok(())
}
