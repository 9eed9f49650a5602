//! cosmicseed CLI
//!
//! Seeds straight cosmic-ray tracks in event files.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines
)]

use clap::{Parser, Subcommand, ValueEnum};
use cosmicseed_algorithms::{total_statistics, PipelineConfig, SeedFinder, SeedingStatistics};
use cosmicseed_core::calibration::{Calibration, ConditionsSource, FixedConditions};
use cosmicseed_core::config::CorrelationStrategy;
use cosmicseed_io::{read_conditions, EventFileReader, SeedFileWriter};
use log::info;
use std::path::PathBuf;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    CosmicseedIo(#[from] cosmicseed_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] cosmicseed_core::Error),

    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Raw-hit correlation selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Correlation {
    /// Linear scan per retained hit
    Linear,
    /// Hash index built once per event
    Hashed,
}

impl From<Correlation> for CorrelationStrategy {
    fn from(value: Correlation) -> Self {
        match value {
            Correlation::Linear => CorrelationStrategy::Linear,
            Correlation::Hashed => CorrelationStrategy::Hashed,
        }
    }
}

/// Straight-line cosmic-ray track seeding.
#[derive(Parser)]
#[command(name = "cosmicseed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find track seeds in event files
    Process {
        /// Input event file(s)
        #[arg(required = true)]
        input: Vec<PathBuf>,

        /// Output file path (.jsonl or .csv)
        #[arg(short, long)]
        output: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Conditions file (JSON); default calibration if omitted
        #[arg(long)]
        conditions: Option<PathBuf>,

        /// Skip the drift refinement stage
        #[arg(long)]
        no_drift: bool,

        /// Minimum combo hits per seed
        #[arg(long)]
        min_combo_hits: Option<usize>,

        /// Minimum summed multiplicity per seed
        #[arg(long)]
        min_raw_hits: Option<usize>,

        /// Minimum in-window hits per time cluster
        #[arg(long)]
        min_good_hits: Option<usize>,

        /// Raw-hit correlation strategy
        #[arg(long, value_enum)]
        correlation: Option<Correlation>,

        /// Worker threads (0 = all cores)
        #[arg(short = 'j', long, default_value = "0")]
        threads: usize,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show information about an event file
    Info {
        /// Input event file
        input: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            conditions,
            no_drift,
            min_combo_hits,
            min_raw_hits,
            min_good_hits,
            correlation,
            threads,
            verbose,
        } => {
            init_logging(verbose);

            let mut pipeline = match &config {
                Some(path) => PipelineConfig::from_file(path)?,
                None => PipelineConfig::default(),
            };
            let seeding = &mut pipeline.seeding;
            if no_drift {
                seeding.drift = false;
            }
            if let Some(n) = min_combo_hits {
                seeding.min_combo_hits = n;
            }
            if let Some(n) = min_raw_hits {
                seeding.min_raw_hits = n;
            }
            if let Some(n) = min_good_hits {
                seeding.min_good_hits = n;
            }
            if let Some(strategy) = correlation {
                seeding.correlation = strategy.into();
            }

            let conditions: Box<dyn ConditionsSource> = match &conditions {
                Some(path) => Box::new(read_conditions(path)?),
                None => Box::new(FixedConditions::new(Calibration::default())),
            };

            if verbose {
                eprintln!("Processing {} file(s)...", input.len());
                eprintln!(
                    "Thresholds: {} combo / {} raw / {} good hits",
                    pipeline.seeding.min_combo_hits,
                    pipeline.seeding.min_raw_hits,
                    pipeline.seeding.min_good_hits
                );
                eprintln!("Drift refinement: {}", pipeline.seeding.drift);
                eprintln!("Correlation: {:?}", pipeline.seeding.correlation);
            }

            let finder = SeedFinder::with_line_fit(pipeline)?;
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()?;

            let mut writer = SeedFileWriter::create(&output)?;
            if verbose {
                eprintln!("Writing output to: {}", output.display());
            }

            let start = Instant::now();
            let mut total = SeedingStatistics::default();
            let mut total_events = 0usize;

            for path in &input {
                if verbose {
                    eprintln!("Reading: {}", path.display());
                }

                let events = EventFileReader::open(path)?.read_all()?;
                let outputs = pool.install(|| finder.process_events(&events, &*conditions))?;
                for event_output in &outputs {
                    writer.write_event(event_output)?;
                }

                let file_stats = total_statistics(&outputs);
                info!(
                    "{}: {} events, {} seeds",
                    path.display(),
                    events.len(),
                    file_stats.seeds
                );
                if verbose {
                    eprintln!("  {} events processed", events.len());
                    eprintln!("  {} seeds found", file_stats.seeds);
                }
                total_events += events.len();
                total += &file_stats;
            }
            writer.flush()?;

            let elapsed = start.elapsed();

            println!(
                "Processed {} files in {:.2}s",
                input.len(),
                elapsed.as_secs_f64()
            );
            println!("Total events: {}", total_events);
            println!("Time clusters: {}", total.clusters_processed);
            println!("Seeds: {}", total.seeds);
            println!("Line seeds: {}", total.line_seeds);
            println!("Rejected clusters: {}", total.rejected());
            println!("Outliers removed: {}", total.outliers_removed);
            if total.unmatched_hits > 0 {
                println!("Unmatched hits: {}", total.unmatched_hits);
            }
        }

        Commands::Info { input } => {
            init_logging(false);

            let reader = EventFileReader::open(&input)?;
            let file_size = reader.file_size();

            println!("File: {}", input.display());
            println!(
                "Size: {} bytes ({:.2} MB)",
                file_size,
                file_size as f64 / 1_000_000.0
            );

            let events = reader.read_all()?;
            println!("Events: {}", events.len());

            let combo: usize = events.iter().map(|e| e.combo_hits.len()).sum();
            let raw: usize = events.iter().map(|e| e.raw_hits.len()).sum();
            let clusters: usize = events.iter().map(|e| e.time_clusters.len()).sum();
            println!("Combo hits: {}", combo);
            println!("Raw hits: {}", raw);
            println!("Time clusters: {}", clusters);

            if let (Some(first), Some(last)) = (
                events.iter().map(|e| e.id.run).min(),
                events.iter().map(|e| e.id.run).max(),
            ) {
                println!("Run range: {} - {}", first, last);
            }

            let invalid = events.iter().filter(|e| e.validate().is_err()).count();
            if invalid > 0 {
                println!("Events with dangling hit indices: {}", invalid);
            }
        }
    }

    Ok(())
}
