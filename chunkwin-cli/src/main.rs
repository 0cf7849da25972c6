//! CLI for the chunkwin windowed key/value array.
//!
//! Provides commands for replaying operation scripts and benchmarking the
//! reservoir write path.

mod script;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chunkwin::clock::ManualClock;
use chunkwin::{ReservoirConfig, SlidingWindowReservoir, WindowedArray};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// chunkwin: Chunked sliding-window key/value array CLI.
#[derive(Parser)]
#[command(name = "chunkwin", version, about)]
struct Cli {
    /// Reservoir configuration file (JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Run an operation script against a fresh array.
    Replay {
        /// Path to the script file.
        script: PathBuf,

        /// Entries per chunk (overrides the config file).
        #[arg(long)]
        chunk_capacity: Option<usize>,

        /// Output format.
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Run a reservoir write-path microbenchmark.
    Bench {
        /// Number of samples to record.
        #[arg(long, default_value = "10000000")]
        points: u64,

        /// Retention window in milliseconds (overrides the config file).
        #[arg(long)]
        window_ms: Option<u64>,

        /// Entries per chunk (overrides the config file).
        #[arg(long)]
        chunk_capacity: Option<usize>,
    },
}

/// Output format for replay results.
#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// One line per printed result.
    Text,
    /// JSON array of `{line, op, result}` objects.
    Json,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Replay {
            script,
            chunk_capacity,
            format,
        } => cmd_replay(config, &script, chunk_capacity, &format),
        Commands::Bench {
            points,
            window_ms,
            chunk_capacity,
        } => cmd_bench(config, points, window_ms, chunk_capacity),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Loads `--config`, or the defaults when it is absent.
fn load_config(path: Option<&Path>) -> Result<ReservoirConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let config = ReservoirConfig::from_json_file(path)?;
            tracing::debug!(path = %path.display(), ?config, "loaded config");
            Ok(config)
        }
        None => Ok(ReservoirConfig::default()),
    }
}

/// Implements `chunkwin replay <script>`.
fn cmd_replay(
    config: ReservoirConfig,
    script_path: &Path,
    chunk_capacity: Option<usize>,
    format: &OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(script_path)
        .map_err(|e| format!("Cannot read script '{}': {e}", script_path.display()))?;
    let steps = script::parse(&source)?;

    let mut array_config = config.array();
    if let Some(capacity) = chunk_capacity {
        array_config.chunk_capacity = capacity;
    }
    let array = WindowedArray::with_config(array_config)?;

    let outputs = script::run(&array, &steps);

    match format {
        OutputFormat::Text => {
            for (_, output) in &outputs {
                println!("{output}");
            }
        }
        OutputFormat::Json => {
            let json: Vec<serde_json::Value> = outputs
                .iter()
                .map(|(step, output)| output.to_json(step))
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

/// Implements `chunkwin bench`.
#[allow(clippy::cast_precision_loss)] // Benchmark stats are fine with f64 precision
fn cmd_bench(
    mut config: ReservoirConfig,
    points: u64,
    window_ms: Option<u64>,
    chunk_capacity: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(ms) = window_ms {
        config.window = Duration::from_millis(ms);
    }
    if let Some(capacity) = chunk_capacity {
        config.chunk_capacity = capacity;
    }
    if points == 0 {
        return Err("--points must be positive".into());
    }

    println!("chunkwin reservoir write-path benchmark");
    println!("  Points: {points}");
    println!("  Window: {:?}", config.window);
    println!("  Chunk capacity: {}", config.chunk_capacity);
    println!();

    let clock = Arc::new(ManualClock::new(1_700_000_000_000_000_000));
    let reservoir = SlidingWindowReservoir::with_clock(config, Arc::clone(&clock))?;

    println!("Recording {points} samples...");

    let start = Instant::now();

    for i in 0..points {
        clock.advance(Duration::from_micros(1));
        reservoir.update(i64::try_from(i).unwrap_or(i64::MAX));
    }

    let elapsed = start.elapsed();
    let ns_per_write = elapsed.as_nanos() as f64 / points as f64;
    let writes_per_sec = points as f64 / elapsed.as_secs_f64();

    println!();
    println!("Results:");
    println!("  Total updates: {points}");
    println!("  Elapsed: {elapsed:.3?}");
    println!("  Avg latency: {ns_per_write:.1} ns/update");
    println!("  Throughput: {writes_per_sec:.0} updates/sec");
    println!("  Retained: {} samples", reservoir.size());
    println!("  Chunks: {}", reservoir.measurements().chunk_count());
    println!();

    Ok(())
}
