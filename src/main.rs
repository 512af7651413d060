//! bitsect: bounded-memory intersection of binary integer files
//!
//! Usage: bitsect <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;

use bitsect::commands::{
    BenchCommand, DumpCommand, GenerateCommand, GenerateConfig, IntersectCommand,
};
use bitsect::config::{
    IntersectConfig, DEFAULT_ACCUMULATOR_CAPACITY, DEFAULT_BUFFER_SIZE, DEFAULT_SEGMENT_BITS,
};
use bitsect::{IntersectError, Strategy};

#[derive(Parser)]
#[command(name = "bitsect")]
#[command(version)]
#[command(about = "Intersect large files of little-endian int32 values in bounded memory", long_about = None)]
struct Cli {
    /// Number of threads for generate (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write every value of B that also occurs in A, once, in B's order
    Intersect {
        /// Input file A (values to look for)
        #[arg(short = 'a', long)]
        file_a: PathBuf,

        /// Input file B (scan order of the output)
        #[arg(short = 'b', long)]
        file_b: PathBuf,

        /// Output file (created or truncated)
        #[arg(short, long)]
        output: PathBuf,

        /// Read strategy: sync, sync-over-future, overlapped
        #[arg(short, long, default_value = "sync")]
        strategy: String,

        /// Read buffer size in bytes (multiple of 4)
        #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,

        /// Bitset segment size in bits (at least 4096)
        #[arg(long, default_value_t = DEFAULT_SEGMENT_BITS)]
        segment_bits: u64,

        /// Matches buffered before each write
        #[arg(long, default_value_t = DEFAULT_ACCUMULATOR_CAPACITY)]
        batch: usize,

        /// Print run statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Generate random input files
    Generate {
        /// Output path for A
        #[arg(short = 'a', long)]
        file_a: PathBuf,

        /// Output path for B
        #[arg(short = 'b', long)]
        file_b: PathBuf,

        /// Number of values in A
        #[arg(long, default_value = "1000000")]
        a_count: u64,

        /// Number of values in B
        #[arg(long, default_value = "1000000")]
        b_count: u64,

        /// Smallest value generated
        #[arg(long, default_value_t = i32::MIN, allow_hyphen_values = true)]
        min: i32,

        /// Largest value generated
        #[arg(long, default_value_t = i32::MAX, allow_hyphen_values = true)]
        max: i32,

        /// Fraction of B sampled from A (0.0 - 1.0)
        #[arg(long, default_value = "0.5")]
        overlap: f64,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Print a record file as text, one value per line
    Dump {
        /// Input record file
        #[arg(short, long)]
        input: PathBuf,

        /// Print at most this many values
        #[arg(short = 'n', long)]
        limit: Option<u64>,
    },

    /// Time every strategy on the same inputs and check their outputs match
    Bench {
        /// Input file A
        #[arg(short = 'a', long)]
        file_a: PathBuf,

        /// Input file B
        #[arg(short = 'b', long)]
        file_b: PathBuf,

        /// Directory for per-strategy outputs
        #[arg(short, long, default_value = "bench_out")]
        out_dir: PathBuf,

        /// Strategies to run besides sync (comma-separated; default: all)
        #[arg(short, long, value_delimiter = ',')]
        strategies: Vec<String>,

        /// Read buffer size in bytes (multiple of 4)
        #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,

        /// Bitset segment size in bits (at least 4096)
        #[arg(long, default_value_t = DEFAULT_SEGMENT_BITS)]
        segment_bits: u64,

        /// Matches buffered before each write
        #[arg(long, default_value_t = DEFAULT_ACCUMULATOR_CAPACITY)]
        batch: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    // Configure thread pool if --threads specified
    if let Some(n) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
        {
            eprintln!("Error: failed to initialize thread pool: {}", e);
            process::exit(1);
        }
    }

    let result = match cli.command {
        Commands::Intersect {
            file_a,
            file_b,
            output,
            strategy,
            buffer_size,
            segment_bits,
            batch,
            stats,
        } => run_intersect(
            file_a,
            file_b,
            output,
            &strategy,
            buffer_size,
            segment_bits,
            batch,
            stats,
        ),

        Commands::Generate {
            file_a,
            file_b,
            a_count,
            b_count,
            min,
            max,
            overlap,
            seed,
            force,
        } => run_generate(GenerateConfig {
            a_path: file_a,
            b_path: file_b,
            a_count,
            b_count,
            min,
            max,
            overlap,
            seed,
            force,
        }),

        Commands::Dump { input, limit } => run_dump(input, limit),

        Commands::Bench {
            file_a,
            file_b,
            out_dir,
            strategies,
            buffer_size,
            segment_bits,
            batch,
        } => run_bench(
            file_a,
            file_b,
            out_dir,
            &strategies,
            buffer_size,
            segment_bits,
            batch,
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_strategy(s: &str) -> Result<Strategy, IntersectError> {
    Strategy::from_str(s).ok_or_else(|| {
        IntersectError::InvalidArgument(format!(
            "unknown strategy '{}' (expected sync, sync-over-future or overlapped)",
            s
        ))
    })
}

#[allow(clippy::too_many_arguments)]
fn run_intersect(
    file_a: PathBuf,
    file_b: PathBuf,
    output: PathBuf,
    strategy: &str,
    buffer_size: usize,
    segment_bits: u64,
    batch: usize,
    stats: bool,
) -> Result<(), IntersectError> {
    let config = IntersectConfig::new()
        .with_strategy(parse_strategy(strategy)?)
        .with_buffer_size(buffer_size)
        .with_segment_bits(segment_bits)
        .with_accumulator_capacity(batch);

    let result = IntersectCommand::new(config).run(&file_a, &file_b, &output)?;
    if stats {
        eprintln!("Intersect stats: {}", result);
    }
    Ok(())
}

fn run_generate(config: GenerateConfig) -> Result<(), IntersectError> {
    let stats = GenerateCommand::new(config).run()?;
    eprintln!("Generated: {}", stats);
    Ok(())
}

fn run_dump(input: PathBuf, limit: Option<u64>) -> Result<(), IntersectError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let cmd = DumpCommand { limit };
    match cmd.run(&input, &mut handle) {
        // A closed pipe (e.g. `| head`) is not an error
        Err(e) if e.io_kind() == Some(io::ErrorKind::BrokenPipe) => Ok(()),
        other => other.map(|_| ()),
    }
}

fn run_bench(
    file_a: PathBuf,
    file_b: PathBuf,
    out_dir: PathBuf,
    strategies: &[String],
    buffer_size: usize,
    segment_bits: u64,
    batch: usize,
) -> Result<(), IntersectError> {
    let config = IntersectConfig::new()
        .with_buffer_size(buffer_size)
        .with_segment_bits(segment_bits)
        .with_accumulator_capacity(batch);

    let mut cmd = BenchCommand::new(config);
    cmd.strategies = strategies
        .iter()
        .map(|s| parse_strategy(s))
        .collect::<Result<_, _>>()?;

    let stats = cmd.run(&file_a, &file_b, &out_dir)?;
    println!("{}", stats);
    eprintln!("All outputs identical");
    Ok(())
}
