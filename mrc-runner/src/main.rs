use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mrc_runner::config::EngineSpec;
use mrc_runner::generator::{parse_format, TraceGenerator, TraceGeneratorConfig};
use mrc_runner::runner;
use mrc_runner::trace::Format;

/// Computes miss ratio curves from cache traces using reuse-distance
/// estimation engines (Olken, Fixed-Rate SHARDS, Evicting-Map,
/// Evicting-QuickMRC).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one or more engines over a trace and write histograms/MRCs.
    Run {
        /// Path to the binary trace file.
        #[arg(short, long)]
        trace: PathBuf,

        /// Trace binary layout: ms-command or s-eviction.
        #[arg(long, default_value = "ms-command", value_parser = parse_format)]
        format: Format,

        /// Directory to write `<algorithm>.hist`/`<algorithm>.mrc` into.
        #[arg(short, long, default_value = "out")]
        out_dir: PathBuf,

        /// One or more `Algorithm(k=v,...)` engine specs, e.g.
        /// `olken` or `evicting_map(size=8192,bins=4096)`.
        #[arg(short, long, required = true, num_args = 1..)]
        engine: Vec<String>,
    },

    /// Generate a synthetic trace (Zipfian or uniform key distribution).
    Generate {
        /// Output path for the generated trace.
        #[arg(short, long, default_value = "trace.bin")]
        output: PathBuf,

        /// Trace binary layout: ms-command or s-eviction.
        #[arg(long, default_value = "ms-command", value_parser = parse_format)]
        format: Format,

        /// Number of accesses to generate.
        #[arg(short, long, default_value_t = 1 << 20)]
        length: u64,

        /// Number of distinct keys.
        #[arg(short = 'k', long, default_value_t = 1 << 20)]
        num_keys: u64,

        /// Zipf skew parameter.
        #[arg(long, default_value_t = 0.99)]
        skew: f64,

        /// Draw keys uniformly instead of Zipfian.
        #[arg(long, default_value_t = false)]
        uniform: bool,

        /// RNG seed.
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            trace,
            format,
            out_dir,
            engine,
        } => run_command(&trace, format, &out_dir, &engine),
        Commands::Generate {
            output,
            format,
            length,
            num_keys,
            skew,
            uniform,
            seed,
        } => {
            let generator = TraceGenerator::new(TraceGeneratorConfig {
                length,
                num_keys,
                skew,
                uniform,
                format,
                output_path: output,
                seed,
                ..Default::default()
            });
            generator.generate()?;
            Ok(())
        }
    }
}

fn run_command(
    trace: &std::path::Path,
    format: Format,
    out_dir: &std::path::Path,
    engine_texts: &[String],
) -> anyhow::Result<()> {
    std::fs::create_dir_all(out_dir)?;

    let specs = engine_texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let stem = text.split('(').next().unwrap_or(text).trim();
            let hist_path = out_dir.join(format!("{i:02}_{stem}.hist"));
            let mrc_path = out_dir.join(format!("{i:02}_{stem}.mrc"));
            EngineSpec::parse(text, hist_path, mrc_path)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let outcomes = runner::run(trace, format, &specs)?;

    let mut failures = 0usize;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(()) => println!("{}: ok", outcome.algorithm),
            Err(e) => {
                eprintln!("{}: failed: {e}", outcome.algorithm);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
