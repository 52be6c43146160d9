//! Matchup CLI
//!
//! Batter vs bowler dismissal prediction, descriptive rankings,
//! and the CSV → Binary stats cache builder.

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use matchup_core::{BatterReport, MatchupConfig, MatchupContext, Phase, DEFAULT_CONFIG_PATH};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "matchup")]
#[command(about = "Predict whether a batter gets out to a bowler", long_about = None)]
#[command(version = matchup_core::VERSION)]
struct Cli {
    /// Config file path (YAML)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Predict the outcome of a batter/bowler/phase matchup
    Predict {
        /// Batter name, exactly as in the stats table
        #[arg(long)]
        batter: String,

        /// Bowler name, exactly as in the stats table
        #[arg(long)]
        bowler: String,

        /// Match phase (Powerplay, Middle, Death)
        #[arg(long)]
        phase: Phase,

        /// Print the result as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show rankings for a batter plus the deadliest bowlers overall
    Report {
        /// Batter name
        #[arg(long)]
        batter: String,

        /// Print the report as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// List the selectable batters, bowlers and phases
    Options,

    /// Build the compressed stats cache from the statistics CSV
    BuildCache {
        /// Input CSV file path (data_with_features.csv)
        #[arg(long)]
        csv: PathBuf,

        /// Output MsgPack+LZ4 file path
        #[arg(long)]
        out: PathBuf,

        /// Schema version (e.g., "v1")
        #[arg(long, default_value = "v1")]
        schema_version: String,

        /// Verify cache after building
        #[arg(long, default_value = "false")]
        verify: bool,

        /// Output metadata JSON file
        #[arg(long)]
        metadata: Option<PathBuf>,
    },

    /// Check a stats cache against its SHA256 checksum
    VerifyCache {
        /// Cache file path
        #[arg(long)]
        cache: PathBuf,

        /// Expected checksum (hex)
        #[arg(long)]
        checksum: String,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn load_context(config_path: &std::path::Path) -> Result<MatchupContext> {
    let config = MatchupConfig::load(config_path)
        .with_context(|| format!("Failed to read config {}", config_path.display()))?;
    MatchupContext::load(&config).context("Failed to load prediction artifacts")
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Predict {
            batter,
            bowler,
            phase,
            json,
        } => {
            let ctx = load_context(&cli.config)?;
            let result = ctx.predict(&batter, &bowler, phase.as_str())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!(
                    "{}",
                    matchup_cli::render_prediction(&result, &batter, &bowler, phase)
                );
            }
        }

        Commands::Report { batter, json } => {
            let ctx = load_context(&cli.config)?;
            if ctx.table().rows_for_batter(&batter).next().is_none() {
                log::warn!("No rows for batter '{}' in the stats table", batter);
            }
            let report = BatterReport::build(ctx.table(), &batter);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", matchup_cli::render_report(&report));
            }
        }

        Commands::Options => {
            let ctx = load_context(&cli.config)?;
            print!("{}", matchup_cli::render_options(ctx.table()));
        }

        Commands::BuildCache {
            csv,
            out,
            schema_version,
            verify,
            metadata,
        } => {
            log::info!("Building stats cache from {}", csv.display());
            let meta = matchup_cli::build_stats_cache(&csv, &out, &schema_version)?;
            print!("{}", matchup_cli::render_cache_summary(&meta, &out));

            if verify {
                check_cache(&out, &meta.checksum)?;
            }

            if let Some(metadata_path) = metadata {
                write_metadata(&metadata_path, &meta)?;
            }
        }

        Commands::VerifyCache { cache, checksum } => {
            check_cache(&cache, &checksum)?;
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn check_cache(cache_path: &std::path::Path, checksum: &str) -> Result<()> {
    if !matchup_cli::verify_stats_cache(cache_path, checksum)? {
        anyhow::bail!("checksum mismatch for {}", cache_path.display());
    }
    println!("checksum ok: {}", cache_path.display());
    Ok(())
}

#[cfg(feature = "cli")]
fn write_metadata(path: &std::path::Path, meta: &matchup_cli::CacheMetadata) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write metadata {}", path.display()))?;
    log::info!("Cache metadata written to {}", path.display());
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("matchup was built without the `cli` feature");
    std::process::exit(2);
}
