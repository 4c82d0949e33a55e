//! Command-line surface for the statemap binary.

pub mod cache_cmd;
pub mod generate_cmd;
pub mod output;
pub mod progress;

use clap::{Args, Parser, Subcommand};
use output::OutputMode;
use statemap::config::{DEFAULT_INPUT, DEFAULT_OUTPUT};
use statemap::fetch::{DEFAULT_CONCURRENCY, DEFAULT_SOURCE_URL};
use statemap::topology::DEFAULT_OBJECT_NAME;
use statemap::{FidelityTier, Variant};
use std::path::PathBuf;

/// Build the U.S. states TopoJSON from cached Who's On First boundaries.
#[derive(Parser, Debug)]
#[command(name = "statemap", version, args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Running without a subcommand is `generate`.
    #[command(flatten)]
    pub generate: GenerateArgs,

    /// Machine-readable JSON on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Only print errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Per-region progress and debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch every listed region and write the topology (default).
    Generate(GenerateArgs),

    /// Inspect or clear the payload cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// Remove cached payloads: all of them, or one region's.
    Clear {
        /// Region identifier to evict.
        id: Option<String>,

        /// Evict the named alternate geometry instead of the default one.
        #[arg(long, value_name = "VARIANT", requires = "id")]
        alt: Option<Variant>,

        #[arg(long, env = "STATEMAP_CACHE_DIR")]
        cache_dir: Option<PathBuf>,
    },

    /// Show entry count and size.
    Stats {
        #[arg(long, env = "STATEMAP_CACHE_DIR")]
        cache_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// File listing one region identifier per line.
    #[arg(short, long, default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Where to write the TopoJSON artifact.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Maximum simultaneous upstream requests.
    #[arg(short = 'j', long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Fidelity tier: 1 (fine), 10 (medium) or 100 (coarse).
    #[arg(short, long, default_value = "10")]
    pub tier: FidelityTier,

    /// Use the named alternate geometry for every region.
    #[arg(long, value_name = "VARIANT")]
    pub alt: Option<Variant>,

    /// Empty the payload cache before fetching.
    #[arg(long)]
    pub clear_cache: bool,

    /// Payload cache directory [default: ~/.statemap/cache].
    #[arg(long, env = "STATEMAP_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Base URL of the boundary data host.
    #[arg(long, env = "STATEMAP_SOURCE_URL", default_value = DEFAULT_SOURCE_URL)]
    pub source_url: String,

    /// Name of the geometry collection inside the topology.
    #[arg(long, default_value = DEFAULT_OBJECT_NAME)]
    pub object_name: String,
}

impl From<&Cli> for OutputMode {
    fn from(cli: &Cli) -> Self {
        Self {
            quiet: cli.quiet,
            verbose: cli.verbose,
            json: cli.json,
        }
    }
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mode = OutputMode::from(&cli);

    match cli.command {
        None => generate_cmd::run(&cli.generate, mode).await.map(|_| ()),
        Some(Command::Generate(args)) => generate_cmd::run(&args, mode).await.map(|_| ()),
        Some(Command::Cache { action }) => match action {
            CacheAction::Clear { id, alt, cache_dir } => {
                cache_cmd::run_clear(cache_dir, id.as_deref(), alt.as_ref(), mode).await
            }
            CacheAction::Stats { cache_dir } => cache_cmd::run_stats(cache_dir, mode).await,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_invocation_is_generate_with_defaults() {
        let cli = Cli::try_parse_from(["statemap"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.generate.input, PathBuf::from(DEFAULT_INPUT));
        assert_eq!(cli.generate.output, PathBuf::from(DEFAULT_OUTPUT));
        assert_eq!(cli.generate.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(cli.generate.tier, FidelityTier::Medium);
        assert!(cli.generate.alt.is_none());
    }

    #[test]
    fn test_generate_subcommand_flags() {
        let cli = Cli::try_parse_from([
            "statemap", "generate", "--tier", "coarse", "-j", "8", "--alt", "naturalearth",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Generate(args)) => {
                assert_eq!(args.tier, FidelityTier::Coarse);
                assert_eq!(args.concurrency, 8);
                assert_eq!(args.alt.as_ref().map(Variant::as_str), Some("naturalearth"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_tier_rejected() {
        let err = Cli::try_parse_from(["statemap", "--tier", "5"]).unwrap_err();
        assert!(err.to_string().contains("'5'"));
    }

    #[test]
    fn test_cache_clear_args() {
        let cli = Cli::try_parse_from(["statemap", "cache", "clear", "85688637", "--json"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Some(Command::Cache {
                action: CacheAction::Clear { id, alt, .. },
            }) => {
                assert_eq!(id.as_deref(), Some("85688637"));
                assert!(alt.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_and_verbose_conflict() {
        assert!(Cli::try_parse_from(["statemap", "-q", "-v"]).is_err());
    }
}
