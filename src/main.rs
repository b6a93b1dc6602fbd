//! `fanes` CLI - Browse, search and resolve streams from HDFilmCehennemi

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use fanes::{FanesProvider, SiteConfig};

mod cmd;

#[derive(Parser)]
#[command(name = "fanes")]
#[command(about = "Mirror-resilient catalog and stream resolver for HDFilmCehennemi")]
#[command(version)]
struct Cli {
    /// Site config file (default: ~/.config/fanes/site.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog sections
    Sections,

    /// List one page of a catalog section
    Catalog {
        /// Section name or 1-based index (see `sections`)
        section: String,

        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Search titles
    Search {
        /// Search terms
        query: String,
    },

    /// Show a title's detail page
    Load {
        /// Detail page URL or path
        url: String,
    },

    /// Resolve streams and subtitles for a title or episode
    Links {
        /// Detail or episode page URL or path
        url: String,
    },

    /// Show known mirrors in preference order
    Mirrors {
        /// Check the remote mirror list first
        #[arg(long)]
        refresh: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => SiteConfig::from_file(path)?,
        None => SiteConfig::load()?,
    };

    run(cli.command, &config, cli.json).await
}

async fn run(command: Commands, config: &SiteConfig, json: bool) -> Result<()> {
    // Listing sections needs no network, so the provider is built per command.
    let provider = || FanesProvider::from_config(config);
    match command {
        Commands::Sections => cmd::browse::cmd_sections(config, json)?,
        Commands::Catalog { section, page } => {
            cmd::browse::cmd_catalog(&provider()?, &section, page, json).await?;
        }
        Commands::Search { query } => {
            cmd::browse::cmd_search(&provider()?, &query, json).await?;
        }
        Commands::Load { url } => {
            cmd::load::cmd_load(&provider()?, &url, json).await?;
        }
        Commands::Links { url } => {
            cmd::links::cmd_links(&provider()?, &url, json).await?;
        }
        Commands::Mirrors { refresh } => {
            cmd::mirrors::cmd_mirrors(&provider()?, refresh, json).await?;
        }
    }
    Ok(())
}

/// Log to stderr so `--json` output on stdout stays clean.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "fanes=debug,info",
        _ => "fanes=trace,debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
