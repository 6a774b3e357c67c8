use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use webfetch_core::{render_fetch, render_search, Fetcher, FetcherConfig};

#[derive(Debug, Parser)]
#[command(
    name = "webfetch",
    version,
    about = "Fetch readable text from URLs and search the web from the shell."
)]
struct Cli {
    /// GitHub API token; defaults to the GITHUB_TOKEN environment variable.
    #[arg(long, global = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch readable content from a URL (GitHub repositories resolve
    /// through the API, everything else is scraped).
    Fetch { url: String },
    /// Search the web, fetching full content for each hit where possible.
    Search {
        query: String,
        /// Number of web results to return.
        #[arg(long, default_value_t = 5)]
        max_results: usize,
        /// Skip the GitHub repository search even when the query suggests it.
        #[arg(long)]
        no_github: bool,
    },
}

fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();

    let mut config = FetcherConfig::default();
    if cli.token.is_some() {
        config.github.token = cli.token.clone();
    }
    let fetcher = Fetcher::with_config(config);

    match cli.command {
        Command::Fetch { url } => {
            info!(%url, "fetching");
            let record = fetcher.fetch_url(&url);
            println!("{}", render_fetch(&record));
        }
        Command::Search {
            query,
            max_results,
            no_github,
        } => {
            info!(%query, max_results, "searching");
            let results = fetcher.comprehensive_search(&query, !no_github, max_results);
            println!("{}", render_search(&results));
        }
    }

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to initialize tracing: {error}"))
}
