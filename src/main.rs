//! `folio` command line: list and extract archive entries, index books, and
//! work through duplicate page hashes.

mod commands;
mod error;

use crate::commands::Context;
use clap::{Args, Parser, Subcommand};
use folio_cache::models::{Action, Pageable};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "folio", version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML or YAML). Defaults to the per-user config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the entries of an archive as JSON, in reading order.
    Entries {
        archive: PathBuf,
        /// Also measure image dimensions.
        #[arg(long)]
        dimensions: bool,
        #[command(flatten)]
        container: Container,
    },
    /// Write the raw bytes of one archive entry.
    Extract {
        archive: PathBuf,
        /// Exact entry name, as shown by `entries`.
        entry: String,
        #[command(flatten)]
        container: Container,
        /// Write here instead of standard output.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Analyse an archive and store it as a book, replacing any previous
    /// record with the same id.
    Index {
        book_id: String,
        archive: PathBuf,
        #[command(flatten)]
        container: Container,
    },
    /// Known and unknown page hashes.
    #[command(subcommand)]
    Hashes(HashCommand),
}

#[derive(Subcommand, Debug)]
enum HashCommand {
    /// Hashes with a recorded decision, most recently changed first.
    Known {
        /// Only these actions. Repeatable.
        #[arg(long = "action", value_parser = parse_action)]
        actions: Vec<Action>,
        #[command(flatten)]
        paging: Paging,
    },
    /// Hashes found on pages without a decision, most common first.
    Unknown {
        #[command(flatten)]
        paging: Paging,
    },
    /// Book pages carrying a hash.
    Matches {
        #[command(flatten)]
        hash: HashArgs,
        #[command(flatten)]
        paging: Paging,
    },
    /// Write the first page carrying a hash, optionally as a thumbnail.
    Thumbnail {
        #[command(flatten)]
        hash: HashArgs,
        /// Longest side of the thumbnail. Defaults to `thumbnails.default_size`.
        #[arg(long)]
        resize: Option<u32>,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the thumbnail stored with a known hash.
    KnownThumbnail {
        hash: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Record a decision for a hash, storing a thumbnail of its first page.
    Mark {
        #[command(flatten)]
        hash: HashArgs,
        #[arg(long, value_parser = parse_action)]
        action: Action,
    },
}

/// Declared media type of an archive; sniffed from its content when omitted.
#[derive(Args, Debug)]
struct Container {
    #[arg(long = "media-type")]
    media_type: Option<String>,
}

#[derive(Args, Debug)]
struct HashArgs {
    hash: String,
    /// Media type of the pages, e.g. `image/jpeg`.
    #[arg(long = "media-type")]
    media_type: String,
    /// Page size in bytes; any size matches when omitted.
    #[arg(long)]
    size: Option<u64>,
}

#[derive(Args, Debug)]
struct Paging {
    /// Zero-based page of results.
    #[arg(long, default_value_t = 0)]
    page: u32,
    #[arg(long = "per-page", default_value_t = 20)]
    per_page: u32,
}

impl From<&Paging> for Pageable {
    fn from(paging: &Paging) -> Self {
        Pageable::new(paging.page, paging.per_page)
    }
}

fn parse_action(value: &str) -> Result<Action, String> {
    value.parse().map_err(|_| {
        let expected: Vec<_> = Action::ALL.iter().map(Action::as_str).collect();
        format!("expected one of {}", expected.join(", "))
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match Context::load(cli.config.as_deref()).await {
        Ok(context) => {
            let result = commands::run(&context, cli.command).await;
            context.close().await;
            result
        },
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:?}");
            ExitCode::FAILURE
        },
    }
}
