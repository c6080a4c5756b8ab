use clap::{Parser, Subcommand};
use showkeeper_common::{LibraryId, MediaKind, ShowId};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "showkeeper")]
#[command(author, version, about = "TV library reconciliation against metadata providers")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile a library's folders with the catalog
    Scan {
        /// Library to scan
        #[arg(long)]
        library: LibraryId,

        /// Media kind of the library
        #[arg(long, default_value = "tvshow")]
        kind: MediaKind,

        /// Bind new shows to the best confident search result
        #[arg(long)]
        auto_add: bool,

        /// Drop shows and episodes no provider knows about
        #[arg(long)]
        no_add_unknown: bool,

        /// Number of folders reconciled at once
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// List the search results stored for a show
    Candidates {
        /// Show to inspect
        #[arg(long)]
        show: ShowId,
    },

    /// Bind a show to one of its stored search results
    Select {
        /// Show to bind
        #[arg(long)]
        show: ShowId,

        /// Index of the search result, as printed by `candidates`
        #[arg(long)]
        index: usize,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
