//! Symdex CLI - C++ cross-reference indexer
//!
//! Indexes translation-unit dumps into a per-file record store and answers
//! simple questions about the result.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "symdex")]
#[command(about = "A C++ cross-reference indexer that merges per-file symbol records")]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding one index file per source file
    #[arg(long, global = true, env = "SYMDEX_OUT_DIR")]
    out_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index translation-unit dumps
    Index {
        /// Dump files or directories to search for *.tu.json dumps
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Source tree root; files under it are indexed by relative path
        #[arg(long, env = "SYMDEX_SRC_ROOT")]
        src_root: PathBuf,

        /// Build output root; generated files are indexed under __GENERATED__
        #[arg(long, env = "SYMDEX_OBJ_ROOT")]
        obj_root: Option<PathBuf>,

        /// Number of parallel jobs
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Override fan-out: first (first base only) or all (every base)
        #[arg(long, default_value = "first")]
        override_policy: String,
    },

    /// Show index status and statistics
    Status {
        /// Show list of index files
        #[arg(long)]
        files: bool,
    },

    /// Find occurrences of a symbol id
    Find {
        /// Symbol id, e.g. _ZN2ns3fooEv or T_ns::Widget
        symbol: String,

        /// Reference kind to filter (def, decl, use)
        #[arg(short, long)]
        kind: Option<String>,

        /// Maximum number of results
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let out_dir = cli
        .out_dir
        .ok_or_else(|| anyhow::anyhow!("output directory is not set (--out-dir or SYMDEX_OUT_DIR)"))?;

    // Execute command
    match cli.command {
        Commands::Index {
            inputs,
            src_root,
            obj_root,
            jobs,
            override_policy,
        } => commands::index::run(
            &inputs,
            src_root,
            obj_root,
            out_dir,
            jobs,
            &override_policy,
        ),
        Commands::Status { files } => commands::status::run(&out_dir, files),
        Commands::Find {
            symbol,
            kind,
            limit,
        } => commands::find::run(&out_dir, &symbol, kind.as_deref(), limit),
    }
}
