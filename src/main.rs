//! # Feathers Docs CLI (`feathers-docs`)
//!
//! Serves the Feathers documentation catalog to MCP clients and exposes the
//! same operations as one-shot commands.
//!
//! ## Usage
//!
//! ```bash
//! feathers-docs --config ./config/feathers-docs.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `feathers-docs serve stdio` | MCP over stdin/stdout |
//! | `feathers-docs serve http` | MCP at `/mcp` plus the JSON API |
//! | `feathers-docs list` | Filter and paginate indexed pages |
//! | `feathers-docs read <uri>` | Print one page's markdown |
//! | `feathers-docs refresh` | Re-sync the repository and rebuild |
//! | `feathers-docs status` | Sync metadata and index health |
//!
//! ## Client configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "feathers-docs": {
//!       "command": "feathers-docs",
//!       "args": ["serve", "stdio"]
//!     }
//!   }
//! }
//! ```
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); stdout is reserved for
//! the stdio transport and command output.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use feathers_docs::{commands, config, mcp, server};

/// Feathers Docs: MCP catalog of the Feathers documentation repository.
#[derive(Parser)]
#[command(
    name = "feathers-docs",
    about = "Serve the Feathers documentation to MCP clients",
    version,
    long_about = "Keeps a shallow clone of the Feathers documentation repository, indexes its \
    markdown pages, and serves them over MCP (stdio or streamable HTTP) as tools and \
    feathers-doc:// resources."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/feathers-docs.toml`. A missing file means
    /// built-in defaults plus `FEATHERS_DOCS_*` environment overrides.
    #[arg(long, global = true, default_value = "./config/feathers-docs.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a server.
    Serve {
        #[command(subcommand)]
        transport: ServeTransport,
    },

    /// List indexed pages.
    List {
        /// Case-insensitive substring matched against title, path, and headings.
        #[arg(long)]
        query: Option<String>,

        /// Page size (1-20, default `[retrieval].top_k`).
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Number of matches to skip.
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<i64>,
    },

    /// Print the markdown of a page.
    Read {
        /// Page identifier, e.g. `feathers-doc://docs/api/hooks.md`.
        uri: String,
    },

    /// Fetch the latest docs and rebuild the index.
    Refresh {
        /// Advisory; every refresh rebuilds the full index.
        #[arg(long)]
        force_rebuild: bool,
    },

    /// Show repository, sync, and index status.
    Status,
}

#[derive(Subcommand)]
enum ServeTransport {
    /// MCP over stdin/stdout.
    Stdio,

    /// MCP streamable HTTP at `/mcp` plus the JSON API, on `[server].bind`.
    Http,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let cfg = config::load_config_or_default(&cli.config)?;
    let bind = cfg.server.bind.clone();
    let index = commands::build_index(cfg);

    match cli.command {
        Commands::Serve { transport } => {
            commands::initial_refresh(&index).await;
            match transport {
                ServeTransport::Stdio => mcp::serve_stdio(index).await?,
                ServeTransport::Http => server::serve_http(index, &bind).await?,
            }
        }
        Commands::List {
            query,
            limit,
            offset,
        } => commands::run_list(&index, query, limit, offset).await?,
        Commands::Read { uri } => commands::run_read(&index, &uri).await?,
        Commands::Refresh { force_rebuild } => {
            commands::run_refresh(&index, force_rebuild).await?
        }
        Commands::Status => commands::run_status(&index).await?,
    }

    Ok(())
}
