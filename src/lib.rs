//! # Feathers Docs
//!
//! An MCP server that keeps a local, shallow working copy of the Feathers
//! documentation repository, indexes its markdown pages, and serves them to
//! AI clients.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌─────────────┐   ┌──────────────┐
//! │  RepoSync  │──▶│  Discovery  │──▶│ Page parser  │
//! │ clone/pull │   │  *.md walk  │   │ FM+headings  │
//! └────────────┘   └─────────────┘   └──────┬───────┘
//!                                           ▼
//!                                    ┌──────────────┐
//!                                    │  DocsIndex   │
//!                                    │  snapshot    │
//!                                    └──────┬───────┘
//!                      ┌────────────────────┤
//!                      ▼                    ▼
//!                ┌──────────┐         ┌──────────┐
//!                │ MCP stdio│         │   HTTP   │
//!                └──────────┘         └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`error`] | Catalog error taxonomy |
//! | [`models`] | Page records, index snapshot, result shapes |
//! | [`sync`] | Repository synchronization via `git` |
//! | [`discovery`] | Markdown file discovery |
//! | [`parser`] | Front matter, headings, and titles |
//! | [`uri`] | `feathers-doc://docs/` identifiers and path safety |
//! | [`index`] | In-memory index, list/read/refresh/status |
//! | [`tools`] | Tool trait and registry shared by both transports |
//! | [`mcp`] | MCP protocol bridge |
//! | [`server`] | HTTP server |
//! | [`commands`] | CLI commands and serving bootstrap |

pub mod commands;
pub mod config;
pub mod discovery;
pub mod error;
pub mod index;
pub mod mcp;
pub mod models;
pub mod parser;
pub mod server;
pub mod sync;
pub mod tools;
pub mod uri;

pub use error::{DocsError, DocsResult};
pub use index::{DocsIndex, ListQuery};
pub use sync::{GitRepoSync, RepoSync};
