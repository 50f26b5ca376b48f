//! Process configuration.
//!
//! Every flag has an environment fallback so the service can be configured
//! either way in a container.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};

use crate::api::Store;
use crate::middleware::Negotiation;
use crate::store::{MemoryStore, SqliteStore, StoreError};

/// Which record store backs the service.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum StoreKind {
    /// SQLite database at `--database`.
    #[default]
    Sqlite,
    /// In-process map; contents are lost on exit.
    Memory,
}

#[derive(Clone, Debug, Parser)]
#[command(name = "postbox", version, about = "JSON resource service for posts")]
pub struct Config {
    /// Address to listen on.
    #[arg(long, env = "POSTBOX_ADDR", default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Record store backend.
    #[arg(long, env = "POSTBOX_STORE", value_enum, default_value_t = StoreKind::Sqlite)]
    pub store: StoreKind,

    /// SQLite database file. `:memory:` keeps it in memory.
    #[arg(long, env = "POSTBOX_DATABASE", default_value = "posts.db")]
    pub database: PathBuf,

    /// Whether requests must accept application/json.
    #[arg(long, env = "POSTBOX_NEGOTIATION", value_enum, default_value_t = Negotiation::Enforced)]
    pub negotiation: Negotiation,
}

impl Config {
    /// Opens the configured store.
    pub fn open_store(&self) -> Result<Store, StoreError> {
        Ok(match self.store {
            StoreKind::Sqlite => Arc::new(SqliteStore::open(&self.database)?),
            StoreKind::Memory => Arc::new(MemoryStore::new()),
        })
    }
}
