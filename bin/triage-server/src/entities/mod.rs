//! Database abstraction layer.
//!
//! One trait per aggregate ([`UserStore`], [`ChatStore`], [`GroupStore`],
//! [`CaseStore`], [`ConfigStore`], [`RagStore`]) defines the persistence
//! interface; the default implementation for all of them is [`SqliteStore`].
//! To swap to another database (Postgres, MySQL), implement the traits for a
//! new type and change the concrete type in [`crate::state::AppState`].
//!
//! All trait methods use `impl Future` in their signatures (stable since Rust
//! 1.75) so no extra `async-trait` crate is required.
//!
//! # Migrations path
//!
//! `sqlx::migrate!("./migrations")` resolves the path **at compile time**
//! relative to `CARGO_MANIFEST_DIR` (the crate root), so the directory is
//! embedded into the binary.  The database file location is determined at
//! runtime by the `TRIAGE_DATABASE_URL` environment variable and is **not**
//! related to the current working directory at runtime.
//!
//! # Queries
//!
//! The `sqlx::query` (runtime-verified) form is used deliberately so that no
//! `DATABASE_URL` environment variable is needed at compile time.

pub mod case;
pub mod chat;
pub mod config;
pub mod dao;
pub mod group;
pub mod rag;
pub mod user;

pub use dao::{
    CaseRecord, ChatGroupRecord, ChatRecord, ChunkConfigRecord, EmbeddingConfigRecord,
    MessageRecord, ModelConfigRecord, ParserConfigRecord, RagPipelineRecord,
    RerankerConfigRecord, UserGroupRecord, UserRecord, VectorDbConfigRecord,
};

pub use case::{CaseQuery, CaseStore, SimilarityTerms};
pub use chat::ChatStore;
pub use config::ConfigStore;
pub use group::GroupStore;
pub use rag::RagStore;
pub use user::UserStore;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// SQLite-backed store behind every `*Store` trait.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending
    /// migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g.
    /// `"sqlite://triage.db"` or `"sqlite::memory:"` for tests.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // Every pooled connection to `:memory:` opens its own private
        // database, so the pool must be clamped to a single connection that
        // is never reaped.
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };
        let pool = pool_options.connect_with(options).await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }
}

/// Parse a stored RFC3339 timestamp, warning and substituting `now` when the
/// column is corrupt rather than failing the whole read.
pub(crate) fn parse_stored_ts(raw: &str, column: &str) -> chrono::DateTime<chrono::Utc> {
    raw.parse().unwrap_or_else(|e: chrono::ParseError| {
        tracing::warn!(raw = %raw, column, error = %e, "failed to parse stored timestamp; using now");
        chrono::Utc::now()
    })
}
