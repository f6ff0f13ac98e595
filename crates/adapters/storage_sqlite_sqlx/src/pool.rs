//! Opening the `SQLite` database and bringing its schema up to date.

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::StorageError;

/// Where the rules, tasks and execution logs live.
pub struct Config {
    /// sqlx URL, e.g. `sqlite:minicrm.db?mode=rwc` or `sqlite::memory:`.
    pub database_url: String,
}

impl Config {
    /// Open the pool and apply the embedded migrations.
    ///
    /// The database file is created when it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the URL is malformed, the database
    /// cannot be opened, or a migration fails.
    pub async fn build(self) -> Result<Database, StorageError> {
        let options =
            SqliteConnectOptions::from_str(&self.database_url)?.create_if_missing(true);

        // an in-memory database lives as long as its last connection
        let pool = if self.database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!("schema up to date");

        Ok(Database { pool })
    }
}

/// An open, migrated database.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// The pool, for handing to repositories. Clones share connections.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
