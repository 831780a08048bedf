//! Repository layer for database operations

pub mod books;

use std::{str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Pool, Sqlite,
};

use crate::{
    config::DatabaseConfig,
    error::AppResult,
    models::book::{Book, NewBook},
};

/// Durable CRUD primitives over the `book` table.
///
/// Each mutating call is a single statement, so it either commits entirely
/// or leaves the table untouched.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persist a new book and return it with its assigned id
    async fn insert(&self, book: &NewBook) -> AppResult<Book>;

    /// Every stored book, in insertion order
    async fn fetch_all(&self) -> AppResult<Vec<Book>>;

    async fn fetch_by_id(&self, id: i64) -> AppResult<Book>;

    /// Replace all mutable fields of an existing book
    async fn update(&self, id: i64, book: &NewBook) -> AppResult<Book>;

    /// Remove a book, returning the row as it was before removal
    async fn delete(&self, id: i64) -> AppResult<Book>;

    /// Round-trip to the storage engine
    async fn ping(&self) -> AppResult<()>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Sqlite>,
    pub books: books::BooksRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            pool,
        }
    }

    /// Open the connection pool and make sure the schema exists
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_millis(config.busy_timeout_ms));

        // Idle connections are kept alive: an in-memory database disappears
        // together with its last connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let repository = Self::new(pool);
        repository.books.ensure_schema().await?;
        Ok(repository)
    }

    /// Book store handle for the service layer
    pub fn book_store(&self) -> Arc<dyn BookStore> {
        Arc::new(self.books.clone())
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
