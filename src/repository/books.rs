//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Sqlite};

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, NewBook},
};

const BOOK_COLUMNS: &str = "id, title, author, genre, total_pages";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Sqlite>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create the `book` table if it does not exist yet
    pub async fn ensure_schema(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS book (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                title       VARCHAR(100) NOT NULL UNIQUE,
                author      VARCHAR(100) NOT NULL,
                genre       VARCHAR(100) NOT NULL,
                total_pages INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Turn a title uniqueness violation into a conflict
fn write_error(e: sqlx::Error, title: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict(format!("A book titled '{}' already exists", title))
        }
        e => AppError::Database(e),
    }
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

// Statements with RETURNING are drained with fetch_all: SQLite only finishes
// the statement, and with it the implicit transaction, once every row has
// been stepped.
#[async_trait]
impl BookStore for BooksRepository {
    async fn insert(&self, book: &NewBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO book (title, author, genre, total_pages)
            VALUES (?, ?, ?, ?)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.total_pages)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| write_error(e, &book.title))?
        .pop()
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))
    }

    async fn fetch_all(&self) -> AppResult<Vec<Book>> {
        let rows = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM book ORDER BY id",
            BOOK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn fetch_by_id(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!("SELECT {} FROM book WHERE id = ?", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn update(&self, id: i64, book: &NewBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE book
            SET title = ?, author = ?, genre = ?, total_pages = ?
            WHERE id = ?
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.total_pages)
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| write_error(e, &book.title))?
        .pop()
        .ok_or_else(|| not_found(id))
    }

    async fn delete(&self, id: i64) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            "DELETE FROM book WHERE id = ? RETURNING {}",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .pop()
        .ok_or_else(|| not_found(id))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
