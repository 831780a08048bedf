//! Book resource service

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::book::{parse_book_id, BookPayload, BookResponse},
    repository::BookStore,
};

#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn BookStore>,
}

impl BooksService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Validate and persist a new book
    pub async fn create_book(&self, payload: BookPayload) -> AppResult<BookResponse> {
        let data = payload.into_new_book()?;
        let book = self.store.insert(&data).await?;
        tracing::info!("Created book id={} title={:?}", book.id, book.title);
        Ok(book.into())
    }

    pub async fn list_books(&self) -> AppResult<Vec<BookResponse>> {
        let books = self.store.fetch_all().await?;
        tracing::debug!("Listing {} books", books.len());
        Ok(books.into_iter().map(BookResponse::from).collect())
    }

    pub async fn get_book(&self, raw_id: &str) -> AppResult<BookResponse> {
        let id = parse_book_id(raw_id)?;
        let book = self.store.fetch_by_id(id).await?;
        Ok(book.into())
    }

    /// Replace every field of an existing book
    pub async fn update_book(&self, raw_id: &str, payload: BookPayload) -> AppResult<BookResponse> {
        let id = parse_book_id(raw_id)?;
        let data = payload.into_new_book()?;
        let book = self.store.update(id, &data).await?;
        tracing::info!("Updated book id={}", book.id);
        Ok(book.into())
    }

    /// Delete a book, returning what was removed
    pub async fn delete_book(&self, raw_id: &str) -> AppResult<BookResponse> {
        let id = parse_book_id(raw_id)?;
        let book = self.store.delete(id).await?;
        tracing::info!("Deleted book id={} title={:?}", book.id, book.title);
        Ok(book.into())
    }

    /// Check that storage is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}
