use std::sync::Arc;

use shelfrank_core::{AggregateCache, Book, BookId, BookStore, CoreResult};
use tracing::warn;

/// Write path for books that keeps the aggregate cache coherent.
///
/// Every successful update or delete evicts the book's cached snapshot, and
/// the eviction completes before the call returns, so a reader running after
/// a mutation can never observe the pre-mutation snapshot. Creates skip
/// eviction since a brand-new book has nothing cached. A failed eviction is
/// logged and swallowed: the write already happened, and the snapshot will be
/// recomputed on the next cache miss.
pub struct BookMutationService {
    books: Arc<dyn BookStore>,
    cache: Arc<dyn AggregateCache>,
}

impl BookMutationService {
    /// Creates a mutation service over the given store and cache.
    pub fn new(books: Arc<dyn BookStore>, cache: Arc<dyn AggregateCache>) -> Self {
        Self { books, cache }
    }

    /// Persists a new book.
    pub async fn create_book(&self, book: &Book) -> CoreResult<()> {
        self.books.create(book).await
    }

    /// Updates a book, then evicts its cached snapshot.
    pub async fn update_book(&self, book: &Book) -> CoreResult<()> {
        self.books.update(book).await?;
        self.evict(book.book_id).await;
        Ok(())
    }

    /// Deletes a book, then evicts its cached snapshot.
    pub async fn delete_book(&self, book_id: BookId) -> CoreResult<()> {
        self.books.delete(book_id).await?;
        self.evict(book_id).await;
        Ok(())
    }

    async fn evict(&self, book_id: BookId) {
        if let Err(err) = self.cache.evict(book_id).await {
            warn!(%book_id, error = %err, "aggregate cache eviction failed; stale snapshot may linger");
        }
    }
}
