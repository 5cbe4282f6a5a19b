use async_trait::async_trait;

use crate::book::{Book, BookStats};
use crate::error::CoreResult;
use crate::ids::{BookId, ReviewId};
use crate::review::Review;

/// Repository interface for catalog books.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persists a newly created book.
    async fn create(&self, book: &Book) -> CoreResult<()>;

    /// Fetches a book by its identifier.
    async fn get(&self, book_id: BookId) -> CoreResult<Option<Book>>;

    /// Returns all books in the catalog ordered by creation time.
    async fn list(&self) -> CoreResult<Vec<Book>>;

    /// Updates an existing book.
    async fn update(&self, book: &Book) -> CoreResult<()>;

    /// Permanently deletes a book and cascades to its reviews.
    async fn delete(&self, book_id: BookId) -> CoreResult<()>;
}

/// Repository interface for reader reviews.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Persists a newly created review after validating its rating.
    async fn create(&self, review: &Review) -> CoreResult<()>;

    /// Fetches a review by its identifier.
    async fn get(&self, review_id: ReviewId) -> CoreResult<Option<Review>>;

    /// Lists all reviews of one book ordered by creation time.
    async fn list_by_book(&self, book_id: BookId) -> CoreResult<Vec<Review>>;

    /// Deletes a review.
    async fn delete(&self, review_id: ReviewId) -> CoreResult<()>;
}

/// Keyed store of per-book aggregate snapshots.
///
/// Implementations decide capacity and residency. Callers own coherence:
/// book mutations must evict the touched key before they report success, and
/// reads treat a miss as a signal to recompute. Evicting a key that is not
/// resident is a successful no-op.
#[async_trait]
pub trait AggregateCache: Send + Sync {
    /// Returns the cached snapshot for a book, if one is resident.
    async fn get(&self, book_id: BookId) -> CoreResult<Option<BookStats>>;

    /// Stores a freshly computed snapshot under the book's key.
    async fn insert(&self, book_id: BookId, stats: BookStats) -> CoreResult<()>;

    /// Drops the snapshot for a book. Absent keys are not an error.
    async fn evict(&self, book_id: BookId) -> CoreResult<()>;
}
