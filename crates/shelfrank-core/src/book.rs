use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::BookId;

/// A book in the catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Unique book identifier.
    pub book_id: BookId,
    /// Display title, matched case-insensitively by title queries.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Creates a book stamped with the current time.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            book_id: BookId::new(),
            title: title.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the creation timestamp, for backdated fixtures and imports.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    /// Bumps `updated_at` to the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// One row of a ranking result: a book plus whichever derived aggregate
/// columns the query attached.
///
/// A `None` count means the query never asked for one. A `None` average means
/// either the query never asked for one or no review fell inside the average's
/// window; a book without qualifying reviews has no average rather than an
/// average of zero.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedBook {
    /// The underlying catalog book.
    pub book: Book,
    /// Number of reviews inside the count window, zero when none qualify.
    pub reviews_count: Option<u64>,
    /// Mean star rating over the average window.
    pub reviews_avg_rating: Option<f64>,
}

/// All-time aggregate snapshot for a single book, the unit held by the
/// aggregate cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BookStats {
    /// Total number of reviews on record.
    pub reviews_count: u64,
    /// Mean star rating, absent while the book has no reviews.
    pub reviews_avg_rating: Option<f64>,
    /// When the snapshot was computed.
    pub computed_at: DateTime<Utc>,
}
