use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BookId, ReviewId};

/// A reader review attached to one book.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Unique review identifier.
    pub review_id: ReviewId,
    /// Book this review belongs to.
    pub book_id: BookId,
    /// Star rating between [`Review::MIN_RATING`] and [`Review::MAX_RATING`].
    pub rating: u8,
    /// Free-form review text.
    pub body: String,
    /// Creation timestamp, the axis every review window filters on.
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Lowest accepted star rating.
    pub const MIN_RATING: u8 = 1;

    /// Highest accepted star rating.
    pub const MAX_RATING: u8 = 5;

    /// Creates a review stamped with the current time.
    #[must_use]
    pub fn new(book_id: BookId, rating: u8, body: impl Into<String>) -> Self {
        Self {
            review_id: ReviewId::new(),
            book_id,
            rating,
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    /// Replaces the creation timestamp, for backdated fixtures and imports.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Validates the star rating.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when the rating falls outside the
    /// accepted one-to-five band.
    pub fn validate_rating(&self) -> Result<(), String> {
        if (Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating) {
            Ok(())
        } else {
            Err(format!(
                "rating must be between {} and {}, got {}",
                Self::MIN_RATING,
                Self::MAX_RATING,
                self.rating
            ))
        }
    }
}
