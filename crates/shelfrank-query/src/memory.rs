//! In-memory execution of ranking plans.
//!
//! Implements the same result contract as the SQLite engine over plain
//! vectors. Handy for tests and for small fixtures that never touch a
//! database, and it doubles as an executable description of the aggregate
//! semantics: count is the size of the windowed review set, average is its
//! mean rating or absent when the set is empty.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use shelfrank_core::{Book, BookId, BookStats, CoreResult, RankedBook, Review, ReviewWindow};

use crate::engine::RankingEngine;
use crate::plan::{DerivedColumn, Direction, RankingPlan};

/// Ranking engine over in-memory books and reviews.
#[derive(Default)]
pub struct MemoryRankingEngine {
    books: RwLock<Vec<Book>>,
    reviews: RwLock<Vec<Review>>,
}

impl MemoryRankingEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a book to the catalog.
    pub fn insert_book(&self, book: Book) {
        self.books.write().push(book);
    }

    /// Adds a review.
    pub fn insert_review(&self, review: Review) {
        self.reviews.write().push(review);
    }

    fn compute(&self, plan: &RankingPlan) -> Vec<RankedBook> {
        let books = self.books.read();
        let reviews = self.reviews.read();

        let mut rows: Vec<RankedBook> = books
            .iter()
            .filter(|book| title_matches(plan.title(), &book.title))
            .map(|book| {
                let book_reviews: Vec<Review> = reviews
                    .iter()
                    .filter(|review| review.book_id == book.book_id)
                    .cloned()
                    .collect();
                RankedBook {
                    book: book.clone(),
                    reviews_count: plan
                        .count_window()
                        .map(|window| windowed_count(&book_reviews, window)),
                    reviews_avg_rating: plan
                        .avg_window()
                        .and_then(|window| windowed_avg(&book_reviews, window)),
                }
            })
            .collect();

        if let Some(min) = plan.min_reviews() {
            let min = u64::from(min);
            rows.retain(|row| row.reviews_count.is_some_and(|count| count >= min));
        }

        if let Some(sort) = plan.sort() {
            match sort.column {
                DerivedColumn::ReviewsCount => {
                    rows.sort_by(|a, b| {
                        directed(a.reviews_count.cmp(&b.reviews_count), sort.direction)
                    });
                }
                DerivedColumn::ReviewsAvgRating => {
                    // Books without an average drop out of rating-ordered results.
                    rows.retain(|row| row.reviews_avg_rating.is_some());
                    rows.sort_by(|a, b| {
                        let ord = a
                            .reviews_avg_rating
                            .partial_cmp(&b.reviews_avg_rating)
                            .unwrap_or(Ordering::Equal);
                        directed(ord, sort.direction)
                    });
                }
            }
        }

        rows
    }
}

#[async_trait]
impl RankingEngine for MemoryRankingEngine {
    async fn rank(&self, plan: &RankingPlan) -> CoreResult<Vec<RankedBook>> {
        Ok(self.compute(plan))
    }

    async fn book_stats(&self, book_id: BookId) -> CoreResult<Option<BookStats>> {
        let books = self.books.read();
        if !books.iter().any(|book| book.book_id == book_id) {
            return Ok(None);
        }

        let reviews = self.reviews.read();
        let book_reviews: Vec<Review> = reviews
            .iter()
            .filter(|review| review.book_id == book_id)
            .cloned()
            .collect();
        let all_time = ReviewWindow::unbounded();

        Ok(Some(BookStats {
            reviews_count: windowed_count(&book_reviews, &all_time),
            reviews_avg_rating: windowed_avg(&book_reviews, &all_time),
            computed_at: Utc::now(),
        }))
    }
}

fn windowed_count(reviews: &[Review], window: &ReviewWindow) -> u64 {
    window.filter(reviews).len() as u64
}

fn windowed_avg(reviews: &[Review], window: &ReviewWindow) -> Option<f64> {
    let qualifying = window.filter(reviews);
    if qualifying.is_empty() {
        return None;
    }
    let total: u32 = qualifying
        .iter()
        .map(|review| u32::from(review.rating))
        .sum();
    Some(f64::from(total) / qualifying.len() as f64)
}

// ASCII-only fold, matching what SQLite's `LIKE` does for the other engine.
fn title_matches(needle: Option<&str>, title: &str) -> bool {
    match needle {
        Some(needle) => title
            .to_ascii_lowercase()
            .contains(&needle.to_ascii_lowercase()),
        None => true,
    }
}

fn directed(ord: Ordering, direction: Direction) -> Ordering {
    match direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}
