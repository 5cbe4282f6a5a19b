//! SQLite execution of ranking plans.
//!
//! Each attached aggregate compiles to a correlated scalar subselect over the
//! reviews table, which lets the two derived columns aggregate over different
//! windows inside one statement. The subselects are projected in an inner
//! query; thresholds, the rating-order exclusion, and the final `ORDER BY`
//! run in an outer query where the derived columns are addressable by name.
//! Window bounds are bound as canonical timestamp text, which compares in
//! chronological order.

use async_trait::async_trait;
use chrono::Utc;
use shelfrank_core::{
    timestamp, Book, BookId, BookStats, CoreError, CoreResult, RankedBook, ReviewWindow,
};
use sqlx::sqlite::SqliteRow;
use sqlx::{query, Row, SqlitePool};
use tracing::debug;

use crate::engine::RankingEngine;
use crate::plan::{DerivedColumn, RankingPlan};

/// Ranking engine that pushes aggregation down into SQLite.
pub struct SqliteRankingEngine {
    pool: SqlitePool,
}

enum Bind {
    Text(String),
    Int(i64),
}

impl SqliteRankingEngine {
    /// Creates an engine backed by the provided pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool (useful for composing with other services).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Renders a plan to SQL plus its bind values, in placeholder order.
    fn render(plan: &RankingPlan) -> (String, Vec<Bind>) {
        let mut binds = Vec::new();

        let count_expr = match plan.count_window() {
            Some(window) => format!(
                "(SELECT COUNT(*) FROM reviews r WHERE r.book_id = b.book_id{})",
                window_predicate(window, &mut binds)
            ),
            None => "NULL".to_string(),
        };
        let avg_expr = match plan.avg_window() {
            Some(window) => format!(
                "(SELECT AVG(r.rating) FROM reviews r WHERE r.book_id = b.book_id{})",
                window_predicate(window, &mut binds)
            ),
            None => "NULL".to_string(),
        };

        let mut inner_where = String::new();
        if let Some(needle) = plan.title() {
            inner_where.push_str(" WHERE b.title LIKE ? ESCAPE '\\'");
            binds.push(Bind::Text(format!("%{}%", escape_like(needle))));
        }

        let mut sql = format!(
            "SELECT book_id, title, created_at, updated_at, reviews_count, reviews_avg_rating \
             FROM (SELECT b.book_id, b.title, b.created_at, b.updated_at, \
             {count_expr} AS reviews_count, {avg_expr} AS reviews_avg_rating \
             FROM books b{inner_where}) ranked"
        );

        let mut outer_predicates = Vec::new();
        if let Some(min) = plan.min_reviews() {
            outer_predicates.push("reviews_count >= ?".to_string());
            binds.push(Bind::Int(i64::from(min)));
        }
        if let Some(sort) = plan.sort() {
            // Rating-ordered rankings carry only books that have an average.
            if sort.column == DerivedColumn::ReviewsAvgRating {
                outer_predicates.push("reviews_avg_rating IS NOT NULL".to_string());
            }
        }
        if !outer_predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&outer_predicates.join(" AND "));
        }

        if let Some(sort) = plan.sort() {
            sql.push_str(" ORDER BY ");
            sql.push_str(sort.column.as_str());
            sql.push(' ');
            sql.push_str(sort.direction.as_sql());
        }

        (sql, binds)
    }

    fn map_row(row: SqliteRow) -> CoreResult<RankedBook> {
        let book_bytes: Vec<u8> = row.get("book_id");
        let book_id = BookId::from_bytes(&book_bytes)
            .map_err(|err| CoreError::internal(err.to_string()))?;
        let title: String = row.get("title");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");
        let reviews_count: Option<i64> = row.get("reviews_count");
        let reviews_count = reviews_count
            .map(|count| {
                u64::try_from(count)
                    .map_err(|_| CoreError::internal("review count stored negative value"))
            })
            .transpose()?;
        let reviews_avg_rating: Option<f64> = row.get("reviews_avg_rating");

        Ok(RankedBook {
            book: Book {
                book_id,
                title,
                created_at: timestamp::decode(&created_at)?,
                updated_at: timestamp::decode(&updated_at)?,
            },
            reviews_count,
            reviews_avg_rating,
        })
    }
}

#[async_trait]
impl RankingEngine for SqliteRankingEngine {
    async fn rank(&self, plan: &RankingPlan) -> CoreResult<Vec<RankedBook>> {
        let (sql, binds) = Self::render(plan);
        debug!(%sql, binds = binds.len(), "executing ranking plan");

        let mut stmt = query(&sql);
        for bind in &binds {
            stmt = match bind {
                Bind::Text(value) => stmt.bind(value),
                Bind::Int(value) => stmt.bind(*value),
            };
        }

        let rows = stmt
            .fetch_all(&self.pool)
            .await
            .map_err(|err| CoreError::storage(err.to_string()))?;

        let books = rows
            .into_iter()
            .map(Self::map_row)
            .collect::<CoreResult<Vec<_>>>()?;
        debug!(rows = books.len(), "ranking plan completed");
        Ok(books)
    }

    async fn book_stats(&self, book_id: BookId) -> CoreResult<Option<BookStats>> {
        let row = query(
            r#"
            SELECT (SELECT COUNT(*) FROM reviews r WHERE r.book_id = b.book_id) AS reviews_count,
                   (SELECT AVG(r.rating) FROM reviews r WHERE r.book_id = b.book_id) AS reviews_avg_rating
              FROM books b
             WHERE b.book_id = ?1
            "#,
        )
        .bind(book_id.to_bytes().to_vec())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| CoreError::storage(err.to_string()))?;

        match row {
            Some(row) => {
                let count: i64 = row.get("reviews_count");
                let reviews_avg_rating: Option<f64> = row.get("reviews_avg_rating");
                Ok(Some(BookStats {
                    reviews_count: u64::try_from(count)
                        .map_err(|_| CoreError::internal("review count stored negative value"))?,
                    reviews_avg_rating,
                    computed_at: Utc::now(),
                }))
            }
            None => Ok(None),
        }
    }
}

fn window_predicate(window: &ReviewWindow, binds: &mut Vec<Bind>) -> String {
    let mut predicate = String::new();
    if let Some(from) = window.from {
        predicate.push_str(" AND r.created_at >= ?");
        binds.push(Bind::Text(timestamp::encode(from)));
    }
    if let Some(to) = window.to {
        predicate.push_str(" AND r.created_at <= ?");
        binds.push(Bind::Text(timestamp::encode(to)));
    }
    predicate
}

fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
