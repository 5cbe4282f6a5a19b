use shelfrank_core::{timestamp, BookId, CoreError, CoreResult, Review, ReviewId, ReviewStore};
use sqlx::sqlite::SqliteRow;
use sqlx::{query, Executor, Row, Sqlite, SqlitePool};

/// SQLite-backed repository for reader reviews.
pub struct SqliteReviewStore {
    pool: SqlitePool,
}

impl SqliteReviewStore {
    /// Creates a new repository backed by the provided pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a review via the supplied executor.
    ///
    /// The rating is validated before touching the database so a rejected
    /// review surfaces as a validation error, not a constraint failure.
    pub async fn create_with_executor<'e, E>(executor: E, review: &Review) -> CoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        review.validate_rating().map_err(CoreError::validation)?;

        query(
            r#"
            INSERT INTO reviews (review_id, book_id, rating, body, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(review.review_id.to_bytes().to_vec())
        .bind(review.book_id.to_bytes().to_vec())
        .bind(i64::from(review.rating))
        .bind(&review.body)
        .bind(timestamp::encode(review.created_at))
        .execute(executor)
        .await
        .map(|_| ())
        .map_err(|err| map_sqlx_error("review", review.review_id.to_string(), err))
    }

    /// Deletes a review via the supplied executor.
    pub async fn delete_with_executor<'e, E>(executor: E, review_id: ReviewId) -> CoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = query(
            r#"
            DELETE FROM reviews
             WHERE review_id = ?1
            "#,
        )
        .bind(review_id.to_bytes().to_vec())
        .execute(executor)
        .await
        .map_err(|err| map_sqlx_error("review", review_id.to_string(), err))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("review", review_id.to_string()));
        }
        Ok(())
    }

    fn map_row(row: SqliteRow) -> CoreResult<Review> {
        let review_bytes: Vec<u8> = row.get("review_id");
        let book_bytes: Vec<u8> = row.get("book_id");
        let review_id = ReviewId::from_bytes(&review_bytes)
            .map_err(|err| CoreError::internal(err.to_string()))?;
        let book_id = BookId::from_bytes(&book_bytes)
            .map_err(|err| CoreError::internal(err.to_string()))?;
        let rating: i64 = row.get("rating");
        let rating = u8::try_from(rating)
            .map_err(|_| CoreError::internal("rating stored out of range"))?;
        let body: String = row.get("body");
        let created_at: String = row.get("created_at");

        Ok(Review {
            review_id,
            book_id,
            rating,
            body,
            created_at: timestamp::decode(&created_at)?,
        })
    }
}

#[async_trait::async_trait]
impl ReviewStore for SqliteReviewStore {
    async fn create(&self, review: &Review) -> CoreResult<()> {
        Self::create_with_executor(&self.pool, review).await
    }

    async fn get(&self, review_id: ReviewId) -> CoreResult<Option<Review>> {
        let row = query(
            r#"
            SELECT review_id, book_id, rating, body, created_at
              FROM reviews
             WHERE review_id = ?1
            "#,
        )
        .bind(review_id.to_bytes().to_vec())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| CoreError::storage(err.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::map_row(row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_book(&self, book_id: BookId) -> CoreResult<Vec<Review>> {
        let rows = query(
            r#"
            SELECT review_id, book_id, rating, body, created_at
              FROM reviews
             WHERE book_id = ?1
          ORDER BY created_at ASC
            "#,
        )
        .bind(book_id.to_bytes().to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(|err| CoreError::storage(err.to_string()))?;

        rows.into_iter().map(Self::map_row).collect()
    }

    async fn delete(&self, review_id: ReviewId) -> CoreResult<()> {
        Self::delete_with_executor(&self.pool, review_id).await
    }
}

fn map_sqlx_error(entity: &'static str, id: String, err: sqlx::Error) -> CoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message().to_string();
            if message.contains("UNIQUE constraint failed") {
                CoreError::already_exists(entity, id)
            } else if message.contains("FOREIGN KEY constraint failed") {
                CoreError::validation("foreign key constraint failed".to_string())
            } else if message.contains("CHECK constraint failed") {
                CoreError::validation(format!("check constraint failed: {message}"))
            } else {
                CoreError::storage(message)
            }
        }
        other => CoreError::storage(other.to_string()),
    }
}
