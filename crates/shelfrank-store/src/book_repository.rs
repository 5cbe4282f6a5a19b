use shelfrank_core::{timestamp, Book, BookId, BookStore, CoreError, CoreResult};
use sqlx::sqlite::SqliteRow;
use sqlx::{query, Executor, Row, Sqlite, SqlitePool};

/// SQLite-backed repository for catalog books.
pub struct SqliteBookStore {
    pool: SqlitePool,
}

impl SqliteBookStore {
    /// Creates a new repository backed by the provided pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool (useful for composing with other services).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts a book via the supplied executor.
    pub async fn create_with_executor<'e, E>(executor: E, book: &Book) -> CoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        query(
            r#"
            INSERT INTO books (book_id, title, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(book.book_id.to_bytes().to_vec())
        .bind(&book.title)
        .bind(timestamp::encode(book.created_at))
        .bind(timestamp::encode(book.updated_at))
        .execute(executor)
        .await
        .map(|_| ())
        .map_err(|err| map_sqlx_error("book", book.book_id.to_string(), err))
    }

    /// Updates a book via the supplied executor. `created_at` is immutable.
    pub async fn update_with_executor<'e, E>(executor: E, book: &Book) -> CoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = query(
            r#"
            UPDATE books
               SET title = ?2,
                   updated_at = ?3
             WHERE book_id = ?1
            "#,
        )
        .bind(book.book_id.to_bytes().to_vec())
        .bind(&book.title)
        .bind(timestamp::encode(book.updated_at))
        .execute(executor)
        .await
        .map_err(|err| map_sqlx_error("book", book.book_id.to_string(), err))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("book", book.book_id.to_string()));
        }
        Ok(())
    }

    /// Deletes a book via the supplied executor, cascading to its reviews.
    pub async fn delete_with_executor<'e, E>(executor: E, book_id: BookId) -> CoreResult<()>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = query(
            r#"
            DELETE FROM books
             WHERE book_id = ?1
            "#,
        )
        .bind(book_id.to_bytes().to_vec())
        .execute(executor)
        .await
        .map_err(|err| map_sqlx_error("book", book_id.to_string(), err))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("book", book_id.to_string()));
        }
        Ok(())
    }

    fn map_row(row: SqliteRow) -> CoreResult<Book> {
        let book_bytes: Vec<u8> = row.get("book_id");
        let book_id = BookId::from_bytes(&book_bytes)
            .map_err(|err| CoreError::internal(err.to_string()))?;
        let title: String = row.get("title");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        Ok(Book {
            book_id,
            title,
            created_at: timestamp::decode(&created_at)?,
            updated_at: timestamp::decode(&updated_at)?,
        })
    }
}

#[async_trait::async_trait]
impl BookStore for SqliteBookStore {
    async fn create(&self, book: &Book) -> CoreResult<()> {
        Self::create_with_executor(&self.pool, book).await
    }

    async fn get(&self, book_id: BookId) -> CoreResult<Option<Book>> {
        let row = query(
            r#"
            SELECT book_id, title, created_at, updated_at
              FROM books
             WHERE book_id = ?1
            "#,
        )
        .bind(book_id.to_bytes().to_vec())
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| CoreError::storage(err.to_string()))?;

        match row {
            Some(row) => Ok(Some(Self::map_row(row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> CoreResult<Vec<Book>> {
        let rows = query(
            r#"
            SELECT book_id, title, created_at, updated_at
              FROM books
          ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|err| CoreError::storage(err.to_string()))?;

        rows.into_iter().map(Self::map_row).collect()
    }

    async fn update(&self, book: &Book) -> CoreResult<()> {
        Self::update_with_executor(&self.pool, book).await
    }

    async fn delete(&self, book_id: BookId) -> CoreResult<()> {
        Self::delete_with_executor(&self.pool, book_id).await
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
