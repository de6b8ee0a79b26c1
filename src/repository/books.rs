//! Books repository

use async_trait::async_trait;
use sqlx::{Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{book::BookForm, page::PageWindow, Book, BookSummary, Genre},
};

use super::{foreign_key_violation, unique_violation, PgRepository};

#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// Page of books in id order, with the total count
    async fn list_books(&self, window: PageWindow) -> AppResult<(Vec<BookSummary>, i64)>;
    async fn list_books_by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>>;
    /// Book with its genres
    async fn get_book(&self, id: i32) -> AppResult<Book>;
    async fn create_book(&self, form: &BookForm) -> AppResult<i32>;
    async fn update_book(&self, id: i32, form: &BookForm) -> AppResult<()>;
    async fn delete_book(&self, id: i32) -> AppResult<()>;
    /// Whether another book already uses `isbn`
    async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool>;
    /// Count books, optionally only those whose title contains `title_contains` (any case)
    async fn count_books(&self, title_contains: Option<&str>) -> AppResult<i64>;
    async fn count_books_by_author(&self, author_id: i32) -> AppResult<i64>;
}

const DUPLICATE_ISBN: &str = "A book with this ISBN already exists";

const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.title, b.isbn, b.author_id,
           CASE WHEN a.id IS NULL THEN NULL
                ELSE a.last_name || ', ' || a.first_name END AS author_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
"#;

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", id))
}

impl PgRepository {
    /// Load all genres for a book via the book_genres junction table
    async fn get_book_genres(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = $1
            ORDER BY g.name, g.id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }
}

async fn insert_book_genres(
    tx: &mut Transaction<'_, Postgres>,
    book_id: i32,
    genre_ids: &[i32],
) -> AppResult<()> {
    for genre_id in genre_ids {
        sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2)")
            .bind(book_id)
            .bind(genre_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl BooksRepository for PgRepository {
    async fn list_books(&self, window: PageWindow) -> AppResult<(Vec<BookSummary>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        let query = format!("{} ORDER BY b.id LIMIT $1 OFFSET $2", SUMMARY_SELECT);
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(window.limit())
            .bind(window.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    async fn list_books_by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>> {
        let query = format!("{} WHERE b.author_id = $1 ORDER BY b.id", SUMMARY_SELECT);
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        let mut book = sqlx::query_as::<_, Book>(
            "SELECT id, title, summary, isbn, author_id, language_id FROM books WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))?;

        book.genres = self.get_book_genres(id).await?;
        Ok(book)
    }

    async fn create_book(&self, form: &BookForm) -> AppResult<i32> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO books (title, summary, isbn, author_id, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&form.title)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.author_id)
        .bind(form.language_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_ISBN))?;

        insert_book_genres(&mut tx, id, &form.distinct_genre_ids()).await?;
        tx.commit().await?;

        Ok(id)
    }

    async fn update_book(&self, id: i32, form: &BookForm) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, summary = $3, isbn = $4, author_id = $5, language_id = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&form.title)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.author_id)
        .bind(form.language_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| unique_violation(e, DUPLICATE_ISBN))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_book_genres(&mut tx, id, &form.distinct_genre_ids()).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn delete_book(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| foreign_key_violation(e, "Book still has copies"))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::INTEGER IS NULL OR id <> $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn count_books(&self, title_contains: Option<&str>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE $1::TEXT IS NULL OR strpos(lower(title), lower($1)) > 0",
        )
        .bind(title_contains)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_books_by_author(&self, author_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
