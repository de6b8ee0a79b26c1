//! Authors repository

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    models::{author::AuthorForm, page::PageWindow, Author},
};

use super::{foreign_key_violation, PgRepository};

#[async_trait]
pub trait AuthorsRepository: Send + Sync {
    /// Page of authors in id order, with the total count
    async fn list_authors(&self, window: PageWindow) -> AppResult<(Vec<Author>, i64)>;
    async fn get_author(&self, id: i32) -> AppResult<Author>;
    async fn create_author(&self, form: &AuthorForm) -> AppResult<i32>;
    async fn update_author(&self, id: i32, form: &AuthorForm) -> AppResult<()>;
    async fn delete_author(&self, id: i32) -> AppResult<()>;
    async fn count_authors(&self) -> AppResult<i64>;
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Author with id {} not found", id))
}

#[async_trait]
impl AuthorsRepository for PgRepository {
    async fn list_authors(&self, window: PageWindow) -> AppResult<(Vec<Author>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;

        let authors = sqlx::query_as::<_, Author>(
            r#"
            SELECT id, first_name, last_name, date_of_birth, date_of_death
            FROM authors
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((authors, total))
    }

    async fn get_author(&self, id: i32) -> AppResult<Author> {
        sqlx::query_as::<_, Author>(
            "SELECT id, first_name, last_name, date_of_birth, date_of_death FROM authors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn create_author(&self, form: &AuthorForm) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO authors (first_name, last_name, date_of_birth, date_of_death)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&form.first_name)
        .bind(&form.last_name)
        .bind(form.date_of_birth)
        .bind(form.date_of_death)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_author(&self, id: i32, form: &AuthorForm) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE authors
            SET first_name = $2, last_name = $3, date_of_birth = $4, date_of_death = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&form.first_name)
        .bind(&form.last_name)
        .bind(form.date_of_birth)
        .bind(form.date_of_death)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn delete_author(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM authors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| foreign_key_violation(e, "Author is still referenced by books"))?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn count_authors(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
