//! Genres and languages repository

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    models::{Genre, Language},
};

use super::PgRepository;

#[async_trait]
pub trait TaxonomyRepository: Send + Sync {
    async fn list_genres(&self) -> AppResult<Vec<Genre>>;
    /// Genres among `ids` that exist
    async fn find_genres(&self, ids: &[i32]) -> AppResult<Vec<Genre>>;
    async fn create_genre(&self, name: &str) -> AppResult<i32>;
    /// Count genres, optionally only those whose name contains `name_contains` (any case)
    async fn count_genres(&self, name_contains: Option<&str>) -> AppResult<i64>;
    async fn list_languages(&self) -> AppResult<Vec<Language>>;
    async fn get_language(&self, id: i32) -> AppResult<Language>;
    async fn create_language(&self, name: &str) -> AppResult<i32>;
}

#[async_trait]
impl TaxonomyRepository for PgRepository {
    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn find_genres(&self, ids: &[i32]) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            "SELECT id, name FROM genres WHERE id = ANY($1) ORDER BY name, id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn create_genre(&self, name: &str) -> AppResult<i32> {
        let id = sqlx::query_scalar::<_, i32>("INSERT INTO genres (name) VALUES ($1) RETURNING id")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn count_genres(&self, name_contains: Option<&str>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM genres WHERE $1::TEXT IS NULL OR strpos(lower(name), lower($1)) > 0",
        )
        .bind(name_contains)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn list_languages(&self) -> AppResult<Vec<Language>> {
        let languages =
            sqlx::query_as::<_, Language>("SELECT id, name FROM languages ORDER BY name, id")
                .fetch_all(&self.pool)
                .await?;
        Ok(languages)
    }

    async fn get_language(&self, id: i32) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("SELECT id, name FROM languages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Language with id {} not found", id)))
    }

    async fn create_language(&self, name: &str) -> AppResult<i32> {
        let id =
            sqlx::query_scalar::<_, i32>("INSERT INTO languages (name) VALUES ($1) RETURNING id")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(id)
    }
}
