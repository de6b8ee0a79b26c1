//! Catalog statistics and the home page visit counter

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::LoanStatus,
    repository::{
        AuthorsRepository, BooksRepository, InstancesRepository, Repository, TaxonomyRepository,
    },
    services::session::SessionStore,
};

/// Genres whose name contains this (any case) are counted as fiction
const FICTION_GENRE_MATCH: &str = "fiction";
/// Books whose title contains this (any case) are counted separately
const FEATURED_TITLE_MATCH: &str = "harry";

/// Row counts shown on the home page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogStats {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    pub num_genres_fiction: i64,
    pub num_books_harrypotter: i64,
}

/// Home page: catalog statistics plus the session's visit count
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HomeView {
    pub stats: CatalogStats,
    /// Visits in this session before the current one
    pub num_visits: i64,
}

#[derive(Clone)]
pub struct StatsService {
    repository: Arc<dyn Repository>,
    sessions: Arc<dyn SessionStore>,
}

impl StatsService {
    pub fn new(repository: Arc<dyn Repository>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            repository,
            sessions,
        }
    }

    /// Count catalog rows. Read-only.
    pub async fn catalog_stats(&self) -> AppResult<CatalogStats> {
        let repo = &self.repository;
        Ok(CatalogStats {
            num_books: repo.count_books(None).await?,
            num_instances: repo.count_instances(None).await?,
            num_instances_available: repo.count_instances(Some(LoanStatus::Available)).await?,
            num_authors: repo.count_authors().await?,
            num_genres: repo.count_genres(None).await?,
            num_genres_fiction: repo.count_genres(Some(FICTION_GENRE_MATCH)).await?,
            num_books_harrypotter: repo.count_books(Some(FEATURED_TITLE_MATCH)).await?,
        })
    }

    /// Statistics for the home page; counts this request as a visit of `session_id`
    pub async fn home(&self, session_id: &str) -> AppResult<HomeView> {
        let stats = self.catalog_stats().await?;
        let num_visits = self.sessions.record_visit(session_id).await?;
        tracing::debug!("Session {} has {} previous visits", session_id, num_visits);
        Ok(HomeView { stats, num_visits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::{AuthorForm, BookForm, InstanceForm},
        repository::{
            AuthorsRepository, BooksRepository, InstancesRepository, MemoryRepository,
            TaxonomyRepository,
        },
        services::session::{MemorySessionStore, MockSessionStore},
    };
    use std::time::Duration;

    async fn seeded_repository() -> Arc<MemoryRepository> {
        let repo = Arc::new(MemoryRepository::new());
        let author_id = repo
            .create_author(&AuthorForm {
                first_name: "Joanne".to_string(),
                last_name: "Rowling".to_string(),
                date_of_birth: None,
                date_of_death: None,
            })
            .await
            .unwrap();
        let language_id = repo.create_language("English").await.unwrap();
        for genre in ["Science Fiction", "Fantasy", "Non-FICTION", "Poetry"] {
            repo.create_genre(genre).await.unwrap();
        }
        let mut book_ids = Vec::new();
        for (title, isbn) in [
            ("Harry Potter and the Philosopher's Stone", "1"),
            ("The Casual Vacancy", "2"),
            ("The Tales of Beedle the Bard, a HARRY Potter Companion", "3"),
        ] {
            book_ids.push(
                repo.create_book(&BookForm {
                    title: title.to_string(),
                    author_id,
                    summary: "summary".to_string(),
                    isbn: isbn.to_string(),
                    language_id,
                    genre_ids: vec![],
                })
                .await
                .unwrap(),
            );
        }
        for status in [LoanStatus::Available, LoanStatus::Available, LoanStatus::Maintenance] {
            repo.create_instance(&InstanceForm {
                book_id: book_ids[0],
                imprint: "Bloomsbury".to_string(),
                status,
                due_back: None,
                borrower_id: None,
            })
            .await
            .unwrap();
        }
        repo
    }

    #[tokio::test]
    async fn stats_count_filtered_rows() {
        let repo = seeded_repository().await;
        let service = StatsService::new(
            repo,
            Arc::new(MemorySessionStore::new(Duration::from_secs(3600))),
        );

        let stats = service.catalog_stats().await.unwrap();
        assert_eq!(
            stats,
            CatalogStats {
                num_books: 3,
                num_instances: 3,
                num_instances_available: 2,
                num_authors: 1,
                num_genres: 4,
                num_genres_fiction: 2,
                num_books_harrypotter: 2,
            }
        );

        // Read-only: asking twice gives the same answer
        assert_eq!(service.catalog_stats().await.unwrap(), stats);
    }

    #[tokio::test]
    async fn home_reports_visits_before_this_one() {
        let repo = seeded_repository().await;
        let service = StatsService::new(
            repo,
            Arc::new(MemorySessionStore::new(Duration::from_secs(3600))),
        );

        for expected in 0..3 {
            let home = service.home("session-a").await.unwrap();
            assert_eq!(home.num_visits, expected);
        }
        assert_eq!(service.home("session-b").await.unwrap().num_visits, 0);
    }

    #[tokio::test]
    async fn home_uses_the_session_store() {
        let mut sessions = MockSessionStore::new();
        sessions
            .expect_record_visit()
            .times(1)
            .returning(|id| {
                assert_eq!(id, "s1");
                Ok(41)
            });
        let service = StatsService::new(Arc::new(MemoryRepository::new()), Arc::new(sessions));

        let home = service.home("s1").await.unwrap();
        assert_eq!(home.num_visits, 41);
        assert_eq!(home.stats.num_books, 0);
    }

    #[tokio::test]
    async fn session_store_failure_is_reported() {
        let mut sessions = MockSessionStore::new();
        sessions
            .expect_record_visit()
            .returning(|_| Err(AppError::Internal("redis down".to_string())));
        let service = StatsService::new(Arc::new(MemoryRepository::new()), Arc::new(sessions));

        assert!(matches!(
            service.home("s1").await,
            Err(AppError::Internal(_))
        ));
    }
}
