//! Record management: create, update and delete catalog records

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{AuthorForm, BookForm, GenreForm, InstanceForm, LanguageForm},
    repository::{
        AuthorsRepository, BooksRepository, InstancesRepository, Repository, TaxonomyRepository,
    },
};

/// A form field pointing at a missing row is bad input, not a missing resource
fn reference<T>(lookup: AppResult<T>, message: String) -> AppResult<()> {
    match lookup {
        Ok(_) => Ok(()),
        Err(AppError::NotFound(_)) => Err(AppError::Validation(message)),
        Err(e) => Err(e),
    }
}

#[derive(Clone)]
pub struct RecordsService {
    repository: Arc<dyn Repository>,
}

impl RecordsService {
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    // Authors

    pub async fn create_author(&self, form: &AuthorForm) -> AppResult<i32> {
        let form = form.normalized();
        form.validate()?;
        let id = self.repository.create_author(&form).await?;
        tracing::info!("Created author {} ({}, {})", id, form.last_name, form.first_name);
        Ok(id)
    }

    pub async fn update_author(&self, id: i32, form: &AuthorForm) -> AppResult<()> {
        self.repository.get_author(id).await?;
        let form = form.normalized();
        form.validate()?;
        self.repository.update_author(id, &form).await?;
        tracing::info!("Updated author {}", id);
        Ok(())
    }

    /// Delete an author. Refused while books still reference it.
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.get_author(id).await?;

        let books = self.repository.count_books_by_author(id).await?;
        if books > 0 {
            return Err(AppError::Conflict(format!(
                "Author {} still has {} book(s); delete them first",
                id, books
            )));
        }

        self.repository.delete_author(id).await?;
        tracing::info!("Deleted author {}", id);
        Ok(())
    }

    // Books

    /// Referenced author, language and genres must exist
    async fn check_book_references(&self, form: &BookForm) -> AppResult<()> {
        reference(
            self.repository.get_author(form.author_id).await,
            format!("author_id: author {} does not exist", form.author_id),
        )?;
        reference(
            self.repository.get_language(form.language_id).await,
            format!("language_id: language {} does not exist", form.language_id),
        )?;

        let genre_ids = form.distinct_genre_ids();
        let found = self.repository.find_genres(&genre_ids).await?;
        if let Some(missing) = genre_ids
            .iter()
            .find(|id| !found.iter().any(|g| g.id == **id))
        {
            return Err(AppError::Validation(format!(
                "genre_ids: genre {} does not exist",
                missing
            )));
        }
        Ok(())
    }

    pub async fn create_book(&self, form: &BookForm) -> AppResult<i32> {
        let form = form.normalized();
        form.validate()?;
        self.check_book_references(&form).await?;
        if self.repository.isbn_exists(&form.isbn, None).await? {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                form.isbn
            )));
        }

        let id = self.repository.create_book(&form).await?;
        tracing::info!("Created book {} ({})", id, form.title);
        Ok(id)
    }

    pub async fn update_book(&self, id: i32, form: &BookForm) -> AppResult<()> {
        self.repository.get_book(id).await?;
        let form = form.normalized();
        form.validate()?;
        self.check_book_references(&form).await?;
        if self.repository.isbn_exists(&form.isbn, Some(id)).await? {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                form.isbn
            )));
        }

        self.repository.update_book(id, &form).await?;
        tracing::info!("Updated book {}", id);
        Ok(())
    }

    /// Delete a book. Refused while copies of it exist.
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.get_book(id).await?;

        let copies = self.repository.count_instances_of_book(id).await?;
        if copies > 0 {
            return Err(AppError::Conflict(format!(
                "Book {} still has {} copy(ies); delete them first",
                id, copies
            )));
        }

        self.repository.delete_book(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    // Genres and languages

    pub async fn create_genre(&self, form: &GenreForm) -> AppResult<i32> {
        let form = form.normalized();
        form.validate()?;
        let id = self.repository.create_genre(&form.name).await?;
        tracing::info!("Created genre {} ({})", id, form.name);
        Ok(id)
    }

    pub async fn create_language(&self, form: &LanguageForm) -> AppResult<i32> {
        let form = form.normalized();
        form.validate()?;
        let id = self.repository.create_language(&form.name).await?;
        tracing::info!("Created language {} ({})", id, form.name);
        Ok(id)
    }

    // Book instances

    async fn check_instance_book(&self, form: &InstanceForm) -> AppResult<()> {
        reference(
            self.repository.get_book(form.book_id).await,
            format!("book_id: book {} does not exist", form.book_id),
        )
    }

    pub async fn create_instance(&self, form: &InstanceForm) -> AppResult<Uuid> {
        let form = form.normalized();
        form.validate()?;
        self.check_instance_book(&form).await?;
        let id = self.repository.create_instance(&form).await?;
        tracing::info!("Created book instance {} of book {}", id, form.book_id);
        Ok(id)
    }

    pub async fn update_instance(&self, id: Uuid, form: &InstanceForm) -> AppResult<()> {
        self.repository.get_instance(id).await?;
        let form = form.normalized();
        form.validate()?;
        self.check_instance_book(&form).await?;
        self.repository.update_instance(id, &form).await?;
        tracing::info!("Updated book instance {} ({})", id, form.status);
        Ok(())
    }

    /// Delete a copy and return the id of its book
    pub async fn delete_instance(&self, id: Uuid) -> AppResult<i32> {
        let instance = self.repository.get_instance(id).await?;
        self.repository.delete_instance(id).await?;
        tracing::info!("Deleted book instance {} of book {}", id, instance.book_id);
        Ok(instance.book_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{LoanStatus, PageWindow},
        repository::MemoryRepository,
    };
    use chrono::NaiveDate;

    fn author(last: &str) -> AuthorForm {
        AuthorForm {
            first_name: "Ursula".to_string(),
            last_name: last.to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1929, 10, 21),
            date_of_death: NaiveDate::from_ymd_opt(2018, 1, 22),
        }
    }

    fn book(author_id: i32, language_id: i32, isbn: &str) -> BookForm {
        BookForm {
            title: "A Wizard of Earthsea".to_string(),
            author_id,
            summary: "A young mage learns the cost of power.".to_string(),
            isbn: isbn.to_string(),
            language_id,
            genre_ids: vec![],
        }
    }

    async fn setup() -> (Arc<MemoryRepository>, RecordsService, i32, i32) {
        let repo = Arc::new(MemoryRepository::new());
        let records = RecordsService::new(repo.clone());
        let author_id = records.create_author(&author("Le Guin")).await.unwrap();
        let language_id = records
            .create_language(&LanguageForm {
                name: "English".to_string(),
            })
            .await
            .unwrap();
        (repo, records, author_id, language_id)
    }

    #[tokio::test]
    async fn author_with_books_cannot_be_deleted() {
        let (repo, records, author_id, language_id) = setup().await;
        records
            .create_book(&book(author_id, language_id, "9780547773742"))
            .await
            .unwrap();

        let err = records.delete_author(author_id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(repo.get_author(author_id).await.is_ok());
    }

    #[tokio::test]
    async fn author_without_books_is_deleted() {
        let (repo, records, _, _) = setup().await;
        let lonely = records.create_author(&author("Tiptree")).await.unwrap();

        records.delete_author(lonely).await.unwrap();
        let (authors, total) = repo.list_authors(PageWindow::new(None, 10)).await.unwrap();
        assert_eq!(total, 1);
        assert!(authors.iter().all(|a| a.id != lonely));
        assert!(matches!(
            records.delete_author(lonely).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_isbn_is_rejected() {
        let (repo, records, author_id, language_id) = setup().await;
        let first = records
            .create_book(&book(author_id, language_id, "9780547773742"))
            .await
            .unwrap();

        let mut second = book(author_id, language_id, "9780547773742");
        second.title = "The Tombs of Atuan".to_string();
        let err = records.create_book(&second).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert_eq!(repo.count_books(None).await.unwrap(), 1);
        assert_eq!(
            repo.get_book(first).await.unwrap().title,
            "A Wizard of Earthsea"
        );

        // Keeping its own ISBN on update is fine
        records
            .update_book(first, &book(author_id, language_id, "9780547773742"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_references_are_validation_errors() {
        let (_, records, author_id, language_id) = setup().await;

        let err = records
            .create_book(&book(999, language_id, "1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("author_id")));

        let mut form = book(author_id, language_id, "2");
        form.genre_ids = vec![42];
        let err = records.create_book(&form).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref m) if m.starts_with("genre_ids")));

        let err = records
            .create_instance(&InstanceForm {
                book_id: 999,
                imprint: "Parnassus".to_string(),
                status: LoanStatus::Available,
                due_back: None,
                borrower_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn updating_missing_records_is_not_found() {
        let (_, records, author_id, language_id) = setup().await;
        assert!(matches!(
            records.update_author(999, &author("Nobody")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            records
                .update_book(999, &book(author_id, language_id, "3"))
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            records.delete_instance(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_forms_are_not_stored() {
        let (repo, records, _, _) = setup().await;
        let err = records.create_author(&author("")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(repo.count_authors().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn whitespace_only_names_are_rejected() {
        let (repo, records, _, _) = setup().await;

        let mut blank = author("  ");
        blank.first_name = "\t".to_string();
        assert!(matches!(
            records.create_author(&blank).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(repo.count_authors().await.unwrap(), 1);

        let err = records
            .create_genre(&GenreForm {
                name: "   ".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(repo.list_genres().await.unwrap().is_empty());

        let id = records
            .create_genre(&GenreForm {
                name: "  Fantasy ".to_string(),
            })
            .await
            .unwrap();
        let genres = repo.list_genres().await.unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0].id, id);
        assert_eq!(genres[0].name, "Fantasy");
    }

    #[tokio::test]
    async fn missing_record_wins_over_invalid_form() {
        let (_, records, _, _) = setup().await;
        assert!(matches!(
            records.update_author(999, &author("")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            records.update_book(999, &book(1, 1, "")).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            records
                .update_instance(
                    Uuid::new_v4(),
                    &InstanceForm {
                        book_id: 999,
                        imprint: String::new(),
                        status: LoanStatus::OnLoan,
                        due_back: None,
                        borrower_id: None,
                    }
                )
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn book_with_copies_cannot_be_deleted_until_copies_go() {
        let (repo, records, author_id, language_id) = setup().await;
        let book_id = records
            .create_book(&book(author_id, language_id, "9780547773742"))
            .await
            .unwrap();
        let copy = records
            .create_instance(&InstanceForm {
                book_id,
                imprint: "Parnassus".to_string(),
                status: LoanStatus::Available,
                due_back: None,
                borrower_id: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            records.delete_book(book_id).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(records.delete_instance(copy).await.unwrap(), book_id);
        records.delete_book(book_id).await.unwrap();
        assert_eq!(repo.count_books(None).await.unwrap(), 0);
    }
}
