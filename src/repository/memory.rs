//! In-process repository backend, used for development and tests.
//!
//! Enforces the same uniqueness and referential rules as the SQL schema.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::AuthorForm, book::BookForm, instance::InstanceForm, page::PageWindow, Author, Book,
        BookInstance, BookSummary, Genre, Language, LoanDetails, LoanStatus,
    },
};

use super::{AuthorsRepository, BooksRepository, InstancesRepository, Repository, TaxonomyRepository};

#[derive(Default)]
struct Tables {
    last_author_id: i32,
    authors: BTreeMap<i32, Author>,
    last_book_id: i32,
    books: BTreeMap<i32, Book>,
    last_genre_id: i32,
    genres: BTreeMap<i32, Genre>,
    last_language_id: i32,
    languages: BTreeMap<i32, Language>,
    instances: BTreeMap<Uuid, BookInstance>,
}

fn next_id(last: &mut i32) -> i32 {
    *last += 1;
    *last
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl Tables {
    fn summary(&self, book: &Book) -> BookSummary {
        BookSummary {
            id: book.id,
            title: book.title.clone(),
            isbn: book.isbn.clone(),
            author_id: book.author_id,
            author_name: book
                .author_id
                .and_then(|id| self.authors.get(&id))
                .map(Author::display_name),
        }
    }

    fn isbn_taken(&self, isbn: &str, exclude_id: Option<i32>) -> bool {
        self.books
            .values()
            .any(|b| b.isbn == isbn && Some(b.id) != exclude_id)
    }

    fn book_from_form(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        if !self.authors.contains_key(&form.author_id) {
            return Err(AppError::Conflict(format!(
                "Author with id {} does not exist",
                form.author_id
            )));
        }
        if !self.languages.contains_key(&form.language_id) {
            return Err(AppError::Conflict(format!(
                "Language with id {} does not exist",
                form.language_id
            )));
        }
        let mut genres = Vec::new();
        for genre_id in form.distinct_genre_ids() {
            let genre = self.genres.get(&genre_id).ok_or_else(|| {
                AppError::Conflict(format!("Genre with id {} does not exist", genre_id))
            })?;
            genres.push(genre.clone());
        }
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        Ok(Book {
            id,
            title: form.title.clone(),
            summary: form.summary.clone(),
            isbn: form.isbn.clone(),
            author_id: Some(form.author_id),
            language_id: form.language_id,
            genres,
        })
    }

    fn instance_from_form(&self, id: Uuid, form: &InstanceForm) -> AppResult<BookInstance> {
        if !self.books.contains_key(&form.book_id) {
            return Err(AppError::Conflict(format!(
                "Book with id {} does not exist",
                form.book_id
            )));
        }
        Ok(BookInstance {
            id,
            book_id: form.book_id,
            imprint: form.imprint.clone(),
            due_back: form.due_back,
            status: form.status,
            borrower_id: form.borrower_id,
        })
    }
}

/// Repository keeping all catalog rows in memory
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[async_trait]
impl AuthorsRepository for MemoryRepository {
    async fn list_authors(&self, window: PageWindow) -> AppResult<(Vec<Author>, i64)> {
        let tables = self.tables.read().await;
        let rows: Vec<Author> = tables.authors.values().cloned().collect();
        Ok((window.slice(&rows), rows.len() as i64))
    }

    async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.tables
            .read()
            .await
            .authors
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))
    }

    async fn create_author(&self, form: &AuthorForm) -> AppResult<i32> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.last_author_id);
        tables.authors.insert(
            id,
            Author {
                id,
                first_name: form.first_name.clone(),
                last_name: form.last_name.clone(),
                date_of_birth: form.date_of_birth,
                date_of_death: form.date_of_death,
            },
        );
        Ok(id)
    }

    async fn update_author(&self, id: i32, form: &AuthorForm) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let author = tables
            .authors
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Author with id {} not found", id)))?;
        author.first_name = form.first_name.clone();
        author.last_name = form.last_name.clone();
        author.date_of_birth = form.date_of_birth;
        author.date_of_death = form.date_of_death;
        Ok(())
    }

    async fn delete_author(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.authors.contains_key(&id) {
            return Err(AppError::NotFound(format!("Author with id {} not found", id)));
        }
        if tables.books.values().any(|b| b.author_id == Some(id)) {
            return Err(AppError::Conflict(
                "Author is still referenced by books".to_string(),
            ));
        }
        tables.authors.remove(&id);
        Ok(())
    }

    async fn count_authors(&self) -> AppResult<i64> {
        Ok(self.tables.read().await.authors.len() as i64)
    }
}

#[async_trait]
impl BooksRepository for MemoryRepository {
    async fn list_books(&self, window: PageWindow) -> AppResult<(Vec<BookSummary>, i64)> {
        let tables = self.tables.read().await;
        let rows: Vec<BookSummary> = tables.books.values().map(|b| tables.summary(b)).collect();
        Ok((window.slice(&rows), rows.len() as i64))
    }

    async fn list_books_by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .values()
            .filter(|b| b.author_id == Some(author_id))
            .map(|b| tables.summary(b))
            .collect())
    }

    async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.tables
            .read()
            .await
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn create_book(&self, form: &BookForm) -> AppResult<i32> {
        let mut tables = self.tables.write().await;
        if tables.isbn_taken(&form.isbn, None) {
            return Err(AppError::Conflict(
                "A book with this ISBN already exists".to_string(),
            ));
        }
        let id = tables.last_book_id + 1;
        let book = tables.book_from_form(id, form)?;
        tables.last_book_id = id;
        tables.books.insert(id, book);
        Ok(id)
    }

    async fn update_book(&self, id: i32, form: &BookForm) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        if tables.isbn_taken(&form.isbn, Some(id)) {
            return Err(AppError::Conflict(
                "A book with this ISBN already exists".to_string(),
            ));
        }
        let book = tables.book_from_form(id, form)?;
        tables.books.insert(id, book);
        Ok(())
    }

    async fn delete_book(&self, id: i32) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.books.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        if tables.instances.values().any(|i| i.book_id == id) {
            return Err(AppError::Conflict("Book still has copies".to_string()));
        }
        tables.books.remove(&id);
        Ok(())
    }

    async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        Ok(self.tables.read().await.isbn_taken(isbn, exclude_id))
    }

    async fn count_books(&self, title_contains: Option<&str>) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .values()
            .filter(|b| title_contains.map_or(true, |needle| contains_ignore_case(&b.title, needle)))
            .count() as i64)
    }

    async fn count_books_by_author(&self, author_id: i32) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .books
            .values()
            .filter(|b| b.author_id == Some(author_id))
            .count() as i64)
    }
}

#[async_trait]
impl InstancesRepository for MemoryRepository {
    async fn list_instances_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let tables = self.tables.read().await;
        let mut instances: Vec<BookInstance> = tables
            .instances
            .values()
            .filter(|i| i.book_id == book_id)
            .cloned()
            .collect();
        instances.sort_by(|a, b| a.imprint.cmp(&b.imprint).then(a.id.cmp(&b.id)));
        Ok(instances)
    }

    async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.tables
            .read()
            .await
            .instances
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn list_loans(
        &self,
        borrower_id: Option<i32>,
        window: PageWindow,
    ) -> AppResult<(Vec<LoanDetails>, i64)> {
        let tables = self.tables.read().await;
        let mut loans: Vec<LoanDetails> = tables
            .instances
            .values()
            .filter(|i| i.status == LoanStatus::OnLoan)
            .filter(|i| borrower_id.map_or(true, |b| i.borrower_id == Some(b)))
            .map(|i| LoanDetails {
                id: i.id,
                book_id: i.book_id,
                book_title: tables
                    .books
                    .get(&i.book_id)
                    .map(|b| b.title.clone())
                    .unwrap_or_default(),
                imprint: i.imprint.clone(),
                due_back: i.due_back,
                borrower_id: i.borrower_id,
                is_overdue: false,
            })
            .collect();
        // Soonest due first, undated loans last
        loans.sort_by_key(|l| (l.due_back.is_none(), l.due_back, l.id));
        Ok((window.slice(&loans), loans.len() as i64))
    }

    async fn create_instance(&self, form: &InstanceForm) -> AppResult<Uuid> {
        let mut tables = self.tables.write().await;
        let id = Uuid::new_v4();
        let instance = tables.instance_from_form(id, form)?;
        tables.instances.insert(id, instance);
        Ok(id)
    }

    async fn update_instance(&self, id: Uuid, form: &InstanceForm) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.instances.contains_key(&id) {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        let instance = tables.instance_from_form(id, form)?;
        tables.instances.insert(id, instance);
        Ok(())
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let instance = tables
            .instances
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))?;
        instance.due_back = Some(due_back);
        Ok(())
    }

    async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        self.tables
            .write()
            .await
            .instances
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn count_instances(&self, status: Option<LoanStatus>) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .instances
            .values()
            .filter(|i| status.map_or(true, |s| i.status == s))
            .count() as i64)
    }

    async fn count_instances_of_book(&self, book_id: i32) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .instances
            .values()
            .filter(|i| i.book_id == book_id)
            .count() as i64)
    }
}

#[async_trait]
impl TaxonomyRepository for MemoryRepository {
    async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        let mut genres: Vec<Genre> = self.tables.read().await.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(genres)
    }

    async fn find_genres(&self, ids: &[i32]) -> AppResult<Vec<Genre>> {
        let tables = self.tables.read().await;
        let mut genres: Vec<Genre> = tables
            .genres
            .values()
            .filter(|g| ids.contains(&g.id))
            .cloned()
            .collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(genres)
    }

    async fn create_genre(&self, name: &str) -> AppResult<i32> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.last_genre_id);
        tables.genres.insert(
            id,
            Genre {
                id,
                name: name.to_string(),
            },
        );
        Ok(id)
    }

    async fn count_genres(&self, name_contains: Option<&str>) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables
            .genres
            .values()
            .filter(|g| name_contains.map_or(true, |needle| contains_ignore_case(&g.name, needle)))
            .count() as i64)
    }

    async fn list_languages(&self) -> AppResult<Vec<Language>> {
        let mut languages: Vec<Language> =
            self.tables.read().await.languages.values().cloned().collect();
        languages.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(languages)
    }

    async fn get_language(&self, id: i32) -> AppResult<Language> {
        self.tables
            .read()
            .await
            .languages
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Language with id {} not found", id)))
    }

    async fn create_language(&self, name: &str) -> AppResult<i32> {
        let mut tables = self.tables.write().await;
        let id = next_id(&mut tables.last_language_id);
        tables.languages.insert(
            id,
            Language {
                id,
                name: name.to_string(),
            },
        );
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryRepository, i32, i32) {
        let repo = MemoryRepository::new();
        let author = repo
            .create_author(&AuthorForm {
                first_name: "Terry".to_string(),
                last_name: "Pratchett".to_string(),
                date_of_birth: None,
                date_of_death: None,
            })
            .await
            .unwrap();
        let language = repo.create_language("English").await.unwrap();
        (repo, author, language)
    }

    fn book(author_id: i32, language_id: i32, title: &str, isbn: &str) -> BookForm {
        BookForm {
            title: title.to_string(),
            author_id,
            summary: "summary".to_string(),
            isbn: isbn.to_string(),
            language_id,
            genre_ids: vec![],
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_in_insertion_order() {
        let (repo, author, language) = seeded().await;
        let first = repo.create_book(&book(author, language, "Mort", "1")).await.unwrap();
        let second = repo.create_book(&book(author, language, "Eric", "2")).await.unwrap();
        assert!(first < second);

        let (books, total) = repo.list_books(PageWindow::new(None, 10)).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(books[0].title, "Mort");
        assert_eq!(books[0].author_name.as_deref(), Some("Pratchett, Terry"));
    }

    #[tokio::test]
    async fn duplicate_isbn_is_a_conflict() {
        let (repo, author, language) = seeded().await;
        repo.create_book(&book(author, language, "Mort", "42")).await.unwrap();
        let err = repo
            .create_book(&book(author, language, "Other", "42"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.count_books(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn book_with_unknown_genre_is_not_stored() {
        let (repo, author, language) = seeded().await;
        let mut form = book(author, language, "Mort", "42");
        form.genre_ids = vec![99];
        assert!(repo.create_book(&form).await.is_err());
        assert_eq!(repo.count_books(None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn loans_are_filtered_and_sorted_by_due_date() {
        let (repo, author, language) = seeded().await;
        let book_id = repo.create_book(&book(author, language, "Mort", "1")).await.unwrap();
        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d);

        for (due, borrower, status) in [
            (day(20), Some(1), LoanStatus::OnLoan),
            (day(3), Some(2), LoanStatus::OnLoan),
            (None, None, LoanStatus::Available),
            (day(11), Some(1), LoanStatus::OnLoan),
        ] {
            repo.create_instance(&InstanceForm {
                book_id,
                imprint: "Corgi".to_string(),
                status,
                due_back: due,
                borrower_id: borrower,
            })
            .await
            .unwrap();
        }

        let (all, total) = repo.list_loans(None, PageWindow::new(None, 10)).await.unwrap();
        assert_eq!(total, 3);
        let dues: Vec<_> = all.iter().map(|l| l.due_back).collect();
        assert_eq!(dues, vec![day(3), day(11), day(20)]);
        assert!(all.iter().all(|l| l.book_title == "Mort"));

        let (mine, total) = repo.list_loans(Some(1), PageWindow::new(None, 10)).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(mine[0].due_back, day(11));
    }
}
