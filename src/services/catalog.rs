//! Catalog browsing: listings and detail lookups

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::PaginationConfig,
    error::AppResult,
    models::{
        page::LISTING_NOTE, Author, AuthorDetail, BookDetail, BookInstance, BookSummary, Genre,
        Language, Page, PageWindow,
    },
    repository::{
        AuthorsRepository, BooksRepository, InstancesRepository, Repository, TaxonomyRepository,
    },
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn Repository>,
    pagination: PaginationConfig,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn Repository>, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            pagination,
        }
    }

    /// List authors in id order, one page at a time
    pub async fn list_authors(&self, page: Option<i64>) -> AppResult<Page<Author>> {
        let window = PageWindow::new(page, self.pagination.authors_per_page);
        let (authors, total) = self.repository.list_authors(window).await?;
        Ok(Page::new(authors, total, window).with_note(LISTING_NOTE))
    }

    /// Get an author with the books that reference it
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.get_author(id).await?;
        let books = self.repository.list_books_by_author(id).await?;
        Ok(AuthorDetail { author, books })
    }

    /// List books in id order, one page at a time
    pub async fn list_books(&self, page: Option<i64>) -> AppResult<Page<BookSummary>> {
        let window = PageWindow::new(page, self.pagination.books_per_page);
        let (books, total) = self.repository.list_books(window).await?;
        Ok(Page::new(books, total, window).with_note(LISTING_NOTE))
    }

    /// Get a book with its author, language and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.repository.get_book(id).await?;
        let author = match book.author_id {
            Some(author_id) => Some(self.repository.get_author(author_id).await?),
            None => None,
        };
        let language = self.repository.get_language(book.language_id).await?;
        let instances = self.repository.list_instances_for_book(id).await?;

        Ok(BookDetail {
            book,
            author,
            language,
            instances,
        })
    }

    pub async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.repository.get_instance(id).await
    }

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.list_genres().await
    }

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.list_languages().await
    }
}
