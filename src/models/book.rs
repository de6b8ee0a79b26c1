//! Book (title) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{
    author::Author,
    genre::{Genre, Language},
    instance::BookInstance,
};

/// Full book model from database. A book is a title, not a physical copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: i32,
    // Relations (loaded separately)
    #[sqlx(skip)]
    #[serde(default)]
    pub genres: Vec<Genre>,
}

/// Short book representation for lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    /// "Last, First" of the author, when one is set
    pub author_name: Option<String>,
}

/// Book with everything the detail view shows
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    pub book: Book,
    pub author: Option<Author>,
    pub language: Language,
    pub instances: Vec<BookInstance>,
}

/// Create/update book request. Every editable field is listed here.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    pub author_id: i32,
    #[validate(length(min = 1, max = 1000, message = "must be between 1 and 1000 characters"))]
    pub summary: String,
    /// 13 character ISBN
    #[validate(length(min = 1, max = 13, message = "must be between 1 and 13 characters"))]
    pub isbn: String,
    pub language_id: i32,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

impl BookForm {
    /// Copy with text fields trimmed
    pub fn normalized(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            summary: self.summary.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
            ..self.clone()
        }
    }

    /// Genre ids without duplicates, in submission order
    pub fn distinct_genre_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = Vec::with_capacity(self.genre_ids.len());
        for id in &self.genre_ids {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> BookForm {
        BookForm {
            title: "Mort".to_string(),
            author_id: 1,
            summary: "Death takes an apprentice.".to_string(),
            isbn: "9780552131063".to_string(),
            language_id: 1,
            genre_ids: vec![3, 1, 3],
        }
    }

    #[test]
    fn isbn_longer_than_thirteen_is_rejected() {
        let mut f = form();
        assert!(f.validate().is_ok());
        f.isbn = "97805521310631".to_string();
        assert!(f.validate().is_err());
    }

    #[test]
    fn title_and_summary_are_required() {
        let mut f = form();
        f.title.clear();
        assert!(f.validate().is_err());

        let mut f = form();
        f.summary.clear();
        assert!(f.validate().is_err());

        let mut f = form();
        f.title = "   ".to_string();
        assert!(f.normalized().validate().is_err());
    }

    #[test]
    fn distinct_genre_ids_keeps_first_occurrence() {
        assert_eq!(form().distinct_genre_ids(), vec![3, 1]);
    }
}
