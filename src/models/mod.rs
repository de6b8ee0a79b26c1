//! Data models for the catalog

pub mod author;
pub mod book;
pub mod genre;
pub mod instance;
pub mod page;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorDetail, AuthorForm};
pub use book::{Book, BookDetail, BookForm, BookSummary};
pub use genre::{Genre, GenreForm, Language, LanguageForm};
pub use instance::{BookInstance, InstanceForm, LoanDetails, LoanStatus};
pub use page::{Page, PageQuery, PageWindow};
pub use user::{Permission, UserClaims};
