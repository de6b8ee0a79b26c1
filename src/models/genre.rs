//! Genre and language models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book genre (e.g. "Science Fiction")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Natural language a book is written in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
}

/// Create genre request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct GenreForm {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: String,
}

/// Create language request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LanguageForm {
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub name: String,
}

impl GenreForm {
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
        }
    }
}

impl LanguageForm {
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected_once_trimmed() {
        let genre = GenreForm {
            name: "   ".to_string(),
        };
        assert!(genre.validate().is_ok());
        assert!(genre.normalized().validate().is_err());

        let language = LanguageForm {
            name: " French ".to_string(),
        }
        .normalized();
        assert_eq!(language.name, "French");
        assert!(language.validate().is_ok());
    }
}
