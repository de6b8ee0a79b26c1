//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use super::book::BookSummary;

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// Name as shown in listings ("Last, First")
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Author with the books that reference it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetail {
    pub author: Author,
    pub books: Vec<BookSummary>,
}

/// Create/update author request. Every editable field is listed here.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_lifespan", skip_on_field_errors = true))]
pub struct AuthorForm {
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "must be between 1 and 100 characters"))]
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorForm {
    /// Copy with names trimmed, so blank names fail validation
    pub fn normalized(&self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            ..self.clone()
        }
    }
}

fn validate_lifespan(form: &AuthorForm) -> Result<(), ValidationError> {
    match (form.date_of_birth, form.date_of_death) {
        (Some(born), Some(died)) if died < born => {
            let mut err = ValidationError::new("lifespan");
            err.message = Some("date of death precedes date of birth".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(first: &str, last: &str) -> AuthorForm {
        AuthorForm {
            first_name: first.to_string(),
            last_name: last.to_string(),
            date_of_birth: None,
            date_of_death: None,
        }
    }

    #[test]
    fn display_name_is_last_then_first() {
        let author = Author {
            id: 1,
            first_name: "Ursula".to_string(),
            last_name: "Le Guin".to_string(),
            date_of_birth: None,
            date_of_death: None,
        };
        assert_eq!(author.display_name(), "Le Guin, Ursula");
    }

    #[test]
    fn names_are_required() {
        assert!(form("Terry", "Pratchett").validate().is_ok());
        assert!(form("", "Pratchett").validate().is_err());
        assert!(form("Terry", "").validate().is_err());
        assert!(form("  ", "\t").normalized().validate().is_err());
    }

    #[test]
    fn normalized_trims_names() {
        let f = form("  Terry ", " Pratchett\n").normalized();
        assert_eq!(f.first_name, "Terry");
        assert_eq!(f.last_name, "Pratchett");
    }

    #[test]
    fn death_before_birth_is_rejected() {
        let mut f = form("Terry", "Pratchett");
        f.date_of_birth = NaiveDate::from_ymd_opt(1948, 4, 28);
        f.date_of_death = NaiveDate::from_ymd_opt(1900, 1, 1);
        assert!(f.validate().is_err());

        f.date_of_death = NaiveDate::from_ymd_opt(2015, 3, 12);
        assert!(f.validate().is_ok());
    }
}
