//! Book instance (physical copy) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Availability of a physical copy, stored as a one letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Maintenance
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// Full book instance model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: i32,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub status: LoanStatus,
    pub borrower_id: Option<i32>,
}

impl BookInstance {
    pub fn is_on_loan(&self) -> bool {
        self.status == LoanStatus::OnLoan
    }

    /// On loan and due before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_on_loan() && self.due_back.map(|d| d < today).unwrap_or(false)
    }
}

/// A copy on loan, with its book title for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LoanDetails {
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    #[sqlx(skip)]
    #[serde(default)]
    pub is_overdue: bool,
}

/// Create/update instance request. Every editable field is listed here.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_loan_fields", skip_on_field_errors = true))]
pub struct InstanceForm {
    pub book_id: i32,
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub imprint: String,
    #[serde(default)]
    pub status: LoanStatus,
    #[serde(default)]
    pub due_back: Option<NaiveDate>,
    #[serde(default)]
    pub borrower_id: Option<i32>,
}

impl InstanceForm {
    pub fn normalized(&self) -> Self {
        Self {
            imprint: self.imprint.trim().to_string(),
            ..self.clone()
        }
    }
}

/// Borrower and due date are set exactly when the copy is on loan
fn validate_loan_fields(form: &InstanceForm) -> Result<(), ValidationError> {
    let on_loan = form.status == LoanStatus::OnLoan;
    let message = match (on_loan, form.due_back.is_some(), form.borrower_id.is_some()) {
        (true, false, _) => "a copy on loan needs a due back date",
        (true, _, false) => "a copy on loan needs a borrower",
        (false, true, _) => "only a copy on loan can have a due back date",
        (false, _, true) => "only a copy on loan can have a borrower",
        _ => return Ok(()),
    };
    let mut err = ValidationError::new("loan_fields");
    err.message = Some(message.into());
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instance(status: LoanStatus, due_back: Option<NaiveDate>) -> BookInstance {
        BookInstance {
            id: Uuid::new_v4(),
            book_id: 1,
            imprint: "Corgi, 1987".to_string(),
            due_back,
            status,
            borrower_id: None,
        }
    }

    #[test]
    fn status_codes_round_trip() {
        for status in [
            LoanStatus::Maintenance,
            LoanStatus::OnLoan,
            LoanStatus::Available,
            LoanStatus::Reserved,
        ] {
            assert_eq!(status.code().parse::<LoanStatus>(), Ok(status));
        }
        assert!("x".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn overdue_only_when_on_loan_and_past_due() {
        let today = day(2024, 5, 10);
        assert!(instance(LoanStatus::OnLoan, Some(day(2024, 5, 9))).is_overdue(today));
        assert!(!instance(LoanStatus::OnLoan, Some(today)).is_overdue(today));
        assert!(!instance(LoanStatus::OnLoan, None).is_overdue(today));
        assert!(!instance(LoanStatus::Reserved, Some(day(2024, 5, 1))).is_overdue(today));
    }

    #[test]
    fn loan_fields_follow_status() {
        let mut form = InstanceForm {
            book_id: 1,
            imprint: "Corgi".to_string(),
            status: LoanStatus::OnLoan,
            due_back: Some(day(2024, 5, 10)),
            borrower_id: Some(7),
        };
        assert!(form.validate().is_ok());

        form.borrower_id = None;
        assert!(form.validate().is_err());

        form.status = LoanStatus::Available;
        assert!(form.validate().is_err());

        form.due_back = None;
        assert!(form.validate().is_ok());
    }
}
