//! Loan listings and the renewal workflow

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{BookInstance, LoanDetails, Page, PageWindow},
    repository::{InstancesRepository, Repository},
};

/// Default renewal period offered on the form
pub const DEFAULT_RENEWAL_DAYS: i64 = 21;
/// Latest accepted renewal, counted from today
pub const MAX_RENEWAL_DAYS: i64 = 28;

/// Why a submitted renewal date was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalDateError {
    #[error("This field is required")]
    Missing,
    #[error("Enter a valid date.")]
    Malformed,
    #[error("Invalid date - renewal in past")]
    InPast,
    #[error("Invalid date - renewal more than 4 weeks ahead")]
    TooFarAhead,
}

/// Date proposed on a fresh renewal form
pub fn proposed_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::days(DEFAULT_RENEWAL_DAYS)
}

/// Parse a submitted `YYYY-MM-DD` value; a blank field counts as missing
pub fn parse_renewal_date(raw: Option<&str>) -> Result<Option<NaiveDate>, RenewalDateError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| RenewalDateError::Malformed),
    }
}

/// Accept dates from today up to four weeks ahead, both ends included
pub fn validate_renewal_date(
    date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<NaiveDate, RenewalDateError> {
    let date = date.ok_or(RenewalDateError::Missing)?;
    if date < today {
        return Err(RenewalDateError::InPast);
    }
    if date > today + Duration::days(MAX_RENEWAL_DAYS) {
        return Err(RenewalDateError::TooFarAhead);
    }
    Ok(date)
}

/// Renewal form as first displayed
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalForm {
    pub instance: BookInstance,
    pub proposed_renewal_date: NaiveDate,
}

/// Result of a renewal submission
#[derive(Debug, Clone, PartialEq)]
pub enum RenewalOutcome {
    /// Due date written
    Renewed(BookInstance),
    /// Nothing written; the form is shown again with the error
    Rejected {
        instance: BookInstance,
        /// The value as submitted
        renewal_date: Option<String>,
        error: RenewalDateError,
    },
}

#[derive(Clone)]
pub struct LoansService {
    repository: Arc<dyn Repository>,
    pagination: PaginationConfig,
}

impl LoansService {
    pub fn new(repository: Arc<dyn Repository>, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            pagination,
        }
    }

    /// Copies on loan to a user, soonest due first
    pub async fn list_loans_for_user(
        &self,
        user_id: i32,
        page: Option<i64>,
        today: NaiveDate,
    ) -> AppResult<Page<LoanDetails>> {
        let window = PageWindow::new(page, self.pagination.user_loans_per_page);
        self.list_loans(Some(user_id), window, today).await
    }

    /// Every copy on loan, soonest due first
    pub async fn list_all_active_loans(
        &self,
        page: Option<i64>,
        today: NaiveDate,
    ) -> AppResult<Page<LoanDetails>> {
        let window = PageWindow::new(page, self.pagination.all_loans_per_page);
        self.list_loans(None, window, today).await
    }

    async fn list_loans(
        &self,
        borrower_id: Option<i32>,
        window: PageWindow,
        today: NaiveDate,
    ) -> AppResult<Page<LoanDetails>> {
        let (mut loans, total) = self.repository.list_loans(borrower_id, window).await?;
        for loan in &mut loans {
            loan.is_overdue = loan.due_back.map(|d| d < today).unwrap_or(false);
        }
        Ok(Page::new(loans, total, window))
    }

    /// Copy to renew; only copies on loan have a due date to move
    async fn renewable_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        let instance = self.repository.get_instance(id).await?;
        if !instance.is_on_loan() {
            return Err(AppError::Conflict(format!(
                "Book instance {} is not on loan ({})",
                id, instance.status
            )));
        }
        Ok(instance)
    }

    /// Renewal form with the default proposed date
    pub async fn renewal_form(&self, id: Uuid, today: NaiveDate) -> AppResult<RenewalForm> {
        let instance = self.renewable_instance(id).await?;
        Ok(RenewalForm {
            instance,
            proposed_renewal_date: proposed_renewal_date(today),
        })
    }

    /// Validate a submitted date and, when valid, store it as the new due date
    pub async fn submit_renewal(
        &self,
        id: Uuid,
        renewal_date: Option<&str>,
        today: NaiveDate,
    ) -> AppResult<RenewalOutcome> {
        let mut instance = self.renewable_instance(id).await?;

        let checked =
            parse_renewal_date(renewal_date).and_then(|date| validate_renewal_date(date, today));
        match checked {
            Ok(date) => {
                self.repository.set_due_back(id, date).await?;
                tracing::info!("Renewed book instance {} until {}", id, date);
                instance.due_back = Some(date);
                Ok(RenewalOutcome::Renewed(instance))
            }
            Err(error) => {
                tracing::debug!("Rejected renewal of {}: {}", id, error);
                Ok(RenewalOutcome::Rejected {
                    instance,
                    renewal_date: renewal_date.map(str::to_string),
                    error,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{AuthorForm, BookForm, InstanceForm, LoanStatus},
        repository::{AuthorsRepository, BooksRepository, MemoryRepository, TaxonomyRepository},
    };

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    async fn repository_with_book() -> (Arc<MemoryRepository>, i32) {
        let repo = Arc::new(MemoryRepository::new());
        let author_id = repo
            .create_author(&AuthorForm {
                first_name: "Mary".to_string(),
                last_name: "Shelley".to_string(),
                date_of_birth: None,
                date_of_death: None,
            })
            .await
            .unwrap();
        let language_id = repo.create_language("English").await.unwrap();
        let book_id = repo
            .create_book(&BookForm {
                title: "Frankenstein".to_string(),
                author_id,
                summary: "A modern Prometheus.".to_string(),
                isbn: "9780141439471".to_string(),
                language_id,
                genre_ids: vec![],
            })
            .await
            .unwrap();
        (repo, book_id)
    }

    async fn lend(repo: &MemoryRepository, book_id: i32, borrower: i32, due: NaiveDate) -> Uuid {
        repo.create_instance(&InstanceForm {
            book_id,
            imprint: "Penguin".to_string(),
            status: LoanStatus::OnLoan,
            due_back: Some(due),
            borrower_id: Some(borrower),
        })
        .await
        .unwrap()
    }

    #[test]
    fn proposed_date_is_three_weeks_out() {
        assert_eq!(
            proposed_renewal_date(today()),
            NaiveDate::from_ymd_opt(2024, 3, 22).unwrap()
        );
    }

    #[test]
    fn every_date_in_the_window_is_accepted() {
        for offset in 0..=MAX_RENEWAL_DAYS {
            let date = today() + Duration::days(offset);
            assert_eq!(validate_renewal_date(Some(date), today()), Ok(date));
        }
    }

    #[test]
    fn dates_outside_the_window_are_refused() {
        for offset in 1..=60 {
            let past = today() - Duration::days(offset);
            assert_eq!(
                validate_renewal_date(Some(past), today()),
                Err(RenewalDateError::InPast)
            );
            let ahead = today() + Duration::days(MAX_RENEWAL_DAYS + offset);
            assert_eq!(
                validate_renewal_date(Some(ahead), today()),
                Err(RenewalDateError::TooFarAhead)
            );
        }
        assert_eq!(
            validate_renewal_date(None, today()),
            Err(RenewalDateError::Missing)
        );
    }

    #[test]
    fn submitted_values_are_parsed_as_iso_dates() {
        assert_eq!(
            parse_renewal_date(Some(" 2024-03-22 ")),
            Ok(NaiveDate::from_ymd_opt(2024, 3, 22))
        );
        assert_eq!(parse_renewal_date(None), Ok(None));
        assert_eq!(parse_renewal_date(Some("")), Ok(None));
        assert_eq!(
            parse_renewal_date(Some("22/03/2024")),
            Err(RenewalDateError::Malformed)
        );
    }

    #[tokio::test]
    async fn valid_submission_persists_due_date() {
        let (repo, book_id) = repository_with_book().await;
        let id = lend(&repo, book_id, 3, today()).await;
        let service = LoansService::new(repo.clone(), PaginationConfig::default());

        let new_date = today() + Duration::days(MAX_RENEWAL_DAYS);
        let outcome = service
            .submit_renewal(id, Some(&new_date.to_string()), today())
            .await
            .unwrap();
        assert!(matches!(outcome, RenewalOutcome::Renewed(ref i) if i.due_back == Some(new_date)));
        assert_eq!(repo.get_instance(id).await.unwrap().due_back, Some(new_date));
    }

    #[tokio::test]
    async fn invalid_submission_leaves_due_date_alone() {
        let (repo, book_id) = repository_with_book().await;
        let id = lend(&repo, book_id, 3, today()).await;
        let service = LoansService::new(repo.clone(), PaginationConfig::default());

        let past = (today() - Duration::days(1)).to_string();
        for (submitted, expected) in [
            (past.as_str(), RenewalDateError::InPast),
            ("2024-13-45", RenewalDateError::Malformed),
            ("garbage", RenewalDateError::Malformed),
            ("  ", RenewalDateError::Missing),
        ] {
            match service.submit_renewal(id, Some(submitted), today()).await.unwrap() {
                RenewalOutcome::Rejected {
                    instance,
                    renewal_date,
                    error,
                } => {
                    assert_eq!(instance.id, id);
                    assert_eq!(renewal_date.as_deref(), Some(submitted));
                    assert_eq!(error, expected);
                }
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        assert_eq!(repo.get_instance(id).await.unwrap().due_back, Some(today()));
    }

    #[tokio::test]
    async fn form_proposes_default_date() {
        let (repo, book_id) = repository_with_book().await;
        let id = lend(&repo, book_id, 3, today()).await;
        let service = LoansService::new(repo, PaginationConfig::default());

        let form = service.renewal_form(id, today()).await.unwrap();
        assert_eq!(form.instance.id, id);
        assert_eq!(form.proposed_renewal_date, proposed_renewal_date(today()));
    }

    #[tokio::test]
    async fn copies_not_on_loan_cannot_be_renewed() {
        let (repo, book_id) = repository_with_book().await;
        let id = repo
            .create_instance(&InstanceForm {
                book_id,
                imprint: "Penguin".to_string(),
                status: LoanStatus::Available,
                due_back: None,
                borrower_id: None,
            })
            .await
            .unwrap();
        let service = LoansService::new(repo.clone(), PaginationConfig::default());

        let result = service
            .submit_renewal(id, Some(&today().to_string()), today())
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(repo.get_instance(id).await.unwrap().due_back, None);

        assert!(matches!(
            service.renewal_form(Uuid::new_v4(), today()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn loan_listings_are_sorted_and_flag_overdue() {
        let (repo, book_id) = repository_with_book().await;
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();
        lend(&repo, book_id, 1, day(15)).await;
        lend(&repo, book_id, 2, day(2)).await;
        lend(&repo, book_id, 1, day(1)).await;
        let service = LoansService::new(repo, PaginationConfig::default());

        let mine = service.list_loans_for_user(1, None, day(10)).await.unwrap();
        let dues: Vec<_> = mine.items.iter().map(|l| l.due_back).collect();
        assert_eq!(dues, vec![Some(day(1)), Some(day(15))]);
        assert!(mine.items[0].is_overdue);
        assert!(!mine.items[1].is_overdue);

        let all = service.list_all_active_loans(None, day(10)).await.unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.per_page, 5);
        let dues: Vec<_> = all.items.iter().map(|l| l.due_back).collect();
        assert_eq!(dues, vec![Some(day(1)), Some(day(2)), Some(day(15))]);
    }
}
