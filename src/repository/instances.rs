//! Book instances (copies) and loans repository

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{instance::InstanceForm, page::PageWindow, BookInstance, LoanDetails, LoanStatus},
};

use super::PgRepository;

#[async_trait]
pub trait InstancesRepository: Send + Sync {
    async fn list_instances_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>>;
    async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance>;
    /// Copies on loan, soonest due first, optionally for one borrower only
    async fn list_loans(
        &self,
        borrower_id: Option<i32>,
        window: PageWindow,
    ) -> AppResult<(Vec<LoanDetails>, i64)>;
    async fn create_instance(&self, form: &InstanceForm) -> AppResult<Uuid>;
    async fn update_instance(&self, id: Uuid, form: &InstanceForm) -> AppResult<()>;
    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()>;
    async fn delete_instance(&self, id: Uuid) -> AppResult<()>;
    /// Count copies, optionally only those with `status`
    async fn count_instances(&self, status: Option<LoanStatus>) -> AppResult<i64>;
    async fn count_instances_of_book(&self, book_id: i32) -> AppResult<i64>;
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Book instance {} not found", id))
}

#[async_trait]
impl InstancesRepository for PgRepository {
    async fn list_instances_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let instances = sqlx::query_as::<_, BookInstance>(
            r#"
            SELECT id, book_id, imprint, due_back, status, borrower_id
            FROM book_instances
            WHERE book_id = $1
            ORDER BY imprint, id
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(instances)
    }

    async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            "SELECT id, book_id, imprint, due_back, status, borrower_id FROM book_instances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn list_loans(
        &self,
        borrower_id: Option<i32>,
        window: PageWindow,
    ) -> AppResult<(Vec<LoanDetails>, i64)> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM book_instances
            WHERE status = $1 AND ($2::INTEGER IS NULL OR borrower_id = $2)
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;

        let loans = sqlx::query_as::<_, LoanDetails>(
            r#"
            SELECT i.id, i.book_id, b.title AS book_title, i.imprint, i.due_back, i.borrower_id
            FROM book_instances i
            JOIN books b ON b.id = i.book_id
            WHERE i.status = $1 AND ($2::INTEGER IS NULL OR i.borrower_id = $2)
            ORDER BY i.due_back ASC NULLS LAST, i.id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((loans, total))
    }

    async fn create_instance(&self, form: &InstanceForm) -> AppResult<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, status, borrower_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(form.book_id)
        .bind(&form.imprint)
        .bind(form.due_back)
        .bind(form.status)
        .bind(form.borrower_id)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_instance(&self, id: Uuid, form: &InstanceForm) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET book_id = $2, imprint = $3, due_back = $4, status = $5, borrower_id = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(form.book_id)
        .bind(&form.imprint)
        .bind(form.due_back)
        .bind(form.status)
        .bind(form.borrower_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $2 WHERE id = $1")
            .bind(id)
            .bind(due_back)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn delete_instance(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn count_instances(&self, status: Option<LoanStatus>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE $1::TEXT IS NULL OR status = $1",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_instances_of_book(&self, book_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE book_id = $1")
            .bind(book_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
