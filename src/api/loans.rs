//! Loan listings and renewal endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppResult, ErrorResponse},
    models::{page::LoanPage, BookInstance, LoanDetails, Page, PageQuery, Permission},
    services::loans::{RenewalForm, RenewalOutcome},
    AppState,
};

use super::{json_body, path_param, see_other, InstanceId, RequestContext};

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RenewalRequest {
    /// New due date as `YYYY-MM-DD`, between today and four weeks ahead
    #[serde(default)]
    pub renewal_date: Option<String>,
}

/// Renewal form returned with its validation error
#[derive(Debug, Serialize, ToSchema)]
pub struct RenewalFormErrors {
    pub instance: BookInstance,
    /// Date as submitted
    pub renewal_date: Option<String>,
    pub error: String,
}

/// Copies on loan to the current user
#[utoipa::path(
    get,
    path = "/loans/mine",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Loans of the current user", body = LoanPage),
        (status = 401, description = "Not logged in", body = ErrorResponse)
    )
)]
pub async fn my_loans(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<LoanDetails>>> {
    let user = ctx.require_login()?;
    let loans = state
        .services
        .loans
        .list_loans_for_user(user.user_id, query.page, today())
        .await?;
    Ok(Json(loans))
}

/// Every copy currently on loan
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All active loans", body = LoanPage),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse)
    )
)]
pub async fn all_loans(
    State(state): State<AppState>,
    ctx: RequestContext,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<LoanDetails>>> {
    ctx.require_permission(Permission::ViewAllLoans)?;
    let loans = state
        .services
        .loans
        .list_all_active_loans(query.page, today())
        .await?;
    Ok(Json(loans))
}

/// Renewal form with the proposed date
#[utoipa::path(
    get,
    path = "/instances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Renewal form", body = RenewalForm),
        (status = 404, description = "Book instance not found", body = ErrorResponse),
        (status = 409, description = "Book instance is not on loan", body = ErrorResponse)
    )
)]
pub async fn renewal_form(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<RenewalForm>> {
    ctx.require_permission(Permission::RenewLoans)?;
    let id = path_param(id)?;
    let form = state.services.loans.renewal_form(id, today()).await?;
    Ok(Json(form))
}

/// Renew a loan
#[utoipa::path(
    post,
    path = "/instances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = RenewalRequest,
    responses(
        (status = 303, description = "Loan renewed", body = InstanceId),
        (status = 400, description = "Invalid renewal date", body = RenewalFormErrors),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse),
        (status = 404, description = "Book instance not found", body = ErrorResponse),
        (status = 409, description = "Book instance is not on loan", body = ErrorResponse)
    )
)]
pub async fn renew_loan(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<Uuid>, PathRejection>,
    request: Result<Json<RenewalRequest>, JsonRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::RenewLoans)?;
    let id = path_param(id)?;
    let request = json_body(request)?;

    let outcome = state
        .services
        .loans
        .submit_renewal(id, request.renewal_date.as_deref(), today())
        .await?;

    Ok(match outcome {
        RenewalOutcome::Renewed(instance) => {
            see_other("/api/v1/loans".to_string(), InstanceId { id: instance.id })
        }
        RenewalOutcome::Rejected {
            instance,
            renewal_date,
            error,
        } => (
            StatusCode::BAD_REQUEST,
            Json(RenewalFormErrors {
                instance,
                renewal_date,
                error: error.to_string(),
            }),
        )
            .into_response(),
    })
}
