//! Book instance (copy) endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppResult, ErrorResponse},
    models::{BookInstance, InstanceForm, Permission},
    AppState,
};

use super::{json_body, path_param, see_other, InstanceId, RequestContext};

fn book_view(book_id: i32) -> String {
    format!("/api/v1/books/{}", book_id)
}

/// Get a book instance
#[utoipa::path(
    get,
    path = "/instances/{id}",
    tag = "instances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Book instance", body = BookInstance),
        (status = 404, description = "Book instance not found", body = ErrorResponse)
    )
)]
pub async fn get_instance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.catalog.get_instance(id).await?;
    Ok(Json(instance))
}

/// Create a book instance
#[utoipa::path(
    post,
    path = "/instances",
    tag = "instances",
    security(("bearer_auth" = [])),
    request_body = InstanceForm,
    responses(
        (status = 303, description = "Book instance created", body = InstanceId),
        (status = 400, description = "Invalid fields", body = ErrorResponse)
    )
)]
pub async fn create_instance(
    State(state): State<AppState>,
    ctx: RequestContext,
    form: Result<Json<InstanceForm>, JsonRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::ManageCatalog)?;
    let form = json_body(form)?;
    let id = state.services.records.create_instance(&form).await?;
    Ok(see_other(book_view(form.book_id), InstanceId { id }))
}

/// Update a book instance
#[utoipa::path(
    put,
    path = "/instances/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = InstanceForm,
    responses(
        (status = 303, description = "Book instance updated", body = InstanceId),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Book instance not found", body = ErrorResponse)
    )
)]
pub async fn update_instance(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<Uuid>, PathRejection>,
    form: Result<Json<InstanceForm>, JsonRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::ManageCatalog)?;
    let id = path_param(id)?;
    let form = json_body(form)?;
    state.services.records.update_instance(id, &form).await?;
    Ok(see_other(book_view(form.book_id), InstanceId { id }))
}

/// Delete a book instance
#[utoipa::path(
    delete,
    path = "/instances/{id}",
    tag = "instances",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 303, description = "Book instance deleted", body = InstanceId),
        (status = 404, description = "Book instance not found", body = ErrorResponse)
    )
)]
pub async fn delete_instance(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::ManageCatalog)?;
    let id = path_param(id)?;
    let book_id = state.services.records.delete_instance(id).await?;
    Ok(see_other(book_view(book_id), InstanceId { id }))
}
