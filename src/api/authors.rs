//! Author API endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    response::Response,
    Json,
};

use crate::{
    error::{AppResult, ErrorResponse},
    models::{page::AuthorPage, Author, AuthorDetail, AuthorForm, Page, PageQuery, Permission},
    AppState,
};

use super::{json_body, path_param, see_other, RecordId, RequestContext};

const AUTHORS_VIEW: &str = "/api/v1/authors";

/// List authors
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of authors", body = AuthorPage)
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Author>>> {
    let page = state.services.catalog.list_authors(query.page).await?;
    Ok(Json(page))
}

/// Get author details with their books
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = AuthorDetail),
        (status = 404, description = "Author not found", body = ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<AuthorDetail>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Create author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Author created", body = RecordId),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Not logged in", body = ErrorResponse),
        (status = 403, description = "Missing permission", body = ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    ctx: RequestContext,
    form: Result<Json<AuthorForm>, JsonRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::ManageCatalog)?;
    let form = json_body(form)?;
    let id = state.services.records.create_author(&form).await?;
    Ok(see_other(AUTHORS_VIEW.to_string(), RecordId { id }))
}

/// Update author
#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = AuthorForm,
    responses(
        (status = 303, description = "Author updated", body = RecordId),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 404, description = "Author not found", body = ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<i32>, PathRejection>,
    form: Result<Json<AuthorForm>, JsonRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::ManageCatalog)?;
    let id = path_param(id)?;
    let form = json_body(form)?;
    state.services.records.update_author(id, &form).await?;
    Ok(see_other(AUTHORS_VIEW.to_string(), RecordId { id }))
}

/// Delete author
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 303, description = "Author deleted", body = RecordId),
        (status = 404, description = "Author not found", body = ErrorResponse),
        (status = 409, description = "Author still has books", body = ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::ManageCatalog)?;
    let id = path_param(id)?;
    state.services.records.delete_author(id).await?;
    Ok(see_other(AUTHORS_VIEW.to_string(), RecordId { id }))
}
