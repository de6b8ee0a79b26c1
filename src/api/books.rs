//! Book API endpoints

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
    models::{page::BookPage, BookDetail, BookForm, BookSummary, Page, PageQuery, Permission},
    AppState,
};

use super::{json_body, path_param, see_other, RecordId, RequestContext};

const BOOKS_VIEW: &str = "/api/v1/books";

/// List books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of books", body = BookPage)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<BookSummary>>> {
    let page = state.services.catalog.list_books(query.page).await?;
    Ok(Json(page))
}

/// Get book details with author, language and copies
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetail),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<BookDetail>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Create book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookForm,
    responses(
        (status = 303, description = "Book created", body = RecordId),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 409, description = "Duplicate ISBN", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ctx: RequestContext,
    form: Result<Json<BookForm>, JsonRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::ManageCatalog)?;
    let form = json_body(form)?;
    let id = state.services.records.create_book(&form).await?;
    Ok(see_other(BOOKS_VIEW.to_string(), RecordId { id }))
}

/// Update book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookForm,
    responses(
        (status = 303, description = "Book updated", body = RecordId),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 409, description = "Duplicate ISBN", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<i32>, PathRejection>,
    form: Result<Json<BookForm>, JsonRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::ManageCatalog)?;
    let id = path_param(id)?;
    let form = json_body(form)?;
    state.services.records.update_book(id, &form).await?;
    Ok(see_other(BOOKS_VIEW.to_string(), RecordId { id }))
}

/// Delete book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 303, description = "Book deleted", body = RecordId),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 409, description = "Book still has copies", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    ctx: RequestContext,
    id: Result<Path<i32>, PathRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::ManageCatalog)?;
    let id = path_param(id)?;
    state.services.records.delete_book(id).await?;
    Ok(see_other(BOOKS_VIEW.to_string(), RecordId { id }))
}
