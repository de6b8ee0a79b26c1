//! Genre and language endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    Json,
};

use crate::{
    error::{AppResult, ErrorResponse},
    models::{Genre, GenreForm, Language, LanguageForm, Permission},
    AppState,
};

use super::{json_body, see_other, RecordId, RequestContext};

/// List genres by name
#[utoipa::path(
    get,
    path = "/genres",
    tag = "taxonomy",
    responses(
        (status = 200, description = "All genres", body = Vec<Genre>)
    )
)]
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.services.catalog.list_genres().await?;
    Ok(Json(genres))
}

/// Create genre
#[utoipa::path(
    post,
    path = "/genres",
    tag = "taxonomy",
    security(("bearer_auth" = [])),
    request_body = GenreForm,
    responses(
        (status = 303, description = "Genre created", body = RecordId),
        (status = 400, description = "Invalid name", body = ErrorResponse)
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    ctx: RequestContext,
    form: Result<Json<GenreForm>, JsonRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::ManageCatalog)?;
    let form = json_body(form)?;
    let id = state.services.records.create_genre(&form).await?;
    Ok(see_other("/api/v1/genres".to_string(), RecordId { id }))
}

/// List languages by name
#[utoipa::path(
    get,
    path = "/languages",
    tag = "taxonomy",
    responses(
        (status = 200, description = "All languages", body = Vec<Language>)
    )
)]
pub async fn list_languages(State(state): State<AppState>) -> AppResult<Json<Vec<Language>>> {
    let languages = state.services.catalog.list_languages().await?;
    Ok(Json(languages))
}

/// Create language
#[utoipa::path(
    post,
    path = "/languages",
    tag = "taxonomy",
    security(("bearer_auth" = [])),
    request_body = LanguageForm,
    responses(
        (status = 303, description = "Language created", body = RecordId),
        (status = 400, description = "Invalid name", body = ErrorResponse)
    )
)]
pub async fn create_language(
    State(state): State<AppState>,
    ctx: RequestContext,
    form: Result<Json<LanguageForm>, JsonRejection>,
) -> AppResult<Response> {
    ctx.require_permission(Permission::ManageCatalog)?;
    let form = json_body(form)?;
    let id = state.services.records.create_language(&form).await?;
    Ok(see_other("/api/v1/languages".to_string(), RecordId { id }))
}
