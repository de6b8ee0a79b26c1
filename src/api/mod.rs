//! API handlers for the catalog REST endpoints

pub mod authors;
pub mod books;
pub mod health;
pub mod home;
pub mod instances;
pub mod loans;
pub mod openapi;
pub mod taxonomy;

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequestParts, Path,
    },
    http::{
        header::{AUTHORIZATION, LOCATION},
        request::Parts,
        StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Permission, UserClaims},
    AppState,
};

/// Per-request context: the browsing session and, when a token was sent, the user
pub struct RequestContext {
    pub session_id: String,
    /// No session cookie came with the request; `session_id` was just minted
    pub is_new_session: bool,
    pub user: Option<UserClaims>,
}

impl RequestContext {
    /// Guard for handlers that need a logged in user
    pub fn require_login(&self) -> AppResult<&UserClaims> {
        self.user
            .as_ref()
            .ok_or_else(|| AppError::Authentication("Login required".to_string()))
    }

    /// Guard for handlers that need a logged in user holding `permission`
    pub fn require_permission(&self, permission: Permission) -> AppResult<&UserClaims> {
        let user = self.require_login()?;
        user.require(permission)?;
        Ok(user)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let (session_id, is_new_session) = match jar.get(&state.config.session.cookie_name) {
            Some(cookie) if !cookie.value().is_empty() => (cookie.value().to_string(), false),
            _ => (Uuid::new_v4().to_string(), true),
        };

        // Anonymous requests carry no Authorization header at all
        let user = match parts.headers.get(AUTHORIZATION) {
            None => None,
            Some(value) => {
                let header = value
                    .to_str()
                    .map_err(|_| AppError::Authentication("Invalid authorization header".to_string()))?;
                let token = header.strip_prefix("Bearer ").ok_or_else(|| {
                    AppError::Authentication("Invalid authorization header format".to_string())
                })?;
                let claims = UserClaims::from_token(token, &state.config.auth.jwt_secret)
                    .map_err(|e| AppError::Authentication(e.to_string()))?;
                Some(claims)
            }
        };

        Ok(RequestContext {
            session_id,
            is_new_session,
            user,
        })
    }
}

/// Unwrap a JSON body extracted as a `Result`. Guarded handlers take bodies this
/// way so that a missing login or permission is reported before bad input.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Same as [`json_body`] for path parameters
pub fn path_param<T>(param: Result<Path<T>, PathRejection>) -> AppResult<T> {
    param
        .map(|Path(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Id of a created or changed record
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordId {
    pub id: i32,
}

/// Id of a created or changed book instance
#[derive(Debug, Serialize, ToSchema)]
pub struct InstanceId {
    pub id: Uuid,
}

/// 303 See Other pointing at `location`, with a JSON body
pub fn see_other<T: Serialize>(location: String, body: T) -> Response {
    (StatusCode::SEE_OTHER, [(LOCATION, location)], Json(body)).into_response()
}
