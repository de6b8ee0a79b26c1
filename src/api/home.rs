//! Home page endpoint

use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{error::AppResult, services::stats::HomeView, AppState};

use super::RequestContext;

/// Catalog statistics and the visit count of the current session
#[utoipa::path(
    get,
    path = "/home",
    tag = "home",
    responses(
        (status = 200, description = "Catalog statistics", body = HomeView)
    )
)]
pub async fn home(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> AppResult<(CookieJar, Json<HomeView>)> {
    let view = state.services.stats.home(&ctx.session_id).await?;

    let mut jar = CookieJar::new();
    if ctx.is_new_session {
        let cookie = Cookie::build((state.config.session.cookie_name.clone(), ctx.session_id))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax);
        jar = jar.add(cookie);
    }

    Ok((jar, Json(view)))
}
