use axum::extract::State;
use axum::http::HeaderMap;

use crate::auth::require_user;
use crate::error::Result;
use crate::extractors::Json;
use crate::models::AuthUser;
use crate::state::AppState;

/// GET /me - echo the identity behind the bearer token.
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<AuthUser>> {
    let user = require_user(state.identity.as_ref(), &headers).await?;
    Ok(Json(user))
}
