//! Session extraction and the login/logout/me handlers.

use super::AppState;
use super::extract::ApiJson;
use crate::auth::{LoginResponse, Session};
use crate::error::{ApiError, ApiResult};
use crate::types::SessionUser;
use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use serde::Deserialize;

/// Token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Self> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
        Ok(state.auth().authenticate(token)?)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub(crate) async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    // Hash verification is CPU bound.
    let auth = state.auth().clone();
    let response = tokio::task::spawn_blocking(move || auth.login(&req.username, &req.password))
        .await
        .map_err(ApiError::internal)??;
    Ok(Json(response))
}

pub(crate) async fn logout(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<StatusCode> {
    state.auth().logout(&session)?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn me(session: Session) -> Json<SessionUser> {
    Json(session.user)
}
