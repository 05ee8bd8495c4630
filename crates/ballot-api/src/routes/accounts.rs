//! 가입/로그인 및 계정 endpoint.
//!
//! - `POST /register`, `POST /login`: 공개 (rate limit 적용)
//! - `GET /account`, `PUT /account/password`: 인증 필요

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use ballot_core::AccountProfile;
use tracing::debug;

use super::MessageResponse;
use crate::auth::JwtAuth;
use crate::error::{body_rejection, ApiErrorResponse, ApiResult};
use crate::middleware::{auth_rate_limit, RateLimitState};
use crate::services::{AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest};
use crate::state::AppState;

/// 가입.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "가입 성공, 토큰 발급", body = AuthResponse),
        (status = 400, description = "검증 실패, 중복 식별번호, 중복 관리자", body = ApiErrorResponse),
        (status = 429, description = "요청 과다", body = ApiErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(request) = payload.map_err(body_rejection)?;
    Ok(Json(state.accounts.register(request).await?))
}

/// 로그인.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = AuthResponse),
        (status = 400, description = "필수 항목 누락", body = ApiErrorResponse),
        (status = 401, description = "식별번호 또는 비밀번호 불일치", body = ApiErrorResponse),
        (status = 429, description = "요청 과다", body = ApiErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(request) = payload.map_err(body_rejection)?;
    Ok(Json(state.accounts.login(request).await?))
}

/// 내 계정 정보 (비밀번호 해시 제외).
#[utoipa::path(
    get,
    path = "/account",
    responses(
        (status = 200, description = "계정 정보", body = AccountProfile),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 404, description = "계정 없음", body = ApiErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn get_account(
    JwtAuth(ctx): JwtAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<AccountProfile>> {
    debug!(account_id = %ctx.account_id, "GET /account");
    Ok(Json(state.accounts.profile(ctx.account_id).await?))
}

/// 비밀번호 변경.
#[utoipa::path(
    put,
    path = "/account/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "변경 완료", body = MessageResponse),
        (status = 400, description = "필수 항목 누락", body = ApiErrorResponse),
        (status = 401, description = "인증 필요 또는 현재 비밀번호 불일치", body = ApiErrorResponse)
    ),
    tag = "accounts"
)]
pub async fn change_password(
    JwtAuth(ctx): JwtAuth,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Json(request) = payload.map_err(body_rejection)?;
    state.accounts.change_password(ctx.account_id, request).await?;
    Ok(Json(MessageResponse::new("비밀번호가 변경되었습니다")))
}

/// 계정 라우터. `rate_limit`이 있으면 `/register`, `/login`에만 적용합니다.
pub fn accounts_router(rate_limit: Option<RateLimitState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/register", post(register))
        .route("/login", post(login));

    let public = match rate_limit {
        Some(limiter) => public.route_layer(middleware::from_fn_with_state(limiter, auth_rate_limit)),
        None => public,
    };

    public
        .route("/account", get(get_account))
        .route("/account/password", put(change_password))
}
