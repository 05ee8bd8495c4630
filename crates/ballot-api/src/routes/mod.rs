//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health`, `/health/ready` - 헬스 체크
//! - `/register`, `/login` - 가입/로그인 (rate limit)
//! - `/account`, `/account/password` - 내 계정
//! - `/candidates...` - 후보자 명부, 집계, 투표

pub mod accounts;
pub mod candidates;
pub mod health;

pub use accounts::accounts_router;
pub use candidates::{candidates_router, TallyQuery};
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};

use std::sync::Arc;

use axum::Router;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::middleware::RateLimitState;
use crate::state::AppState;

/// 단순 확인 메시지 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 전체 API 라우터 생성.
///
/// `rate_limit`이 `None`이면 인증 엔드포인트에 rate limit을 적용하지 않습니다.
pub fn create_api_router(rate_limit: Option<RateLimitState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(health_router())
        .merge(accounts_router(rate_limit))
        .merge(candidates_router())
}
