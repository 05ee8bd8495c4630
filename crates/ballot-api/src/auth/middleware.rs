//! Axum용 접근 제어 추출기.
//!
//! 인증("유효한 토큰인가")과 권한("역할이 충분한가")은 독립된 두 검사이며,
//! 엔드포인트마다 필요한 추출기를 골라 조합합니다.
//!
//! ```rust,ignore
//! // 인증만 필요
//! async fn account(JwtAuth(ctx): JwtAuth) -> impl IntoResponse { ... }
//!
//! // 관리자 역할 필요
//! async fn create_candidate(AdminAuth(ctx): AdminAuth, ...) -> impl IntoResponse { ... }
//! ```

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use ballot_core::{BallotError, Permission, Role};
use tracing::{debug, warn};
use uuid::Uuid;

use super::jwt::{Claims, JwtError};
use crate::error::ApiError;
use crate::state::AppState;

/// 검증된 토큰에서 얻은 요청 주체.
///
/// 첫 추출 시 요청 extensions에 저장되어 같은 요청의 다른 추출기가 재사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub account_id: Uuid,
    pub role: Role,
}

impl From<&Claims> for AuthContext {
    fn from(claims: &Claims) -> Self {
        Self {
            account_id: claims.sub,
            role: claims.role,
        }
    }
}

/// 접근 제어 실패.
#[derive(Debug, thiserror::Error)]
pub enum JwtAuthError {
    #[error("인증 토큰이 필요합니다")]
    MissingToken,
    #[error("잘못된 Authorization 헤더 형식")]
    InvalidAuthHeader,
    #[error("토큰이 만료되었습니다")]
    TokenExpired,
    #[error("유효하지 않은 토큰")]
    InvalidToken,
    #[error("권한이 부족합니다")]
    InsufficientRole,
}

impl From<JwtAuthError> for ApiError {
    fn from(err: JwtAuthError) -> Self {
        // 실패 사유는 로그에서만 구분
        match err {
            JwtAuthError::MissingToken | JwtAuthError::InvalidAuthHeader => {
                debug!(reason = %err, "인증 실패");
                BallotError::Unauthenticated.into()
            }
            JwtAuthError::TokenExpired | JwtAuthError::InvalidToken => {
                warn!(reason = %err, "토큰 검증 실패");
                BallotError::Unauthenticated.into()
            }
            JwtAuthError::InsufficientRole => {
                debug!(reason = %err, "권한 부족");
                BallotError::Unauthorized.into()
            }
        }
    }
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// 인증된 요청 주체 추출기.
#[derive(Debug, Clone, Copy)]
pub struct JwtAuth(pub AuthContext);

impl FromRequestParts<Arc<AppState>> for JwtAuth {
    type Rejection = JwtAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(JwtAuth(*ctx));
        }

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(JwtAuthError::MissingToken)?
            .to_str()
            .map_err(|_| JwtAuthError::InvalidAuthHeader)?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(JwtAuthError::InvalidAuthHeader)?;

        let claims = state.sessions.verify(token).map_err(|e| match e {
            JwtError::Expired => JwtAuthError::TokenExpired,
            _ => JwtAuthError::InvalidToken,
        })?;

        let ctx = AuthContext::from(&claims);
        parts.extensions.insert(ctx);

        Ok(JwtAuth(ctx))
    }
}

/// 역할 일치 확인.
pub fn require_role(required: Role, ctx: &AuthContext) -> Result<(), JwtAuthError> {
    if ctx.role == required {
        Ok(())
    } else {
        Err(JwtAuthError::InsufficientRole)
    }
}

/// 권한 보유 확인.
pub fn require_permission(permission: Permission, ctx: &AuthContext) -> Result<(), JwtAuthError> {
    if ctx.role.has_permission(permission) {
        Ok(())
    } else {
        Err(JwtAuthError::InsufficientRole)
    }
}

/// 관리자 역할을 요구하는 추출기.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth(pub AuthContext);

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = JwtAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let JwtAuth(ctx) = JwtAuth::from_request_parts(parts, state).await?;
        require_role(Role::Admin, &ctx)?;
        Ok(AdminAuth(ctx))
    }
}

/// 투표 권한을 요구하는 추출기. 관리자는 투표할 수 없습니다.
#[derive(Debug, Clone, Copy)]
pub struct VoterAuth(pub AuthContext);

impl FromRequestParts<Arc<AppState>> for VoterAuth {
    type Rejection = JwtAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let JwtAuth(ctx) = JwtAuth::from_request_parts(parts, state).await?;
        require_permission(Permission::CastVote, &ctx)?;
        Ok(VoterAuth(ctx))
    }
}
