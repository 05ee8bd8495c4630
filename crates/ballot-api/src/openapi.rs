//! OpenAPI 문서화 설정.
//!
//! utoipa로 REST API의 OpenAPI 3.0 문서를 생성하고
//! `/api-docs/openapi.json`에서 제공합니다.
//!
//! 새 엔드포인트를 추가할 때:
//!
//! 1. 요청/응답 타입에 `#[derive(ToSchema)]` 추가
//! 2. 핸들러에 `#[utoipa::path(...)]` 어노테이션 추가
//! 3. 이 파일의 `components(schemas(...))`와 `paths(...)`에 추가

use axum::{routing::get, Json, Router};
use ballot_core::{
    AccountProfile, Candidate, CandidateSummary, NationalId, PartyTally, Role, TallyGrouping,
    VoteTally,
};
use utoipa::OpenApi;

use crate::error::ApiErrorResponse;
use crate::routes::{ComponentHealth, ComponentStatus, HealthResponse, MessageResponse};
use crate::services::{
    AuthResponse, CandidateRequest, CandidateUpdateRequest, ChangePasswordRequest, LoginRequest,
    RegisterRequest, TallyReport, VoteReceipt,
};

/// Ballot API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ballot API",
        description = r#"
# 선거 투표 REST API

유권자 가입과 로그인, 1인 1표 투표, 관리자의 후보자 명부 관리를 제공합니다.

## 인증

`/register` 또는 `/login` 응답의 토큰을 `Authorization: Bearer <token>` 헤더로 전달합니다.
토큰이 없거나 만료/손상되면 401 `UNAUTHENTICATED`, 역할이 맞지 않으면 403 `UNAUTHORIZED`입니다.

## 투표 재시도

투표 요청이 503(`TIMEOUT`, `STORE_UNAVAILABLE`)으로 끝나면 반영 여부를 알 수 없습니다.
재시도 전에 `GET /account`의 `hasVoted`를 확인하세요.
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    tags(
        (name = "health", description = "헬스 체크"),
        (name = "accounts", description = "가입, 로그인, 계정"),
        (name = "candidates", description = "후보자 명부, 집계, 투표")
    ),
    components(
        schemas(
            ApiErrorResponse,
            MessageResponse,
            HealthResponse,
            ComponentHealth,
            ComponentStatus,

            RegisterRequest,
            LoginRequest,
            ChangePasswordRequest,
            AuthResponse,
            AccountProfile,
            NationalId,
            Role,

            CandidateRequest,
            CandidateUpdateRequest,
            Candidate,
            CandidateSummary,
            VoteReceipt,
            VoteTally,
            PartyTally,
            TallyGrouping,
            TallyReport,
        )
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,

        crate::routes::accounts::register,
        crate::routes::accounts::login,
        crate::routes::accounts::get_account,
        crate::routes::accounts::change_password,

        crate::routes::candidates::list_candidates,
        crate::routes::candidates::list_candidates_admin,
        crate::routes::candidates::tally,
        crate::routes::candidates::create_candidate,
        crate::routes::candidates::update_candidate,
        crate::routes::candidates::delete_candidate,
        crate::routes::candidates::cast_vote,
    )
)]
pub struct ApiDoc;

/// `GET /api-docs/openapi.json` 라우터.
pub fn openapi_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
