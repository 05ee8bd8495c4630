//! 후보자 명부, 집계, 투표 endpoint.
//!
//! | 경로 | 접근 |
//! |------|------|
//! | `GET /candidates`, `GET /candidates/tally` | 공개 |
//! | `GET /candidates/admin`, `POST/PUT/DELETE /candidates...` | 관리자 |
//! | `POST /candidates/{id}/vote` (`GET` 별칭) | 유권자 |

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, post, put},
    Json, Router,
};
use ballot_core::{Candidate, CandidateSummary, Permission, TallyGrouping};
use serde::Deserialize;
use utoipa::IntoParams;
use tracing::debug;
use uuid::Uuid;

use super::MessageResponse;
use crate::auth::{require_permission, AdminAuth, JwtAuth, VoterAuth};
use crate::error::{
    body_rejection, candidate_path_rejection, query_rejection, ApiErrorResponse, ApiResult,
};
use crate::services::{CandidateRequest, CandidateUpdateRequest, TallyReport, VoteReceipt};
use crate::state::AppState;

/// 집계 쿼리.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TallyQuery {
    /// 집계 단위 ("candidate" 기본, "party")
    #[serde(default, rename = "groupBy")]
    pub group_by: TallyGrouping,
}

/// 공개 후보자 명부.
#[utoipa::path(
    get,
    path = "/candidates",
    responses((status = 200, description = "후보자 목록 (득표수 제외)", body = Vec<CandidateSummary>)),
    tag = "candidates"
)]
pub async fn list_candidates(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CandidateSummary>>> {
    Ok(Json(state.ballot.list_public().await?))
}

/// 관리자용 명부 (득표수 포함).
#[utoipa::path(
    get,
    path = "/candidates/admin",
    responses(
        (status = 200, description = "후보자 전체 정보", body = Vec<Candidate>),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 403, description = "관리자 아님", body = ApiErrorResponse)
    ),
    tag = "candidates"
)]
pub async fn list_candidates_admin(
    JwtAuth(ctx): JwtAuth,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Candidate>>> {
    require_permission(Permission::ViewRosterDetails, &ctx)?;
    Ok(Json(state.ballot.list_full().await?))
}

/// 득표 집계 (득표 내림차순).
#[utoipa::path(
    get,
    path = "/candidates/tally",
    params(TallyQuery),
    responses(
        (status = 200, description = "후보자별 또는 정당별 집계", body = TallyReport),
        (status = 400, description = "알 수 없는 groupBy", body = ApiErrorResponse)
    ),
    tag = "candidates"
)]
pub async fn tally(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TallyQuery>, QueryRejection>,
) -> ApiResult<Json<TallyReport>> {
    let Query(query) = query.map_err(query_rejection)?;
    Ok(Json(state.ballot.tally(query.group_by).await?))
}

/// 후보자 등록.
#[utoipa::path(
    post,
    path = "/candidates",
    request_body = CandidateRequest,
    responses(
        (status = 200, description = "등록 완료", body = Candidate),
        (status = 400, description = "검증 실패", body = ApiErrorResponse),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 403, description = "관리자 아님", body = ApiErrorResponse)
    ),
    tag = "candidates"
)]
pub async fn create_candidate(
    AdminAuth(ctx): AdminAuth,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CandidateRequest>, JsonRejection>,
) -> ApiResult<Json<Candidate>> {
    debug!(admin_id = %ctx.account_id, "POST /candidates");
    let Json(request) = payload.map_err(body_rejection)?;
    Ok(Json(state.ballot.create_candidate(request).await?))
}

/// 후보자 부분 수정.
#[utoipa::path(
    put,
    path = "/candidates/{id}",
    params(("id" = Uuid, Path, description = "후보자 ID")),
    request_body = CandidateUpdateRequest,
    responses(
        (status = 200, description = "수정 완료", body = Candidate),
        (status = 400, description = "검증 실패", body = ApiErrorResponse),
        (status = 403, description = "관리자 아님", body = ApiErrorResponse),
        (status = 404, description = "후보자 없음", body = ApiErrorResponse)
    ),
    tag = "candidates"
)]
pub async fn update_candidate(
    AdminAuth(ctx): AdminAuth,
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CandidateUpdateRequest>, JsonRejection>,
) -> ApiResult<Json<Candidate>> {
    let Path(id) = id.map_err(candidate_path_rejection)?;
    debug!(admin_id = %ctx.account_id, candidate_id = %id, "PUT /candidates/{{id}}");
    let Json(request) = payload.map_err(body_rejection)?;
    Ok(Json(state.ballot.update_candidate(id, request).await?))
}

/// 후보자 삭제. 해당 후보자의 득표도 함께 사라집니다.
#[utoipa::path(
    delete,
    path = "/candidates/{id}",
    params(("id" = Uuid, Path, description = "후보자 ID")),
    responses(
        (status = 200, description = "삭제 완료", body = MessageResponse),
        (status = 403, description = "관리자 아님", body = ApiErrorResponse),
        (status = 404, description = "후보자 없음", body = ApiErrorResponse)
    ),
    tag = "candidates"
)]
pub async fn delete_candidate(
    AdminAuth(ctx): AdminAuth,
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = id.map_err(candidate_path_rejection)?;
    debug!(admin_id = %ctx.account_id, candidate_id = %id, "DELETE /candidates/{{id}}");
    state.ballot.delete_candidate(id).await?;
    Ok(Json(MessageResponse::new("후보자가 삭제되었습니다")))
}

/// 투표. 유권자당 한 번만 성공합니다.
///
/// 응답을 받지 못했다면 재시도 전에 `GET /account`의 `hasVoted`를 확인해야 합니다.
#[utoipa::path(
    post,
    path = "/candidates/{id}/vote",
    params(("id" = Uuid, Path, description = "후보자 ID")),
    responses(
        (status = 200, description = "투표 완료", body = VoteReceipt),
        (status = 400, description = "이미 투표함", body = ApiErrorResponse),
        (status = 401, description = "인증 필요", body = ApiErrorResponse),
        (status = 403, description = "유권자 아님", body = ApiErrorResponse),
        (status = 404, description = "후보자 없음", body = ApiErrorResponse),
        (status = 503, description = "저장소 장애 또는 시간 초과 (반영 여부 불명)", body = ApiErrorResponse)
    ),
    tag = "candidates"
)]
pub async fn cast_vote(
    VoterAuth(ctx): VoterAuth,
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<VoteReceipt>> {
    let Path(candidate_id) = id.map_err(candidate_path_rejection)?;
    Ok(Json(state.ballot.cast_vote(ctx.account_id, candidate_id).await?))
}

/// 후보자 라우터.
pub fn candidates_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/candidates", get(list_candidates).post(create_candidate))
        .route("/candidates/admin", get(list_candidates_admin))
        .route("/candidates/tally", get(tally))
        .route(
            "/candidates/{id}",
            put(update_candidate).delete(delete_candidate),
        )
        // GET은 기존 클라이언트용 별칭
        .route("/candidates/{id}/vote", post(cast_vote).get(cast_vote))
}
