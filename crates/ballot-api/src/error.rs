//! API 에러 응답.
//!
//! 모든 엔드포인트는 실패 시 동일한 JSON 형식을 반환합니다.
//!
//! ```json
//! {
//!   "code": "ALREADY_VOTED",
//!   "message": "이미 투표했습니다",
//!   "timestamp": 1738300800
//! }
//! ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ballot_core::BallotError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};
use utoipa::ToSchema;

/// 통합 API 에러 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "VALIDATION_ERROR", "ALREADY_VOTED")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 상세 정보
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 시각 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl ApiErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: Some(chrono::Utc::now().timestamp()),
        }
    }

    pub fn with_details(code: impl Into<String>, message: impl Into<String>, details: Value) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// 핸들러 에러 타입. 상태 코드와 JSON 본문으로 렌더링됩니다.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, body: ApiErrorResponse) -> Self {
        Self { status, body }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

/// 도메인 에러의 HTTP 상태 코드.
pub fn status_for(err: &BallotError) -> StatusCode {
    match err {
        BallotError::Validation(_)
        | BallotError::DuplicateIdentity
        | BallotError::DuplicateAdmin
        | BallotError::AlreadyVoted => StatusCode::BAD_REQUEST,
        BallotError::InvalidCredentials | BallotError::Unauthenticated => StatusCode::UNAUTHORIZED,
        BallotError::Unauthorized => StatusCode::FORBIDDEN,
        BallotError::CandidateNotFound | BallotError::AccountNotFound => StatusCode::NOT_FOUND,
        BallotError::StoreUnavailable(_) | BallotError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
        BallotError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<BallotError> for ApiErrorResponse {
    fn from(err: BallotError) -> Self {
        // 저장소/내부 원인은 로그에만 남기고 응답에는 일반 메시지만 노출
        match &err {
            BallotError::StoreUnavailable(cause) => {
                error!(code = err.code(), cause = %cause, "저장소 사용 불가");
                ApiErrorResponse::with_details(
                    err.code(),
                    "저장소를 일시적으로 사용할 수 없습니다",
                    serde_json::json!({ "retryable": true }),
                )
            }
            BallotError::Timeout => {
                warn!(code = err.code(), "저장소 응답 시간 초과");
                ApiErrorResponse::with_details(
                    err.code(),
                    "요청 처리 시간이 초과되었습니다. 투표 요청이었다면 계정 상태를 확인한 뒤 재시도하세요",
                    serde_json::json!({ "retryable": true }),
                )
            }
            BallotError::Internal(cause) => {
                error!(code = err.code(), cause = %cause, "내부 에러");
                ApiErrorResponse::new(err.code(), "내부 서버 오류가 발생했습니다")
            }
            _ => ApiErrorResponse::new(err.code(), err.to_string()),
        }
    }
}

impl From<BallotError> for ApiError {
    fn from(err: BallotError) -> Self {
        Self::new(status_for(&err), ApiErrorResponse::from(err))
    }
}

/// 요청 본문 파싱 실패 → 400 VALIDATION_ERROR.
pub fn body_rejection(rejection: JsonRejection) -> ApiError {
    BallotError::validation(rejection.body_text()).into()
}

/// 쿼리 문자열 파싱 실패 → 400 VALIDATION_ERROR.
pub fn query_rejection(rejection: QueryRejection) -> ApiError {
    BallotError::validation(rejection.body_text()).into()
}

/// 경로의 후보자 ID가 UUID가 아니면 어떤 후보자도 가리킬 수 없으므로 404.
pub fn candidate_path_rejection(_rejection: PathRejection) -> ApiError {
    BallotError::CandidateNotFound.into()
}
