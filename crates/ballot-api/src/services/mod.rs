//! 서비스 계층.
//!
//! 라우트 핸들러와 저장소 사이에서 도메인 규칙을 적용합니다.
//!
//! - [`credentials`]: 계정 저장 및 비밀번호 해싱/검증
//! - [`accounts`]: 가입, 로그인, 비밀번호 변경
//! - [`ballot`]: 1인 1표 투표와 후보자 명부 관리

pub mod accounts;
pub mod ballot;
pub mod credentials;

pub use accounts::{AccountService, AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest};
pub use ballot::{
    BallotEngine, CandidateRequest, CandidateUpdateRequest, TallyReport, VoteReceipt,
};
pub use credentials::{AccountDraft, CredentialStore};

use std::future::Future;
use std::time::Duration;

use ballot_core::{BallotError, BallotResult, StoreError};
use tracing::warn;
use validator::ValidationErrors;

/// 저장소 호출에 시간 제한을 적용합니다.
///
/// 제한을 넘기면 `BallotError::Timeout`을 반환합니다. 호출 자체는 취소되므로
/// 쓰기 작업이었다면 실제 반영 여부는 알 수 없습니다.
pub(crate) async fn bounded<T, F>(limit: Duration, operation: &'static str, fut: F) -> BallotResult<T>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(BallotError::from),
        Err(_) => {
            warn!(operation, timeout_ms = limit.as_millis() as u64, "저장소 호출 시간 초과");
            Err(BallotError::Timeout)
        }
    }
}

/// validator 에러를 하나의 검증 에러 메시지로 합칩니다.
pub(crate) fn validation_error(errors: ValidationErrors) -> BallotError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: 유효하지 않은 값", field))
            })
        })
        .collect();
    messages.sort();

    BallotError::validation(messages.join("; "))
}
