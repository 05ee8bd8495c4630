//! 투표 서비스의 에러 타입.
//!
//! 이 모듈은 서비스 전반에서 사용되는 에러 분류 체계를 정의합니다.
//! 모든 에러는 경계(HTTP)까지 구조화된 코드와 사람이 읽을 수 있는 메시지로 전달됩니다.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BallotError {
    /// 잘못된 입력 (식별번호 형식, 연령 미달 등)
    #[error("입력 검증 실패: {0}")]
    Validation(String),

    /// 이미 등록된 식별번호
    #[error("이미 등록된 식별번호입니다")]
    DuplicateIdentity,

    /// 관리자 계정이 이미 존재함
    #[error("관리자 계정이 이미 존재합니다")]
    DuplicateAdmin,

    /// 식별번호 또는 비밀번호 불일치 (어느 쪽인지 구분하지 않음)
    #[error("식별번호 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,

    /// 토큰 없음/손상/만료
    #[error("인증이 필요합니다")]
    Unauthenticated,

    /// 인증은 되었으나 역할 권한 부족
    #[error("권한이 부족합니다")]
    Unauthorized,

    /// 이미 투표한 유권자
    #[error("이미 투표했습니다")]
    AlreadyVoted,

    /// 존재하지 않는 후보자
    #[error("후보자를 찾을 수 없습니다")]
    CandidateNotFound,

    /// 존재하지 않는 계정
    #[error("계정을 찾을 수 없습니다")]
    AccountNotFound,

    /// 저장소 연결 실패
    #[error("저장소를 사용할 수 없습니다: {0}")]
    StoreUnavailable(String),

    /// 저장소 작업 시간 초과
    #[error("저장소 응답 시간 초과")]
    Timeout,

    /// 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 도메인 작업을 위한 Result 타입.
pub type BallotResult<T> = Result<T, BallotError>;

impl BallotError {
    /// 검증 에러 생성 편의 함수.
    pub fn validation(message: impl Into<String>) -> Self {
        BallotError::Validation(message.into())
    }

    /// 경계에서 사용하는 안정적인 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            BallotError::Validation(_) => "VALIDATION_ERROR",
            BallotError::DuplicateIdentity => "DUPLICATE_IDENTITY",
            BallotError::DuplicateAdmin => "DUPLICATE_ADMIN",
            BallotError::InvalidCredentials => "INVALID_CREDENTIALS",
            BallotError::Unauthenticated => "UNAUTHENTICATED",
            BallotError::Unauthorized => "UNAUTHORIZED",
            BallotError::AlreadyVoted => "ALREADY_VOTED",
            BallotError::CandidateNotFound => "CANDIDATE_NOT_FOUND",
            BallotError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            BallotError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            BallotError::Timeout => "TIMEOUT",
            BallotError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// 재시도 가능한 일시적 에러인지 확인합니다.
    ///
    /// 투표 요청은 이 값과 무관하게 계정 상태를 먼저 확인한 뒤에만 재시도해야 합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BallotError::StoreUnavailable(_) | BallotError::Timeout)
    }

    /// 클라이언트 입력을 고쳐서 해결해야 하는 에러인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            BallotError::StoreUnavailable(_) | BallotError::Timeout | BallotError::Internal(_)
        )
    }
}

impl From<serde_json::Error> for BallotError {
    fn from(err: serde_json::Error) -> Self {
        BallotError::Validation(err.to_string())
    }
}
