//! 저장소 추상화.
//!
//! 계정, 후보자 명부, 투표 기록을 위한 저장소 중립적인 인터페이스를 제공합니다.
//! 구현체는 PostgreSQL(`ballot-api`)과 인메모리([`crate::MemoryStore`]) 두 가지입니다.
//!
//! # 불변식
//!
//! - 식별번호당 계정은 최대 하나, 관리자 계정은 시스템 전체에 최대 하나.
//!   두 조건 모두 삽입과 원자적으로 검사되어야 합니다.
//! - [`BallotStore::record_vote`]는 `has_voted` 확인-설정과 득표수 증가를
//!   하나의 직렬화 가능한 단위로 수행해야 합니다.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::{Account, Candidate, CandidateUpdate, NationalId, NewAccount, NewCandidate, VoteTally};
use crate::error::BallotError;

// =============================================================================
// 에러 타입
// =============================================================================

/// 저장소 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// 식별번호 유일성 위반
    #[error("중복 식별번호")]
    DuplicateIdentity,

    /// 관리자 유일성 위반
    #[error("중복 관리자")]
    DuplicateAdmin,

    /// 연결 실패 등 일시적 장애
    #[error("저장소 사용 불가: {0}")]
    Unavailable(String),

    /// 연결 획득/쿼리 시간 초과
    #[error("저장소 시간 초과")]
    Timeout,

    /// 저장된 데이터가 도메인 규칙과 맞지 않음
    #[error("손상된 레코드: {0}")]
    Corrupt(String),
}

impl From<StoreError> for BallotError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateIdentity => BallotError::DuplicateIdentity,
            StoreError::DuplicateAdmin => BallotError::DuplicateAdmin,
            StoreError::Unavailable(msg) => BallotError::StoreUnavailable(msg),
            StoreError::Timeout => BallotError::Timeout,
            StoreError::Corrupt(msg) => BallotError::Internal(msg),
        }
    }
}

/// 투표 기록 결과.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// 기록 완료. 후보자의 갱신된 득표수 포함
    Recorded { vote_count: i64 },
    /// 이미 투표한 유권자 (아무것도 변경되지 않음)
    AlreadyVoted,
    /// 후보자가 존재하지 않음 (아무것도 변경되지 않음)
    CandidateNotFound,
    /// 유권자 계정이 존재하지 않음 (아무것도 변경되지 않음)
    VoterNotFound,
}

// =============================================================================
// Store Traits
// =============================================================================

/// 계정 저장소.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// 계정 삽입.
    ///
    /// # Errors
    ///
    /// - `StoreError::DuplicateIdentity`: 식별번호가 이미 존재
    /// - `StoreError::DuplicateAdmin`: 관리자 계정이 이미 존재
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// ID로 계정 조회.
    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// 식별번호로 계정 조회.
    async fn find_account_by_national_id(
        &self,
        national_id: NationalId,
    ) -> Result<Option<Account>, StoreError>;

    /// 비밀번호 해시 교체. 계정이 없으면 `false`.
    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError>;
}

/// 후보자 명부 저장소.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// 후보자 삽입 (득표수 0).
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError>;

    /// ID로 후보자 조회.
    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>, StoreError>;

    /// 후보자 부분 수정. 후보자가 없으면 `None`.
    async fn update_candidate(
        &self,
        id: Uuid,
        update: CandidateUpdate,
    ) -> Result<Option<Candidate>, StoreError>;

    /// 후보자 삭제. 후보자가 없으면 `false`.
    async fn delete_candidate(&self, id: Uuid) -> Result<bool, StoreError>;

    /// 전체 후보자 (생성 순).
    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError>;

    /// 후보자별 득표 집계 (정렬되지 않은 상태여도 됨).
    async fn vote_tallies(&self) -> Result<Vec<VoteTally>, StoreError>;
}

/// 투표 기록 저장소.
#[async_trait]
pub trait BallotStore: Send + Sync {
    /// 투표 기록.
    ///
    /// 후보자 존재 확인 → `has_voted` 조건부 설정 → 득표수 1 증가를 원자적으로 수행합니다.
    /// 같은 유권자의 동시 호출 중 정확히 하나만 `Recorded`를 반환합니다.
    async fn record_vote(&self, voter_id: Uuid, candidate_id: Uuid) -> Result<VoteOutcome, StoreError>;
}

/// 서비스 전체가 사용하는 통합 저장소.
#[async_trait]
pub trait ElectionStore: AccountStore + CandidateStore + BallotStore {
    /// 연결 상태 확인.
    async fn ping(&self) -> Result<(), StoreError>;

    /// 로그용 백엔드 이름.
    fn backend(&self) -> &'static str;
}
