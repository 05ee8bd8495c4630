//! PostgreSQL 저장소.
//!
//! 리포지토리의 static 메서드를 `ballot_core` 저장소 trait에 연결하고,
//! `sqlx::Error`를 저장소 에러로 분류합니다.

use std::time::Duration;

use async_trait::async_trait;
use ballot_core::{
    Account, AccountStore, BallotStore, Candidate, CandidateStore, CandidateUpdate,
    DatabaseConfig, ElectionStore, NationalId, NewAccount, NewCandidate, StoreError, VoteOutcome,
    VoteTally,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{error, info};
use uuid::Uuid;

use super::{AccountRepository, BallotRepository, CandidateRepository};

/// 식별번호 유일성 제약 이름.
const NATIONAL_ID_CONSTRAINT: &str = "accounts_national_id_key";
/// 관리자 유일성 부분 인덱스 이름.
const SINGLE_ADMIN_CONSTRAINT: &str = "accounts_single_admin";

/// PostgreSQL 기반 선거 저장소.
#[derive(Clone)]
pub struct PgElectionStore {
    pool: PgPool,
}

impl PgElectionStore {
    /// 연결 풀 생성.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Unavailable("database.url이 설정되지 않았습니다".to_string()))?;

        info!(max_connections = config.max_connections, "데이터베이스 연결 중...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await
            .map_err(map_db_error)?;

        info!("데이터베이스 연결 완료");
        Ok(Self { pool })
    }

    /// 기존 풀 재사용.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 스키마 마이그레이션.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("마이그레이션 실행 중...");
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        info!("마이그레이션 완료");
        Ok(())
    }
}

/// `sqlx::Error` → `StoreError`.
///
/// 유일성 위반은 제약 이름으로 구분합니다. 그 밖의 DB 에러는 손상으로,
/// 연결 계층 에러는 일시적 장애로 분류합니다.
pub fn map_db_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) => match db.constraint() {
            Some(NATIONAL_ID_CONSTRAINT) => StoreError::DuplicateIdentity,
            Some(SINGLE_ADMIN_CONSTRAINT) => StoreError::DuplicateAdmin,
            _ => {
                error!(error = %db, "데이터베이스 에러");
                StoreError::Corrupt(db.to_string())
            }
        },
        sqlx::Error::PoolTimedOut => StoreError::Timeout,
        sqlx::Error::RowNotFound
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => StoreError::Corrupt(err.to_string()),
        _ => StoreError::Unavailable(err.to_string()),
    }
}

#[async_trait]
impl AccountStore for PgElectionStore {
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let account = Account::from_new(account);
        AccountRepository::insert(&self.pool, &account)
            .await
            .map_err(map_db_error)?
            .try_into()
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        AccountRepository::find_by_id(&self.pool, id)
            .await
            .map_err(map_db_error)?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_account_by_national_id(
        &self,
        national_id: NationalId,
    ) -> Result<Option<Account>, StoreError> {
        AccountRepository::find_by_national_id(&self.pool, national_id)
            .await
            .map_err(map_db_error)?
            .map(Account::try_from)
            .transpose()
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        AccountRepository::update_password_hash(&self.pool, id, password_hash)
            .await
            .map_err(map_db_error)
    }
}

#[async_trait]
impl CandidateStore for PgElectionStore {
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError> {
        let candidate = Candidate::from_new(candidate);
        CandidateRepository::insert(&self.pool, &candidate)
            .await
            .map(Candidate::from)
            .map_err(map_db_error)
    }

    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>, StoreError> {
        CandidateRepository::find_by_id(&self.pool, id)
            .await
            .map(|row| row.map(Candidate::from))
            .map_err(map_db_error)
    }

    async fn update_candidate(
        &self,
        id: Uuid,
        update: CandidateUpdate,
    ) -> Result<Option<Candidate>, StoreError> {
        CandidateRepository::update(&self.pool, id, &update)
            .await
            .map(|row| row.map(Candidate::from))
            .map_err(map_db_error)
    }

    async fn delete_candidate(&self, id: Uuid) -> Result<bool, StoreError> {
        CandidateRepository::delete(&self.pool, id)
            .await
            .map_err(map_db_error)
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        CandidateRepository::list(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(Candidate::from).collect())
            .map_err(map_db_error)
    }

    async fn vote_tallies(&self) -> Result<Vec<VoteTally>, StoreError> {
        CandidateRepository::tallies(&self.pool)
            .await
            .map(|rows| rows.into_iter().map(VoteTally::from).collect())
            .map_err(map_db_error)
    }
}

#[async_trait]
impl BallotStore for PgElectionStore {
    async fn record_vote(&self, voter_id: Uuid, candidate_id: Uuid) -> Result<VoteOutcome, StoreError> {
        BallotRepository::record_vote(&self.pool, voter_id, candidate_id)
            .await
            .map_err(map_db_error)
    }
}

#[async_trait]
impl ElectionStore for PgElectionStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_db_error)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
