//! Candidate Repository
//!
//! 후보자 명부와 득표 집계 조회를 담당합니다.

use ballot_core::{Candidate, CandidateUpdate, VoteTally};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// 후보자 레코드
#[derive(Debug, Clone, FromRow)]
pub struct CandidateRow {
    pub id: Uuid,
    pub name: String,
    pub party: String,
    pub age: i32,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CandidateRow> for Candidate {
    fn from(row: CandidateRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            party: row.party,
            age: row.age,
            vote_count: row.vote_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// 집계 행
#[derive(Debug, Clone, FromRow)]
pub struct TallyRow {
    pub candidate_id: Uuid,
    pub name: String,
    pub party: String,
    pub count: i64,
}

impl From<TallyRow> for VoteTally {
    fn from(row: TallyRow) -> Self {
        Self {
            candidate_id: row.candidate_id,
            name: row.name,
            party: row.party,
            count: row.count,
        }
    }
}

/// Candidate Repository
pub struct CandidateRepository;

impl CandidateRepository {
    /// 후보자 삽입
    pub async fn insert(pool: &PgPool, candidate: &Candidate) -> Result<CandidateRow, sqlx::Error> {
        sqlx::query_as::<_, CandidateRow>(
            r#"
            INSERT INTO candidates (id, name, party, age, vote_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, name, party, age, vote_count, created_at, updated_at
            "#,
        )
        .bind(candidate.id)
        .bind(&candidate.name)
        .bind(&candidate.party)
        .bind(candidate.age)
        .bind(candidate.vote_count)
        .bind(candidate.created_at)
        .bind(candidate.updated_at)
        .fetch_one(pool)
        .await
    }

    /// ID로 조회
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<CandidateRow>, sqlx::Error> {
        sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, name, party, age, vote_count, created_at, updated_at
            FROM candidates
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// 부분 수정. 지정되지 않은 필드는 유지되고 득표수는 건드리지 않습니다.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        update: &CandidateUpdate,
    ) -> Result<Option<CandidateRow>, sqlx::Error> {
        sqlx::query_as::<_, CandidateRow>(
            r#"
            UPDATE candidates
            SET name = COALESCE($2, name),
                party = COALESCE($3, party),
                age = COALESCE($4, age),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, party, age, vote_count, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.party.as_deref().map(str::trim))
        .bind(update.age)
        .fetch_optional(pool)
        .await
    }

    /// 삭제
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM candidates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 전체 명부 (생성 순)
    pub async fn list(pool: &PgPool) -> Result<Vec<CandidateRow>, sqlx::Error> {
        sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, name, party, age, vote_count, created_at, updated_at
            FROM candidates
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// 후보자별 득표수
    pub async fn tallies(pool: &PgPool) -> Result<Vec<TallyRow>, sqlx::Error> {
        sqlx::query_as::<_, TallyRow>(
            r#"
            SELECT id AS candidate_id, name, party, vote_count AS count
            FROM candidates
            ORDER BY vote_count DESC, party, name
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
