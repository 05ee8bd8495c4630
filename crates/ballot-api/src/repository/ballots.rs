//! Ballot Repository
//!
//! 투표 기록 트랜잭션.
//!
//! 1. 후보자 행에 `FOR KEY SHARE` 잠금 (투표 중 삭제 방지, 득표수 갱신과는 충돌하지 않음)
//! 2. `has_voted = FALSE` 조건부 갱신. 영향 행이 0이면 이미 투표했거나 계정이 없음
//! 3. 득표수 1 증가
//! 4. 커밋
//!
//! 2단계의 조건부 갱신은 행 잠금을 잡으므로 같은 유권자의 동시 트랜잭션은 직렬화되고,
//! 뒤따른 트랜잭션은 갱신된 `has_voted = TRUE`를 보고 0행을 반환합니다.

use ballot_core::VoteOutcome;
use sqlx::{PgConnection, PgPool};
use tracing::debug;
use uuid::Uuid;

/// Ballot Repository
pub struct BallotRepository;

impl BallotRepository {
    /// 투표 기록. `Recorded` 이외의 결과는 롤백되어 아무것도 변경하지 않습니다.
    pub async fn record_vote(
        pool: &PgPool,
        voter_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<VoteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let outcome = Self::record_in(&mut *tx, voter_id, candidate_id).await?;

        match outcome {
            VoteOutcome::Recorded { .. } => tx.commit().await?,
            _ => {
                debug!(?outcome, "투표 트랜잭션 롤백");
                tx.rollback().await?;
            }
        }

        Ok(outcome)
    }

    async fn record_in(
        conn: &mut PgConnection,
        voter_id: Uuid,
        candidate_id: Uuid,
    ) -> Result<VoteOutcome, sqlx::Error> {
        let candidate: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM candidates WHERE id = $1 FOR KEY SHARE")
                .bind(candidate_id)
                .fetch_optional(&mut *conn)
                .await?;

        if candidate.is_none() {
            return Ok(VoteOutcome::CandidateNotFound);
        }

        let marked = sqlx::query(
            r#"
            UPDATE accounts
            SET has_voted = TRUE, updated_at = NOW()
            WHERE id = $1 AND has_voted = FALSE
            "#,
        )
        .bind(voter_id)
        .execute(&mut *conn)
        .await?;

        if marked.rows_affected() == 0 {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE id = $1)")
                    .bind(voter_id)
                    .fetch_one(&mut *conn)
                    .await?;

            return Ok(if exists {
                VoteOutcome::AlreadyVoted
            } else {
                VoteOutcome::VoterNotFound
            });
        }

        let vote_count: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE candidates
            SET vote_count = vote_count + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING vote_count
            "#,
        )
        .bind(candidate_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(match vote_count {
            Some(vote_count) => VoteOutcome::Recorded { vote_count },
            None => VoteOutcome::CandidateNotFound,
        })
    }
}
