//! 투표 엔진과 후보자 명부 관리.
//!
//! # 1인 1표
//!
//! 유권자 상태는 `NotVoted → Voted` 단방향 전이만 가집니다. `has_voted` 확인-설정과
//! 득표수 증가는 [`BallotStore::record_vote`](ballot_core::BallotStore::record_vote)가
//! 하나의 원자적 단위로 수행하므로, 같은 유권자의 동시 요청 중 정확히 하나만 성공합니다.
//!
//! 시간 초과(`Timeout`)는 투표가 반영되었는지 알 수 없는 상태입니다.
//! 클라이언트는 재시도 전에 `GET /account`로 `hasVoted`를 확인해야 합니다.

use std::sync::Arc;
use std::time::Duration;

use ballot_core::{
    aggregate_by_party, sort_tallies, BallotError, BallotResult, Candidate, CandidateSummary,
    CandidateUpdate, ElectionStore, NewCandidate, PartyTally, TallyGrouping, VoteOutcome,
    VoteTally,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{bounded, validation_error};
use crate::metrics::record_vote;

// =============================================================================
// 요청/응답 타입
// =============================================================================

/// 후보자 등록 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CandidateRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "이름은 필수 항목입니다"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "정당은 필수 항목입니다"))]
    pub party: String,
    #[validate(required(message = "나이는 필수 항목입니다"))]
    #[validate(range(min = 18, message = "나이는 18세 이상이어야 합니다"))]
    pub age: Option<i32>,
}

/// 후보자 부분 수정 요청. 득표수는 변경할 수 없습니다.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CandidateUpdateRequest {
    pub name: Option<String>,
    pub party: Option<String>,
    pub age: Option<i32>,
}

impl From<CandidateUpdateRequest> for CandidateUpdate {
    fn from(request: CandidateUpdateRequest) -> Self {
        Self {
            name: request.name,
            party: request.party,
            age: request.age,
        }
    }
}

/// 투표 성공 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub message: String,
    pub candidate_id: Uuid,
}

/// 집계 결과.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TallyReport {
    Candidates(Vec<VoteTally>),
    Parties(Vec<PartyTally>),
}

// =============================================================================
// 엔진
// =============================================================================

/// 투표 엔진.
#[derive(Clone)]
pub struct BallotEngine {
    store: Arc<dyn ElectionStore>,
    timeout: Duration,
}

impl BallotEngine {
    pub fn new(store: Arc<dyn ElectionStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// 투표.
    ///
    /// # Errors
    ///
    /// - `CandidateNotFound`: 후보자 없음
    /// - `AlreadyVoted`: 이미 투표함 (재시도 불가)
    /// - `AccountNotFound`: 토큰의 계정이 더 이상 없음
    /// - `Timeout`: 반영 여부 불명. 계정 상태 확인 후 재시도
    pub async fn cast_vote(&self, voter_id: Uuid, candidate_id: Uuid) -> BallotResult<VoteReceipt> {
        let outcome = bounded(
            self.timeout,
            "record_vote",
            self.store.record_vote(voter_id, candidate_id),
        )
        .await
        .inspect_err(|_| record_vote("error"))?;

        match outcome {
            VoteOutcome::Recorded { vote_count } => {
                record_vote("recorded");
                info!(
                    voter_id = %voter_id,
                    candidate_id = %candidate_id,
                    vote_count,
                    "투표 기록"
                );
                Ok(VoteReceipt {
                    message: "투표가 완료되었습니다".to_string(),
                    candidate_id,
                })
            }
            VoteOutcome::AlreadyVoted => {
                record_vote("already_voted");
                warn!(voter_id = %voter_id, "중복 투표 거부");
                Err(BallotError::AlreadyVoted)
            }
            VoteOutcome::CandidateNotFound => {
                record_vote("candidate_not_found");
                Err(BallotError::CandidateNotFound)
            }
            VoteOutcome::VoterNotFound => {
                record_vote("error");
                warn!(voter_id = %voter_id, "존재하지 않는 유권자의 투표 시도");
                Err(BallotError::AccountNotFound)
            }
        }
    }

    /// 후보자 등록 (득표수 0).
    pub async fn create_candidate(&self, request: CandidateRequest) -> BallotResult<Candidate> {
        request.validate().map_err(validation_error)?;
        let age = request
            .age
            .ok_or_else(|| BallotError::validation("나이는 필수 항목입니다"))?;
        let new = NewCandidate::new(request.name, request.party, age)?;

        let candidate = bounded(
            self.timeout,
            "insert_candidate",
            self.store.insert_candidate(new),
        )
        .await?;

        info!(candidate_id = %candidate.id, party = %candidate.party, "후보자 등록");
        Ok(candidate)
    }

    /// 후보자 부분 수정. 지정한 필드가 하나도 없으면 검증 에러입니다.
    pub async fn update_candidate(
        &self,
        id: Uuid,
        request: CandidateUpdateRequest,
    ) -> BallotResult<Candidate> {
        let update = CandidateUpdate::from(request);
        if update.is_empty() {
            return Err(BallotError::validation(
                "name, party, age 중 하나 이상을 지정해야 합니다",
            ));
        }
        update.validate()?;

        let candidate = bounded(
            self.timeout,
            "update_candidate",
            self.store.update_candidate(id, update),
        )
        .await?
        .ok_or(BallotError::CandidateNotFound)?;

        info!(candidate_id = %id, "후보자 수정");
        Ok(candidate)
    }

    /// 후보자 삭제.
    pub async fn delete_candidate(&self, id: Uuid) -> BallotResult<()> {
        let deleted = bounded(
            self.timeout,
            "delete_candidate",
            self.store.delete_candidate(id),
        )
        .await?;

        if !deleted {
            return Err(BallotError::CandidateNotFound);
        }

        info!(candidate_id = %id, "후보자 삭제");
        Ok(())
    }

    /// 공개 명부 (득표수 제외).
    pub async fn list_public(&self) -> BallotResult<Vec<CandidateSummary>> {
        Ok(self.list_full().await?.iter().map(Candidate::summary).collect())
    }

    /// 관리자용 전체 명부.
    pub async fn list_full(&self) -> BallotResult<Vec<Candidate>> {
        bounded(self.timeout, "list_candidates", self.store.list_candidates()).await
    }

    /// 득표 집계 (내림차순).
    pub async fn tally(&self, grouping: TallyGrouping) -> BallotResult<TallyReport> {
        let mut tallies =
            bounded(self.timeout, "vote_tallies", self.store.vote_tallies()).await?;

        Ok(match grouping {
            TallyGrouping::Candidate => {
                sort_tallies(&mut tallies);
                TallyReport::Candidates(tallies)
            }
            TallyGrouping::Party => TallyReport::Parties(aggregate_by_party(&tallies)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_core::{AccountStore, MemoryStore, NationalId, NewAccount, Role};

    struct Fixture {
        engine: BallotEngine,
        store: Arc<MemoryStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        Fixture {
            engine: BallotEngine::new(store.clone(), Duration::from_secs(5)),
            store,
        }
    }

    async fn voter(store: &MemoryStore, id: &str) -> Uuid {
        store
            .insert_account(NewAccount {
                national_id: NationalId::parse(id).unwrap(),
                name: "Voter".to_string(),
                age: 40,
                address: "Daegu".to_string(),
                email: None,
                mobile: None,
                password_hash: "$argon2id$placeholder".to_string(),
                role: Role::Voter,
            })
            .await
            .unwrap()
            .id
    }

    fn candidate(name: &str, party: &str) -> CandidateRequest {
        CandidateRequest {
            name: name.to_string(),
            party: party.to_string(),
            age: Some(45),
        }
    }

    #[tokio::test]
    async fn test_vote_once() {
        let f = fixture();
        let voter_id = voter(&f.store, "111111111111").await;
        let c1 = f.engine.create_candidate(candidate("C1", "Blue")).await.unwrap();

        let receipt = f.engine.cast_vote(voter_id, c1.id).await.unwrap();
        assert_eq!(receipt.candidate_id, c1.id);

        assert_eq!(
            f.engine.cast_vote(voter_id, c1.id).await.unwrap_err(),
            BallotError::AlreadyVoted
        );

        let TallyReport::Candidates(tallies) = f.engine.tally(TallyGrouping::Candidate).await.unwrap()
        else {
            panic!("expected candidate tallies");
        };
        assert_eq!(tallies[0].count, 1);
    }

    #[tokio::test]
    async fn test_vote_unknown_candidate_keeps_voter_eligible() {
        let f = fixture();
        let voter_id = voter(&f.store, "111111111111").await;

        assert_eq!(
            f.engine.cast_vote(voter_id, Uuid::new_v4()).await.unwrap_err(),
            BallotError::CandidateNotFound
        );

        let account = f.store.find_account(voter_id).await.unwrap().unwrap();
        assert!(!account.has_voted);
    }

    #[tokio::test]
    async fn test_concurrent_votes_count_once() {
        let f = fixture();
        let voter_id = voter(&f.store, "111111111111").await;
        let candidate_id = f.engine.create_candidate(candidate("C1", "Blue")).await.unwrap().id;

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let engine = f.engine.clone();
                tokio::spawn(async move { engine.cast_vote(voter_id, candidate_id).await })
            })
            .collect();

        let mut recorded = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => recorded += 1,
                Err(BallotError::AlreadyVoted) => rejected += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(recorded, 1);
        assert_eq!(rejected, 15);
        let stored = f.engine.list_full().await.unwrap();
        assert_eq!(stored[0].vote_count, 1);
    }

    #[tokio::test]
    async fn test_tally_by_party() {
        let f = fixture();
        let c1 = f.engine.create_candidate(candidate("C1", "Blue")).await.unwrap();
        let c2 = f.engine.create_candidate(candidate("C2", "Red")).await.unwrap();
        let c3 = f.engine.create_candidate(candidate("C3", "Red")).await.unwrap();

        let v1 = voter(&f.store, "111111111111").await;
        let v2 = voter(&f.store, "222222222222").await;
        let v3 = voter(&f.store, "333333333333").await;
        f.engine.cast_vote(v1, c1.id).await.unwrap();
        f.engine.cast_vote(v2, c2.id).await.unwrap();
        f.engine.cast_vote(v3, c3.id).await.unwrap();

        let TallyReport::Parties(parties) = f.engine.tally(TallyGrouping::Party).await.unwrap()
        else {
            panic!("expected party tallies");
        };
        assert_eq!(parties[0].party, "Red");
        assert_eq!(parties[0].count, 2);
        assert_eq!(parties[1].party, "Blue");
        assert_eq!(parties[1].count, 1);
    }

    #[tokio::test]
    async fn test_candidate_roster_management() {
        let f = fixture();
        let c1 = f.engine.create_candidate(candidate("C1", "Blue")).await.unwrap();

        assert!(matches!(
            f.engine
                .update_candidate(c1.id, CandidateUpdateRequest::default())
                .await,
            Err(BallotError::Validation(_))
        ));
        assert!(matches!(
            f.engine
                .update_candidate(
                    c1.id,
                    CandidateUpdateRequest {
                        age: Some(17),
                        ..Default::default()
                    }
                )
                .await,
            Err(BallotError::Validation(_))
        ));

        let renamed = f
            .engine
            .update_candidate(
                c1.id,
                CandidateUpdateRequest {
                    party: Some("Green".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.party, "Green");
        assert_eq!(renamed.name, "C1");

        let public = f.engine.list_public().await.unwrap();
        assert_eq!(public[0].id, c1.id);

        f.engine.delete_candidate(c1.id).await.unwrap();
        assert_eq!(
            f.engine.delete_candidate(c1.id).await.unwrap_err(),
            BallotError::CandidateNotFound
        );
        assert_eq!(
            f.engine
                .update_candidate(
                    c1.id,
                    CandidateUpdateRequest {
                        name: Some("X".to_string()),
                        ..Default::default()
                    }
                )
                .await
                .unwrap_err(),
            BallotError::CandidateNotFound
        );
    }

    #[tokio::test]
    async fn test_create_candidate_validation() {
        let f = fixture();
        let request = CandidateRequest {
            name: "Young".to_string(),
            party: "Blue".to_string(),
            age: Some(17),
        };
        assert!(matches!(
            f.engine.create_candidate(request).await,
            Err(BallotError::Validation(_))
        ));
    }
}
