//! 인메모리 저장소.
//!
//! 단일 `RwLock`이 계정과 후보자를 함께 보호하므로 모든 변경은 선형화됩니다.
//! 데이터베이스 없이 서버를 띄우거나 테스트할 때 사용합니다.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    Account, AccountStore, BallotStore, Candidate, CandidateStore, CandidateUpdate,
    ElectionStore, NationalId, NewAccount, NewCandidate, StoreError, VoteOutcome, VoteTally,
};

#[derive(Debug, Default)]
struct Inner {
    accounts: HashMap<Uuid, Account>,
    by_national_id: HashMap<NationalId, Uuid>,
    admin_id: Option<Uuid>,
    candidates: HashMap<Uuid, Candidate>,
}

/// 프로세스 메모리에만 존재하는 저장소.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// 빈 저장소 생성.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.by_national_id.contains_key(&account.national_id) {
            return Err(StoreError::DuplicateIdentity);
        }
        let is_admin = account.role == crate::domain::Role::Admin;
        if is_admin && inner.admin_id.is_some() {
            return Err(StoreError::DuplicateAdmin);
        }

        let record = Account::from_new(account);
        inner.by_national_id.insert(record.national_id, record.id);
        if is_admin {
            inner.admin_id = Some(record.id);
        }
        inner.accounts.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_account(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_national_id(
        &self,
        national_id: NationalId,
    ) -> Result<Option<Account>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_national_id
            .get(&national_id)
            .and_then(|id| inner.accounts.get(id))
            .cloned())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.accounts.get_mut(&id) {
            Some(account) => {
                account.password_hash = password_hash.to_string();
                account.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl CandidateStore for MemoryStore {
    async fn insert_candidate(&self, candidate: NewCandidate) -> Result<Candidate, StoreError> {
        let record = Candidate::from_new(candidate);
        self.inner
            .write()
            .await
            .candidates
            .insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_candidate(&self, id: Uuid) -> Result<Option<Candidate>, StoreError> {
        Ok(self.inner.read().await.candidates.get(&id).cloned())
    }

    async fn update_candidate(
        &self,
        id: Uuid,
        update: CandidateUpdate,
    ) -> Result<Option<Candidate>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.candidates.get_mut(&id).map(|candidate| {
            candidate.apply(&update);
            candidate.clone()
        }))
    }

    async fn delete_candidate(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.candidates.remove(&id).is_some())
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
        let mut candidates: Vec<Candidate> =
            self.inner.read().await.candidates.values().cloned().collect();
        candidates.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(candidates)
    }

    async fn vote_tallies(&self) -> Result<Vec<VoteTally>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .candidates
            .values()
            .map(Candidate::tally)
            .collect())
    }
}

#[async_trait]
impl BallotStore for MemoryStore {
    async fn record_vote(&self, voter_id: Uuid, candidate_id: Uuid) -> Result<VoteOutcome, StoreError> {
        // 확인부터 증가까지 쓰기 락을 유지
        let mut inner = self.inner.write().await;

        if !inner.candidates.contains_key(&candidate_id) {
            return Ok(VoteOutcome::CandidateNotFound);
        }

        let Some(voter) = inner.accounts.get_mut(&voter_id) else {
            return Ok(VoteOutcome::VoterNotFound);
        };
        if voter.has_voted {
            return Ok(VoteOutcome::AlreadyVoted);
        }
        voter.has_voted = true;
        voter.updated_at = Utc::now();

        let candidate = inner
            .candidates
            .get_mut(&candidate_id)
            .ok_or_else(|| StoreError::Corrupt("후보자가 락 보유 중 사라짐".to_string()))?;
        candidate.vote_count += 1;

        Ok(VoteOutcome::Recorded {
            vote_count: candidate.vote_count,
        })
    }
}

#[async_trait]
impl ElectionStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::Role;

    fn new_account(id: &str, role: Role) -> NewAccount {
        NewAccount {
            national_id: NationalId::parse(id).unwrap(),
            name: "Tester".to_string(),
            age: 30,
            address: "Busan".to_string(),
            email: None,
            mobile: None,
            password_hash: "$argon2id$stub".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_duplicate_identity_rejected() {
        let store = MemoryStore::new();
        store
            .insert_account(new_account("111111111111", Role::Voter))
            .await
            .unwrap();

        let result = store
            .insert_account(new_account("111111111111", Role::Voter))
            .await;
        assert_eq!(result.unwrap_err(), StoreError::DuplicateIdentity);
    }

    #[tokio::test]
    async fn test_single_admin_enforced() {
        let store = MemoryStore::new();
        store
            .insert_account(new_account("100000000001", Role::Admin))
            .await
            .unwrap();

        let result = store
            .insert_account(new_account("100000000002", Role::Admin))
            .await;
        assert_eq!(result.unwrap_err(), StoreError::DuplicateAdmin);

        // 일반 유권자는 계속 등록 가능
        assert!(store
            .insert_account(new_account("100000000003", Role::Voter))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_admin_inserts_allow_one() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for i in 0..8u64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = (200_000_000_000 + i).to_string();
                store.insert_account(new_account(&id, Role::Admin)).await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }

    #[tokio::test]
    async fn test_record_vote_once() {
        let store = MemoryStore::new();
        let voter = store
            .insert_account(new_account("111111111111", Role::Voter))
            .await
            .unwrap();
        let candidate = store
            .insert_candidate(NewCandidate::new("Kim", "Blue", 40).unwrap())
            .await
            .unwrap();

        assert_eq!(
            store.record_vote(voter.id, candidate.id).await.unwrap(),
            VoteOutcome::Recorded { vote_count: 1 }
        );
        assert_eq!(
            store.record_vote(voter.id, candidate.id).await.unwrap(),
            VoteOutcome::AlreadyVoted
        );

        let stored = store.find_candidate(candidate.id).await.unwrap().unwrap();
        assert_eq!(stored.vote_count, 1);
        assert!(store.find_account(voter.id).await.unwrap().unwrap().has_voted);
    }

    #[tokio::test]
    async fn test_record_vote_unknown_candidate_leaves_voter_untouched() {
        let store = MemoryStore::new();
        let voter = store
            .insert_account(new_account("111111111111", Role::Voter))
            .await
            .unwrap();

        assert_eq!(
            store.record_vote(voter.id, Uuid::new_v4()).await.unwrap(),
            VoteOutcome::CandidateNotFound
        );
        assert!(!store.find_account(voter.id).await.unwrap().unwrap().has_voted);
    }

    #[tokio::test]
    async fn test_update_and_delete_candidate() {
        let store = MemoryStore::new();
        let candidate = store
            .insert_candidate(NewCandidate::new("Kim", "Blue", 40).unwrap())
            .await
            .unwrap();

        let updated = store
            .update_candidate(
                candidate.id,
                CandidateUpdate {
                    name: Some("Lee".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Lee");

        assert!(store.delete_candidate(candidate.id).await.unwrap());
        assert!(!store.delete_candidate(candidate.id).await.unwrap());
        assert!(store
            .update_candidate(candidate.id, CandidateUpdate::default())
            .await
            .unwrap()
            .is_none());
    }
}
