//! 후보자 명부 및 득표 집계.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::{require_text, validate_age};
use crate::error::BallotResult;

/// 후보자 레코드.
///
/// `vote_count`는 투표 엔진을 통해서만 1씩 증가하며 감소하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: Uuid,
    pub name: String,
    pub party: String,
    pub age: i32,
    pub vote_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    /// 새 후보자 입력으로부터 레코드 생성 (득표수 0).
    pub fn from_new(input: NewCandidate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: input.name,
            party: input.party,
            age: input.age,
            vote_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// 공개 명부용 요약.
    pub fn summary(&self) -> CandidateSummary {
        CandidateSummary {
            id: self.id,
            name: self.name.clone(),
            party: self.party.clone(),
        }
    }

    /// 집계 항목.
    pub fn tally(&self) -> VoteTally {
        VoteTally {
            candidate_id: self.id,
            name: self.name.clone(),
            party: self.party.clone(),
            count: self.vote_count,
        }
    }

    /// 부분 수정 적용. 득표수는 변경하지 않습니다.
    pub fn apply(&mut self, update: &CandidateUpdate) {
        if let Some(name) = &update.name {
            self.name = name.trim().to_string();
        }
        if let Some(party) = &update.party {
            self.party = party.trim().to_string();
        }
        if let Some(age) = update.age {
            self.age = age;
        }
        self.updated_at = Utc::now();
    }
}

/// 새 후보자 입력.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCandidate {
    pub name: String,
    pub party: String,
    pub age: i32,
}

impl NewCandidate {
    /// 검증된 후보자 입력 생성.
    pub fn new(name: impl Into<String>, party: impl Into<String>, age: i32) -> BallotResult<Self> {
        let name = name.into();
        let party = party.into();

        require_text("이름", &name)?;
        require_text("정당", &party)?;
        validate_age(age)?;

        Ok(Self {
            name: name.trim().to_string(),
            party: party.trim().to_string(),
            age,
        })
    }
}

/// 후보자 부분 수정 입력.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateUpdate {
    pub name: Option<String>,
    pub party: Option<String>,
    pub age: Option<i32>,
}

impl CandidateUpdate {
    /// 지정된 필드만 생성 시와 동일한 규칙으로 검증합니다.
    pub fn validate(&self) -> BallotResult<()> {
        if let Some(name) = &self.name {
            require_text("이름", name)?;
        }
        if let Some(party) = &self.party {
            require_text("정당", party)?;
        }
        if let Some(age) = self.age {
            validate_age(age)?;
        }
        Ok(())
    }

    /// 변경할 필드가 없는지 확인.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.party.is_none() && self.age.is_none()
    }
}

/// 공개 명부 항목. 안정적인 식별자를 항상 포함합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CandidateSummary {
    pub id: Uuid,
    pub name: String,
    pub party: String,
}

/// 후보자별 득표 집계.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub candidate_id: Uuid,
    pub name: String,
    pub party: String,
    pub count: i64,
}

/// 정당별 득표 집계.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct PartyTally {
    pub party: String,
    pub count: i64,
}

/// 집계 단위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum TallyGrouping {
    #[default]
    Candidate,
    Party,
}

/// 득표 내림차순 정렬. 동률은 정당, 이름 오름차순.
pub fn sort_tallies(tallies: &mut [VoteTally]) {
    tallies.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.party.cmp(&b.party))
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// 후보자별 집계를 정당별로 합산하여 득표 내림차순으로 반환.
pub fn aggregate_by_party(tallies: &[VoteTally]) -> Vec<PartyTally> {
    let mut totals: HashMap<&str, i64> = HashMap::new();
    for tally in tallies {
        *totals.entry(tally.party.as_str()).or_insert(0) += tally.count;
    }

    let mut parties: Vec<PartyTally> = totals
        .into_iter()
        .map(|(party, count)| PartyTally {
            party: party.to_string(),
            count,
        })
        .collect();

    parties.sort_by(|a, b| match b.count.cmp(&a.count) {
        Ordering::Equal => a.party.cmp(&b.party),
        other => other,
    });
    parties
}
