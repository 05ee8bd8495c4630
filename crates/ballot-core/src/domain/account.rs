//! 유권자/관리자 계정 도메인 모델.
//!
//! 계정의 자연 키는 12자리 주민 식별번호([`NationalId`])이며,
//! 토큰과 저장소 참조에는 별도로 생성된 UUID(`id`)를 사용합니다.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::Role;
use crate::error::{BallotError, BallotResult};

/// 계정 등록 및 후보자 등록에 적용되는 최소 연령.
pub const MIN_AGE: i32 = 18;

/// 12자리 주민 식별번호.
///
/// 64비트 정수로 저장되므로 선행 0은 허용하지 않습니다.
/// 검증을 통과한 값만 생성할 수 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct NationalId(u64);

impl NationalId {
    /// 식별번호 자릿수
    pub const DIGITS: usize = 12;

    const LOWER: u64 = 100_000_000_000;
    const UPPER: u64 = 999_999_999_999;

    /// 문자열 식별번호 파싱.
    ///
    /// 정확히 12개의 ASCII 숫자로 이루어져야 하며 0으로 시작할 수 없습니다.
    pub fn parse(raw: &str) -> BallotResult<Self> {
        if raw.len() != Self::DIGITS || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BallotError::validation(
                "식별번호는 정확히 12자리 숫자여야 합니다",
            ));
        }
        if raw.starts_with('0') {
            return Err(BallotError::validation("식별번호는 0으로 시작할 수 없습니다"));
        }

        raw.parse::<u64>()
            .map(Self)
            .map_err(|e| BallotError::validation(format!("식별번호 파싱 실패: {}", e)))
    }

    /// 정수 식별번호 검증.
    pub fn from_number(value: u64) -> BallotResult<Self> {
        if (Self::LOWER..=Self::UPPER).contains(&value) {
            Ok(Self(value))
        } else {
            Err(BallotError::validation(
                "식별번호는 정확히 12자리 숫자여야 합니다",
            ))
        }
    }

    /// 저장소(BIGINT) 값에서 복원.
    pub fn from_i64(value: i64) -> BallotResult<Self> {
        u64::try_from(value)
            .map_err(|_| BallotError::validation("음수 식별번호"))
            .and_then(Self::from_number)
    }

    /// 정수 값.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// 저장소(BIGINT) 표현. 12자리 값은 항상 i64 범위 안에 있습니다.
    pub fn as_i64(&self) -> i64 {
        self.0 as i64
    }

    /// 로그용 마스킹 표현 (마지막 4자리만 노출).
    pub fn masked(&self) -> String {
        let digits = self.0.to_string();
        format!("********{}", &digits[Self::DIGITS - 4..])
    }
}

impl fmt::Display for NationalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NationalId {
    type Err = BallotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for NationalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        NationalIdInput::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

/// 요청 본문의 식별번호 입력.
///
/// 클라이언트는 식별번호를 JSON 숫자 또는 문자열로 보낼 수 있습니다.
/// 검증 에러 파라미터에는 받은 형태 그대로 직렬화됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum NationalIdInput {
    Number(u64),
    Text(String),
}

impl NationalIdInput {
    /// 검증된 식별번호로 변환.
    pub fn parse(&self) -> BallotResult<NationalId> {
        match self {
            NationalIdInput::Number(value) => NationalId::from_number(*value),
            NationalIdInput::Text(raw) => NationalId::parse(raw),
        }
    }
}

/// 저장된 계정 레코드.
///
/// 비밀번호는 솔트가 포함된 단방향 해시(PHC 문자열)로만 보관합니다.
/// 이 타입은 직렬화되지 않으며, 외부로는 [`AccountProfile`]만 노출합니다.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub national_id: NationalId,
    pub name: String,
    pub age: i32,
    pub address: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub password_hash: String,
    pub role: Role,
    /// 투표 여부. false → true 로 단 한 번만 전이합니다.
    pub has_voted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("national_id", &self.national_id.masked())
            .field("name", &self.name)
            .field("role", &self.role)
            .field("has_voted", &self.has_voted)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl Account {
    /// 새 계정 입력으로부터 레코드 생성.
    pub fn from_new(input: NewAccount) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            national_id: input.national_id,
            name: input.name,
            age: input.age,
            address: input.address,
            email: input.email,
            mobile: input.mobile,
            password_hash: input.password_hash,
            role: input.role,
            has_voted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// 관리자 계정 여부.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// 외부 노출용 프로필.
    pub fn profile(&self) -> AccountProfile {
        AccountProfile::from(self)
    }
}

/// 저장소에 삽입할 새 계정.
///
/// `password_hash`는 이미 해싱된 값이어야 합니다.
#[derive(Clone)]
pub struct NewAccount {
    pub national_id: NationalId,
    pub name: String,
    pub age: i32,
    pub address: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

impl fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewAccount")
            .field("national_id", &self.national_id.masked())
            .field("name", &self.name)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// 비밀번호 해시를 제외한 계정 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AccountProfile {
    pub id: Uuid,
    pub national_id: NationalId,
    pub name: String,
    pub age: i32,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    pub role: Role,
    pub has_voted: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountProfile {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            national_id: account.national_id,
            name: account.name.clone(),
            age: account.age,
            address: account.address.clone(),
            email: account.email.clone(),
            mobile: account.mobile.clone(),
            role: account.role,
            has_voted: account.has_voted,
            created_at: account.created_at,
        }
    }
}

/// 최소 연령 검증.
pub fn validate_age(age: i32) -> BallotResult<()> {
    if age < MIN_AGE {
        return Err(BallotError::validation(format!(
            "나이는 {}세 이상이어야 합니다",
            MIN_AGE
        )));
    }
    Ok(())
}

/// 필수 텍스트 필드 검증 (공백만 있는 값은 거부).
pub fn require_text(field: &str, value: &str) -> BallotResult<()> {
    if value.trim().is_empty() {
        return Err(BallotError::validation(format!("{}은(는) 필수 항목입니다", field)));
    }
    Ok(())
}
