//! 계정 자격증명 저장소.
//!
//! 계정 레코드를 소유하며 비밀번호 해싱과 검증을 담당합니다.
//! 평문 비밀번호는 이 모듈 밖으로 저장되거나 기록되지 않습니다.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ballot_core::{
    require_text, validate_age, Account, BallotError, BallotResult, ElectionStore, NationalId,
    NewAccount, Role,
};
use tokio::sync::OnceCell;
use tracing::{error, info};
use uuid::Uuid;

use super::bounded;
use crate::auth::{hash_password_blocking, verify_password_blocking, PasswordError};

/// 계정 생성 입력 (평문 비밀번호 포함).
#[derive(Clone)]
pub struct AccountDraft {
    pub national_id: NationalId,
    pub name: String,
    pub age: i32,
    pub address: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub password: String,
    pub role: Role,
}

impl fmt::Debug for AccountDraft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountDraft")
            .field("national_id", &self.national_id.masked())
            .field("name", &self.name)
            .field("age", &self.age)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

/// 자격증명 저장소.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn ElectionStore>,
    timeout: Duration,
    /// 존재하지 않는 식별번호 로그인 시 비교에 쓰는 해시 (응답 시간 균일화)
    decoy_hash: Arc<OnceCell<String>>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn ElectionStore>, timeout: Duration) -> Self {
        Self {
            store,
            timeout,
            decoy_hash: Arc::new(OnceCell::new()),
        }
    }

    /// 계정 생성.
    ///
    /// # Errors
    ///
    /// - `Validation`: 나이 18세 미만, 필수 항목 누락
    /// - `DuplicateIdentity`: 식별번호 중복
    /// - `DuplicateAdmin`: 관리자 계정이 이미 존재
    pub async fn create_account(&self, draft: AccountDraft) -> BallotResult<Account> {
        validate_age(draft.age)?;
        require_text("이름", &draft.name)?;
        require_text("주소", &draft.address)?;
        if draft.password.is_empty() {
            return Err(BallotError::validation("비밀번호는 필수 항목입니다"));
        }

        let password_hash = hash_password_blocking(draft.password)
            .await
            .map_err(password_failure)?;

        let account = bounded(
            self.timeout,
            "insert_account",
            self.store.insert_account(NewAccount {
                national_id: draft.national_id,
                name: draft.name.trim().to_string(),
                age: draft.age,
                address: draft.address.trim().to_string(),
                email: non_blank(draft.email),
                mobile: non_blank(draft.mobile),
                password_hash,
                role: draft.role,
            }),
        )
        .await?;

        info!(
            account_id = %account.id,
            national_id = %account.national_id.masked(),
            role = %account.role,
            "계정 생성"
        );
        Ok(account)
    }

    /// ID로 계정 조회.
    pub async fn find_account(&self, id: Uuid) -> BallotResult<Option<Account>> {
        bounded(self.timeout, "find_account", self.store.find_account(id)).await
    }

    /// 저장된 해시와 비밀번호 비교.
    pub async fn verify_password(&self, account: &Account, plaintext: &str) -> BallotResult<bool> {
        check(plaintext, account.password_hash.clone()).await
    }

    /// 식별번호와 비밀번호로 계정 확인.
    ///
    /// 식별번호가 없을 때도 해시 비교를 수행하므로 응답 시간으로 계정 존재 여부를 알 수 없습니다.
    pub async fn authenticate(
        &self,
        national_id: NationalId,
        plaintext: &str,
    ) -> BallotResult<Option<Account>> {
        let account = bounded(
            self.timeout,
            "find_account_by_national_id",
            self.store.find_account_by_national_id(national_id),
        )
        .await?;

        match account {
            Some(account) => {
                let matches = self.verify_password(&account, plaintext).await?;
                Ok(matches.then_some(account))
            }
            None => {
                let decoy = self
                    .decoy_hash
                    .get_or_try_init(|| hash_password_blocking(Uuid::new_v4().to_string()))
                    .await
                    .map_err(password_failure)?;
                check(plaintext, decoy.clone()).await?;
                Ok(None)
            }
        }
    }

    /// 비밀번호 재해싱 후 교체.
    pub async fn update_password(&self, account_id: Uuid, new_plaintext: String) -> BallotResult<()> {
        if new_plaintext.is_empty() {
            return Err(BallotError::validation("새 비밀번호는 필수 항목입니다"));
        }

        let password_hash = hash_password_blocking(new_plaintext)
            .await
            .map_err(password_failure)?;

        let updated = bounded(
            self.timeout,
            "update_password_hash",
            self.store.update_password_hash(account_id, &password_hash),
        )
        .await?;

        if !updated {
            return Err(BallotError::AccountNotFound);
        }

        info!(account_id = %account_id, "비밀번호 변경");
        Ok(())
    }
}

async fn check(plaintext: &str, hash: String) -> BallotResult<bool> {
    match verify_password_blocking(plaintext.to_string(), hash).await {
        Ok(()) => Ok(true),
        Err(PasswordError::Mismatch) => Ok(false),
        Err(e) => Err(password_failure(e)),
    }
}

fn password_failure(err: PasswordError) -> BallotError {
    error!(error = %err, "비밀번호 처리 실패");
    BallotError::Internal(err.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_core::MemoryStore;

    fn credentials() -> CredentialStore {
        CredentialStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(5))
    }

    fn draft(id: &str, role: Role) -> AccountDraft {
        AccountDraft {
            national_id: NationalId::parse(id).unwrap(),
            name: " Hong Gildong ".to_string(),
            age: 30,
            address: "Seoul".to_string(),
            email: Some("  ".to_string()),
            mobile: None,
            password: "s3cret!".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_account_hashes_password() {
        let store = credentials();
        let account = store.create_account(draft("111111111111", Role::Voter)).await.unwrap();

        assert_eq!(account.name, "Hong Gildong");
        assert_eq!(account.email, None);
        assert!(!account.has_voted);
        assert!(account.password_hash.starts_with("$argon2id$"));
        assert!(!account.password_hash.contains("s3cret!"));
        assert!(store.verify_password(&account, "s3cret!").await.unwrap());
        assert!(!store.verify_password(&account, "wrong").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_account_rejects_underage() {
        let store = credentials();
        let mut input = draft("111111111111", Role::Voter);
        input.age = 17;

        assert!(matches!(
            store.create_account(input).await,
            Err(BallotError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_identity_and_admin() {
        let store = credentials();
        store.create_account(draft("111111111111", Role::Admin)).await.unwrap();

        assert_eq!(
            store.create_account(draft("111111111111", Role::Voter)).await.unwrap_err(),
            BallotError::DuplicateIdentity
        );
        assert_eq!(
            store.create_account(draft("222222222222", Role::Admin)).await.unwrap_err(),
            BallotError::DuplicateAdmin
        );
    }

    #[tokio::test]
    async fn test_authenticate() {
        let store = credentials();
        let account = store.create_account(draft("111111111111", Role::Voter)).await.unwrap();
        let id = account.national_id;

        assert_eq!(store.authenticate(id, "s3cret!").await.unwrap().map(|a| a.id), Some(account.id));
        assert!(store.authenticate(id, "nope").await.unwrap().is_none());

        let unknown = NationalId::parse("999999999999").unwrap();
        assert!(store.authenticate(unknown, "s3cret!").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_password() {
        let store = credentials();
        let account = store.create_account(draft("111111111111", Role::Voter)).await.unwrap();

        store.update_password(account.id, "n3w-pass".to_string()).await.unwrap();
        let reloaded = store.find_account(account.id).await.unwrap().unwrap();

        assert!(store.verify_password(&reloaded, "n3w-pass").await.unwrap());
        assert!(!store.verify_password(&reloaded, "s3cret!").await.unwrap());

        assert_eq!(
            store.update_password(Uuid::new_v4(), "x".to_string()).await.unwrap_err(),
            BallotError::AccountNotFound
        );
    }
}
