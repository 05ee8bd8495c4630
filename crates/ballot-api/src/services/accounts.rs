//! 가입, 로그인, 비밀번호 변경.
//!
//! 로그인 실패는 "없는 식별번호"와 "틀린 비밀번호"를 구분하지 않고
//! 항상 동일한 `InvalidCredentials`를 반환합니다.

use std::sync::Arc;

use ballot_core::{AccountProfile, BallotError, BallotResult, NationalIdInput, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::credentials::{AccountDraft, CredentialStore};
use super::validation_error;
use crate::auth::SessionIssuer;
use crate::metrics::{record_login, record_registration};

// =============================================================================
// 요청/응답 타입
// =============================================================================

/// 가입 요청.
#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// 12자리 식별번호 (숫자 또는 문자열)
    #[validate(required(message = "식별번호는 필수 항목입니다"))]
    #[schema(value_type = String, example = "111111111111")]
    pub national_id: Option<NationalIdInput>,
    #[serde(default)]
    #[validate(length(min = 1, message = "이름은 필수 항목입니다"))]
    pub name: String,
    /// 18세 이상
    #[validate(required(message = "나이는 필수 항목입니다"))]
    #[validate(range(min = 18, message = "나이는 18세 이상이어야 합니다"))]
    pub age: Option<i32>,
    #[serde(default)]
    #[validate(length(min = 1, message = "주소는 필수 항목입니다"))]
    pub address: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "비밀번호는 필수 항목입니다"))]
    pub password: String,
    /// "voter" (기본) 또는 "admin"
    #[serde(default)]
    pub role: Option<String>,
}

/// 로그인 요청.
#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(required(message = "식별번호는 필수 항목입니다"))]
    #[schema(value_type = String, example = "111111111111")]
    pub national_id: Option<NationalIdInput>,
    #[validate(required(message = "비밀번호는 필수 항목입니다"))]
    #[validate(length(min = 1, message = "비밀번호는 필수 항목입니다"))]
    pub password: Option<String>,
}

/// 비밀번호 변경 요청.
#[derive(Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "현재 비밀번호는 필수 항목입니다"))]
    pub current_password: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "새 비밀번호는 필수 항목입니다"))]
    pub new_password: String,
}

/// 가입/로그인 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub account: AccountProfile,
    /// Bearer 토큰
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// 서비스
// =============================================================================

/// 계정 흐름 서비스.
#[derive(Clone)]
pub struct AccountService {
    credentials: CredentialStore,
    sessions: Arc<SessionIssuer>,
}

impl AccountService {
    pub fn new(credentials: CredentialStore, sessions: Arc<SessionIssuer>) -> Self {
        Self {
            credentials,
            sessions,
        }
    }

    /// 가입 후 새 계정에 바인딩된 토큰 발급.
    ///
    /// 식별번호 형식은 저장소에 접근하기 전에 검증합니다.
    pub async fn register(&self, request: RegisterRequest) -> BallotResult<AuthResponse> {
        let result = self.try_register(request).await;
        record_registration(match &result {
            Ok(_) => "success",
            Err(BallotError::DuplicateIdentity) => "duplicate_identity",
            Err(BallotError::DuplicateAdmin) => "duplicate_admin",
            Err(BallotError::Validation(_)) => "invalid",
            Err(_) => "error",
        });
        result
    }

    async fn try_register(&self, request: RegisterRequest) -> BallotResult<AuthResponse> {
        request.validate().map_err(validation_error)?;

        let national_id = match &request.national_id {
            Some(input) => input.parse()?,
            None => return Err(BallotError::validation("식별번호는 필수 항목입니다")),
        };
        let age = request
            .age
            .ok_or_else(|| BallotError::validation("나이는 필수 항목입니다"))?;
        let role = parse_role(request.role.as_deref())?;

        let account = self
            .credentials
            .create_account(AccountDraft {
                national_id,
                name: request.name,
                age,
                address: request.address,
                email: request.email,
                mobile: request.mobile,
                password: request.password,
                role,
            })
            .await?;

        let issued = self
            .sessions
            .issue(account.id, account.role)
            .map_err(|e| BallotError::Internal(e.to_string()))?;

        Ok(AuthResponse {
            account: account.profile(),
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// 로그인.
    ///
    /// # Errors
    ///
    /// - `Validation`: 식별번호 또는 비밀번호 누락
    /// - `InvalidCredentials`: 그 외 모든 인증 실패
    pub async fn login(&self, request: LoginRequest) -> BallotResult<AuthResponse> {
        let result = self.try_login(request).await;
        record_login(match &result {
            Ok(_) => "success",
            Err(BallotError::InvalidCredentials) => "invalid_credentials",
            Err(BallotError::Validation(_)) => "invalid",
            Err(_) => "error",
        });
        result
    }

    async fn try_login(&self, request: LoginRequest) -> BallotResult<AuthResponse> {
        request.validate().map_err(validation_error)?;

        let (Some(input), Some(password)) = (request.national_id, request.password) else {
            return Err(BallotError::validation("식별번호와 비밀번호는 필수 항목입니다"));
        };

        // 형식이 틀린 식별번호도 존재하지 않는 계정과 동일하게 응답
        let Ok(national_id) = input.parse() else {
            warn!("로그인 실패: 식별번호 형식 오류");
            return Err(BallotError::InvalidCredentials);
        };

        let Some(account) = self.credentials.authenticate(national_id, &password).await? else {
            warn!(national_id = %national_id.masked(), "로그인 실패");
            return Err(BallotError::InvalidCredentials);
        };

        let issued = self
            .sessions
            .issue(account.id, account.role)
            .map_err(|e| BallotError::Internal(e.to_string()))?;

        info!(account_id = %account.id, role = %account.role, "로그인 성공");

        Ok(AuthResponse {
            account: account.profile(),
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// 계정 정보 (비밀번호 해시 제외).
    pub async fn profile(&self, account_id: Uuid) -> BallotResult<AccountProfile> {
        self.credentials
            .find_account(account_id)
            .await?
            .map(|account| account.profile())
            .ok_or(BallotError::AccountNotFound)
    }

    /// 현재 비밀번호 확인 후 변경.
    pub async fn change_password(
        &self,
        account_id: Uuid,
        request: ChangePasswordRequest,
    ) -> BallotResult<()> {
        request.validate().map_err(validation_error)?;

        let account = self
            .credentials
            .find_account(account_id)
            .await?
            .ok_or(BallotError::AccountNotFound)?;

        if !self
            .credentials
            .verify_password(&account, &request.current_password)
            .await?
        {
            warn!(account_id = %account_id, "비밀번호 변경 거부: 현재 비밀번호 불일치");
            return Err(BallotError::InvalidCredentials);
        }

        self.credentials
            .update_password(account_id, request.new_password)
            .await
    }
}

fn parse_role(raw: Option<&str>) -> BallotResult<Role> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Role::Voter),
        Some(value) => Role::parse(value)
            .ok_or_else(|| BallotError::validation(format!("알 수 없는 역할: {}", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballot_core::MemoryStore;
    use chrono::Duration;
    use secrecy::SecretString;

    fn service() -> AccountService {
        let credentials = CredentialStore::new(
            Arc::new(MemoryStore::new()),
            std::time::Duration::from_secs(5),
        );
        let sessions = SessionIssuer::new(
            &SecretString::from("account-service-test-secret-0123456789".to_string()),
            Duration::hours(24),
        );
        AccountService::new(credentials, Arc::new(sessions))
    }

    fn register_json(value: serde_json::Value) -> RegisterRequest {
        serde_json::from_value(value).unwrap()
    }

    fn voter(id: &str) -> RegisterRequest {
        register_json(serde_json::json!({
            "nationalId": id,
            "name": "Kim",
            "age": 30,
            "address": "Busan",
            "password": "pw-1234"
        }))
    }

    fn login(id: serde_json::Value, password: &str) -> LoginRequest {
        serde_json::from_value(serde_json::json!({ "nationalId": id, "password": password }))
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_then_login_resolves_same_account() {
        let service = service();
        let registered = service.register(voter("111111111111")).await.unwrap();
        assert_eq!(registered.account.role, Role::Voter);

        let logged_in = service
            .login(login(serde_json::json!(111111111111u64), "pw-1234"))
            .await
            .unwrap();

        assert_eq!(logged_in.account.id, registered.account.id);
        let claims = service.sessions.verify(&logged_in.token).unwrap();
        assert_eq!(claims.sub, registered.account.id);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = service();

        for id in ["11111111111", "1111111111111", "abcdefghijkl"] {
            assert!(matches!(
                service.register(voter(id)).await,
                Err(BallotError::Validation(_))
            ));
        }

        let underage = register_json(serde_json::json!({
            "nationalId": "111111111111",
            "name": "Kim",
            "age": 17,
            "address": "Busan",
            "password": "pw"
        }));
        assert!(matches!(
            service.register(underage).await,
            Err(BallotError::Validation(_))
        ));

        let missing = register_json(serde_json::json!({ "name": "Kim" }));
        let err = service.register(missing).await.unwrap_err();
        match err {
            BallotError::Validation(message) => {
                assert!(message.contains("식별번호"));
                assert!(message.contains("나이"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_role() {
        let service = service();
        let mut admin = voter("111111111111");
        admin.role = Some("admin".to_string());
        assert_eq!(service.register(admin).await.unwrap().account.role, Role::Admin);

        let mut second = voter("222222222222");
        second.role = Some("admin".to_string());
        assert_eq!(service.register(second).await.unwrap_err(), BallotError::DuplicateAdmin);

        let mut unknown = voter("333333333333");
        unknown.role = Some("root".to_string());
        assert!(matches!(
            service.register(unknown).await,
            Err(BallotError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let service = service();
        service.register(voter("111111111111")).await.unwrap();

        let wrong_password = service
            .login(login(serde_json::json!("111111111111"), "nope"))
            .await
            .unwrap_err();
        let unknown_id = service
            .login(login(serde_json::json!("999999999999"), "pw-1234"))
            .await
            .unwrap_err();
        let malformed_id = service
            .login(login(serde_json::json!("123"), "pw-1234"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password, BallotError::InvalidCredentials);
        assert_eq!(unknown_id, BallotError::InvalidCredentials);
        assert_eq!(malformed_id, BallotError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_login_missing_fields() {
        let service = service();
        let request: LoginRequest =
            serde_json::from_value(serde_json::json!({ "nationalId": "111111111111" })).unwrap();

        assert!(matches!(
            service.login(request).await,
            Err(BallotError::Validation(_))
        ));

        let request: LoginRequest =
            serde_json::from_value(serde_json::json!({ "password": "pw-1234" })).unwrap();
        match service.login(request).await {
            Err(BallotError::Validation(message)) => assert!(message.contains("식별번호")),
            other => panic!("unexpected result: {:?}", other.map(|r| r.account.id)),
        }
    }

    #[tokio::test]
    async fn test_change_password() {
        let service = service();
        let registered = service.register(voter("111111111111")).await.unwrap();
        let id = registered.account.id;

        let wrong = ChangePasswordRequest {
            current_password: "bad".to_string(),
            new_password: "next".to_string(),
        };
        assert_eq!(
            service.change_password(id, wrong).await.unwrap_err(),
            BallotError::InvalidCredentials
        );

        let right = ChangePasswordRequest {
            current_password: "pw-1234".to_string(),
            new_password: "next".to_string(),
        };
        service.change_password(id, right).await.unwrap();

        assert!(service
            .login(login(serde_json::json!("111111111111"), "next"))
            .await
            .is_ok());
        assert_eq!(
            service
                .login(login(serde_json::json!("111111111111"), "pw-1234"))
                .await
                .unwrap_err(),
            BallotError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn test_profile_unknown_account() {
        assert_eq!(
            service().profile(Uuid::new_v4()).await.unwrap_err(),
            BallotError::AccountNotFound
        );
    }
}
