//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! Arc로 래핑되어 여러 요청 간에 공유됩니다. 서명 키와 TTL 외에는
//! 프로세스 내 가변 상태가 없으며, 모든 계정/투표 상태는 저장소에 있습니다.

use std::sync::Arc;
use std::time::Duration;

use ballot_core::ElectionStore;

use crate::auth::SessionIssuer;
use crate::services::{AccountService, BallotEngine, CredentialStore};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 저장소 (PostgreSQL 또는 인메모리)
    pub store: Arc<dyn ElectionStore>,

    /// 세션 토큰 발급기
    pub sessions: Arc<SessionIssuer>,

    /// 가입/로그인/비밀번호 변경
    pub accounts: AccountService,

    /// 투표 및 후보자 명부
    pub ballot: BallotEngine,

    /// 저장소 호출 시간 제한
    pub store_timeout: Duration,

    /// 서버 시작 시각
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// 서버 버전
    pub version: String,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ElectionStore>,
        sessions: SessionIssuer,
        store_timeout: Duration,
    ) -> Self {
        let sessions = Arc::new(sessions);
        let credentials = CredentialStore::new(store.clone(), store_timeout);

        Self {
            accounts: AccountService::new(credentials, sessions.clone()),
            ballot: BallotEngine::new(store.clone(), store_timeout),
            store,
            sessions,
            store_timeout,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 가동 시간 (초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 저장소 연결 상태 확인 (시간 제한 적용).
    pub async fn is_store_healthy(&self) -> bool {
        matches!(
            tokio::time::timeout(self.store_timeout, self.store.ping()).await,
            Ok(Ok(()))
        )
    }
}

/// 테스트용 서명 키.
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_JWT_SECRET: &str = "test-secret-key-for-ballot-api-minimum-32-chars";

/// 테스트용 AppState 생성 헬퍼.
///
/// 인메모리 저장소와 24시간 TTL 발급기를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use secrecy::SecretString;

    let sessions = SessionIssuer::new(
        &SecretString::from(TEST_JWT_SECRET.to_string()),
        chrono::Duration::hours(24),
    );
    AppState::new(
        Arc::new(ballot_core::MemoryStore::new()),
        sessions,
        Duration::from_secs(5),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_defaults() {
        let state = create_test_state();

        assert_eq!(state.store.backend(), "memory");
        assert!(state.is_store_healthy().await);
        assert!(state.uptime_secs() >= 0);
        assert_eq!(state.sessions.ttl(), chrono::Duration::hours(24));
    }
}
