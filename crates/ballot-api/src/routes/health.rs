//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템에서 사용합니다.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 전체 상태 ("healthy" | "unhealthy")
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
    /// 현재 시간 (ISO 8601)
    pub timestamp: String,
    pub components: ComponentHealth,
}

/// 개별 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentHealth {
    /// 저장소 연결 상태
    pub store: ComponentStatus,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    /// "up" | "down"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ComponentStatus {
    pub fn up(message: impl Into<String>) -> Self {
        Self {
            status: "up".to_string(),
            message: Some(message.into()),
        }
    }

    pub fn down(message: impl Into<String>) -> Self {
        Self {
            status: "down".to_string(),
            message: Some(message.into()),
        }
    }
}

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "서버 응답 가능")),
    tag = "health"
)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Readiness probe. 저장소 왕복을 시간 제한 안에서 확인합니다.
#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "정상", body = HealthResponse),
        (status = 503, description = "저장소 사용 불가", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let backend = state.store.backend();
    let (status, code, store) = if state.is_store_healthy().await {
        ("healthy", StatusCode::OK, ComponentStatus::up(backend))
    } else {
        (
            "unhealthy",
            StatusCode::SERVICE_UNAVAILABLE,
            ComponentStatus::down(format!("{} 연결 실패", backend)),
        )
    };

    let response = HealthResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        components: ComponentHealth { store },
    };

    (code, Json(response))
}

/// 헬스 체크 라우터.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(health_ready))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use ballot_core::{
        Account, AccountStore, BallotStore, Candidate, CandidateStore, CandidateUpdate,
        ElectionStore, NationalId, NewAccount, NewCandidate, StoreError, VoteOutcome, VoteTally,
    };
    use secrecy::SecretString;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::SessionIssuer;
    use crate::state::create_test_state;

    /// 모든 호출이 연결 실패로 끝나는 저장소.
    struct DownStore;

    #[async_trait]
    impl AccountStore for DownStore {
        async fn insert_account(&self, _: NewAccount) -> Result<Account, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn find_account(&self, _: Uuid) -> Result<Option<Account>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn find_account_by_national_id(
            &self,
            _: NationalId,
        ) -> Result<Option<Account>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn update_password_hash(&self, _: Uuid, _: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
    }

    #[async_trait]
    impl CandidateStore for DownStore {
        async fn insert_candidate(&self, _: NewCandidate) -> Result<Candidate, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn find_candidate(&self, _: Uuid) -> Result<Option<Candidate>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn update_candidate(
            &self,
            _: Uuid,
            _: CandidateUpdate,
        ) -> Result<Option<Candidate>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn delete_candidate(&self, _: Uuid) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn list_candidates(&self) -> Result<Vec<Candidate>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        async fn vote_tallies(&self) -> Result<Vec<VoteTally>, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
    }

    #[async_trait]
    impl BallotStore for DownStore {
        async fn record_vote(&self, _: Uuid, _: Uuid) -> Result<VoteOutcome, StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
    }

    #[async_trait]
    impl ElectionStore for DownStore {
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("down".into()))
        }
        fn backend(&self) -> &'static str {
            "down"
        }
    }

    async fn ready(state: AppState) -> (StatusCode, HealthResponse) {
        let app = health_router().with_state(Arc::new(state));
        let response = app
            .oneshot(Request::builder().uri("/health/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_check_returns_ok() {
        let app = health_router().with_state(Arc::new(create_test_state()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ready_with_memory_store() {
        let (status, health) = ready(create_test_state()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(health.status, "healthy");
        assert_eq!(health.components.store.message.as_deref(), Some("memory"));
    }

    #[tokio::test]
    async fn test_ready_reports_unavailable_store() {
        let state = AppState::new(
            Arc::new(DownStore),
            SessionIssuer::new(
                &SecretString::from("health-test-secret-0123456789abcdef".to_string()),
                chrono::Duration::hours(1),
            ),
            Duration::from_secs(1),
        );
        let (status, health) = ready(state).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(health.status, "unhealthy");
        assert_eq!(health.components.store.status, "down");
    }
}
