//! 선거 투표 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (가입, 로그인, 후보자 명부, 투표, 집계)
//! - JWT 세션 토큰과 역할 기반 권한 확인
//! - PostgreSQL 저장소 (없으면 인메모리)
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`services`]: 가입/로그인, 투표 비즈니스 로직
//! - [`repository`]: PostgreSQL 저장소
//! - [`auth`]: JWT 인증 및 비밀번호 해싱
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`openapi`]: OpenAPI 문서
//! - [`app`]: 전체 라우터 조립

pub mod app;
pub mod auth;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod openapi;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use app::{cors_layer, create_router, RouterOptions};
pub use auth::{hash_password, verify_password, AuthContext, Claims, JwtAuth, JwtAuthError, SessionIssuer};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::{metrics_layer, RateLimitConfig, RateLimitState};
pub use repository::PgElectionStore;
pub use routes::*;
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
