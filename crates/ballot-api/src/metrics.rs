//! Prometheus 메트릭 설정 및 유틸리티.
//!
//! HTTP 요청 메트릭과 투표/인증 비즈니스 메트릭을 수집하고 `/metrics`로 노출합니다.
//! 레코더가 설치되지 않은 환경(테스트)에서는 모든 기록이 무시됩니다.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Prometheus 레코더를 설치하고 렌더링 핸들을 반환합니다.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0],
        )?
        .install_recorder()
}

// ============================================================================
// HTTP 메트릭
// ============================================================================

pub fn record_http_request(method: &str, path: &str) {
    counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string())
        .increment(1);
}

pub fn record_http_response(method: &str, path: &str, status: u16) {
    counter!(
        "http_responses_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_http_duration(method: &str, path: &str, duration_secs: f64) {
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_secs);
}

// ============================================================================
// 비즈니스 메트릭
// ============================================================================

/// 투표 시도 결과 ("recorded", "already_voted", "candidate_not_found", "error").
pub fn record_vote(outcome: &'static str) {
    counter!("ballot_votes_total", "outcome" => outcome).increment(1);
}

/// 로그인 시도 결과 ("success", "invalid_credentials", "error").
pub fn record_login(outcome: &'static str) {
    counter!("auth_logins_total", "outcome" => outcome).increment(1);
}

/// 가입 시도 결과 ("success", "duplicate_identity", "duplicate_admin", "invalid", "error").
pub fn record_registration(outcome: &'static str) {
    counter!("auth_registrations_total", "outcome" => outcome).increment(1);
}

// ============================================================================
// 경로 정규화
// ============================================================================

/// 경로의 UUID 세그먼트를 `:id`로 치환해 라벨 카디널리티를 제한합니다.
///
/// 예: `/candidates/123e4567-e89b-12d3-a456-426614174000/vote` → `/candidates/:id/vote`
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if uuid::Uuid::parse_str(segment).is_ok() {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
