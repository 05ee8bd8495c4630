//! 전체 HTTP 애플리케이션 조립.
//!
//! API 라우터에 `/metrics`, OpenAPI 문서, 공통 미들웨어(메트릭, 트레이싱,
//! 전역 타임아웃, CORS)를 붙여 서비스 가능한 [`Router`]를 만듭니다.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    middleware,
    routing::get,
    Router,
};
use ballot_core::CorsConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::middleware::{metrics_layer, RateLimitState};
use crate::openapi::openapi_router;
use crate::routes::create_api_router;
use crate::state::AppState;

/// 라우터 조립 옵션.
#[derive(Clone, Default)]
pub struct RouterOptions {
    /// 설치된 Prometheus 레코더. 없으면 `/metrics`를 노출하지 않습니다.
    pub metrics: Option<PrometheusHandle>,
    /// 인증 엔드포인트 rate limit
    pub rate_limit: Option<RateLimitState>,
    /// 요청 전체 타임아웃. 초과 시 408.
    pub request_timeout: Duration,
    pub cors: CorsConfig,
}

/// CORS 레이어.
///
/// 허용 origin 목록이 비어 있거나 유효한 항목이 없으면 모든 origin을 허용합니다 (개발 모드).
/// 자격 증명은 origin 목록이 지정된 경우에만 허용합니다.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .allowed_origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        // preflight 캐시
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        if !config.allowed_origins.is_empty() {
            warn!("cors.allowed_origins에 유효한 origin이 없어 모든 origin을 허용합니다");
        } else {
            warn!("CORS origin 미설정, 모든 origin 허용 (development mode)");
        }
        layer.allow_origin(AllowOrigin::any())
    } else {
        info!(count = origins.len(), "CORS 허용 origin 설정");
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

/// `/metrics` 핸들러.
async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}

/// 전체 라우터 생성.
pub fn create_router(state: Arc<AppState>, options: RouterOptions) -> Router {
    let mut app = Router::new()
        .merge(create_api_router(options.rate_limit).with_state(state))
        .merge(openapi_router());

    if let Some(handle) = options.metrics {
        app = app.merge(
            Router::new()
                .route("/metrics", get(metrics_handler))
                .with_state(handle),
        );
    }

    app.layer(middleware::from_fn(metrics_layer))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            options.request_timeout,
        ))
        .layer(cors_layer(&options.cors))
}
