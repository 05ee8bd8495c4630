//! 투표 API 서버.
//!
//! 설정을 읽어 저장소(PostgreSQL 또는 인메모리)와 세션 발급기를 준비하고
//! Axum REST API 서버를 시작합니다.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use ballot_api::app::{create_router, RouterOptions};
use ballot_api::auth::SessionIssuer;
use ballot_api::metrics::setup_metrics_recorder;
use ballot_api::middleware::{spawn_cleanup, RateLimitConfig, RateLimitState};
use ballot_api::repository::PgElectionStore;
use ballot_api::state::AppState;
use ballot_core::{init_logging, AppConfig, ElectionStore, MemoryStore};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// 개발용 서명 키. 운영에서는 `BALLOT__AUTH__JWT_SECRET`을 설정해야 합니다.
const DEV_JWT_SECRET: &str = "dev-secret-key-change-in-production";

/// 버킷 정리 주기.
const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// OpenAPI 스펙 내보내기 처리.
///
/// `--export-openapi` 플래그 또는 `EXPORT_OPENAPI` 환경변수가 설정되면
/// 스펙을 stdout으로 출력하고 `true`를 반환합니다.
fn handle_export_openapi() -> anyhow::Result<bool> {
    use ballot_api::openapi::ApiDoc;
    use utoipa::OpenApi as _;

    let export_flag = std::env::args().any(|arg| arg == "--export-openapi");
    let export_env = std::env::var("EXPORT_OPENAPI")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    if !(export_flag || export_env) {
        return Ok(false);
    }

    println!("{}", serde_json::to_string_pretty(&ApiDoc::openapi())?);
    Ok(true)
}

/// 설정에 따라 저장소 선택.
async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn ElectionStore>> {
    if config.database.url.is_none() {
        warn!("database.url 미설정, 인메모리 저장소 사용 (재시작 시 데이터 소실)");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = PgElectionStore::connect(&config.database)
        .await
        .context("데이터베이스 연결 실패")?;
    store.migrate().await.context("마이그레이션 실패")?;
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    if handle_export_openapi()? {
        return Ok(());
    }

    let config = AppConfig::load_default().context("설정 로드 실패")?;

    init_logging(config.logging.to_log_config())
        .map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting Ballot API server...");
    info!(?config, "설정 로드 완료");

    let metrics_handle = match setup_metrics_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            error!(error = %e, "Prometheus 레코더 설치 실패, /metrics 비활성화");
            None
        }
    };

    let store = open_store(&config).await?;

    let secret = match config.auth.jwt_secret.clone() {
        Some(secret) if !secret.is_empty() => secret,
        _ => {
            warn!("jwt_secret 미설정, 개발용 기본값 사용 (INSECURE for development only)");
            DEV_JWT_SECRET.to_string()
        }
    };
    let sessions = SessionIssuer::new(
        &SecretString::from(secret),
        chrono::Duration::hours(config.auth.token_ttl_hours),
    );

    let state = Arc::new(AppState::new(
        store,
        sessions,
        config.store.operation_timeout(),
    ));
    info!(
        version = %state.version,
        backend = state.store.backend(),
        "Application state initialized"
    );

    let shutdown_token = CancellationToken::new();

    let rate_limit = if config.rate_limit.enabled {
        let limiter = RateLimitState::new(RateLimitConfig::from(&config.rate_limit));
        spawn_cleanup(
            limiter.clone(),
            RATE_LIMIT_CLEANUP_INTERVAL,
            shutdown_token.clone(),
        );
        info!(
            requests_per_minute = config.rate_limit.auth_requests_per_minute,
            trust_proxy_headers = config.rate_limit.trust_proxy_headers,
            "인증 엔드포인트 rate limit 활성화"
        );
        Some(limiter)
    } else {
        warn!("rate limit 비활성화");
        None
    };

    let app = create_router(
        state,
        RouterOptions {
            metrics: metrics_handle,
            rate_limit,
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
            cors: config.cors.clone(),
        },
    );

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("{} 바인딩 실패", addr))?;

    info!(%addr, "API server listening");
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_token.clone()))
    .await?;

    shutdown_token.cancel();
    info!("Server stopped gracefully");

    Ok(())
}

/// Graceful shutdown 시그널 대기.
///
/// Ctrl+C 또는 SIGTERM을 받으면 종료 토큰을 취소해 백그라운드 작업에 전파합니다.
async fn shutdown_signal(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C 핸들러 설치 실패");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "SIGTERM 핸들러 설치 실패");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => warn!("Received SIGTERM, initiating graceful shutdown..."),
    }

    shutdown_token.cancel();
}
