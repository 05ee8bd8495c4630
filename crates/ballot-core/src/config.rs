//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 기본값 → TOML 파일(선택) → `BALLOT__` 접두사 환경 변수 순으로 덮어씁니다.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::logging::{LogConfig, LogFormat};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    #[serde(default)]
    pub server: ServerConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 인증 설정
    #[serde(default)]
    pub auth: AuthConfig,
    /// 저장소 작업 설정
    #[serde(default)]
    pub store: StoreConfig,
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// CORS 설정
    #[serde(default)]
    pub cors: CorsConfig,
    /// 인증 엔드포인트 요청 제한
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 요청 전체 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// `host:port` 주소 문자열.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 데이터베이스 설정.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL. 없으면 인메모리 저장소를 사용합니다.
    #[serde(default)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 획득 타임아웃 (초)
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // URL에 비밀번호가 포함될 수 있음
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

/// 인증 설정.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT 서명 비밀 키
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// 토큰 유효 시간 (시간)
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 24,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

/// 저장소 작업 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// 개별 저장소 호출 타임아웃 (밀리초)
    pub operation_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            operation_timeout_ms: 5_000,
        }
    }
}

impl StoreConfig {
    /// 타임아웃을 `Duration`으로 반환.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨 필터
    pub level: String,
    /// 출력 형식 ("pretty" | "json" | "compact")
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "ballot_api=info,ballot_core=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl LoggingConfig {
    /// 로깅 초기화용 설정으로 변환. 알 수 없는 형식은 pretty로 대체합니다.
    pub fn to_log_config(&self) -> LogConfig {
        let format = self.format.parse().unwrap_or(LogFormat::Pretty);
        LogConfig::new(self.level.clone()).with_format(format)
    }
}

/// CORS 설정.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorsConfig {
    /// 허용 origin 목록. 비어 있으면 모든 origin 허용 (개발 모드)
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// 요청 제한 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    /// 활성화 여부
    pub enabled: bool,
    /// `/register`, `/login`에 대한 IP당 분당 최대 요청 수
    pub auth_requests_per_minute: u32,
    /// X-Forwarded-For / X-Real-IP로 클라이언트 IP를 결정할지 여부.
    /// 헤더를 덮어쓰는 리버스 프록시 뒤에서만 켜야 합니다.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            auth_requests_per_minute: 30,
            trust_proxy_headers: false,
        }
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 4000)?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.acquire_timeout_secs", 5)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("store.operation_timeout_ms", 5_000)?
            .set_default("logging.level", LoggingConfig::default().level)?
            .set_default("logging.format", "pretty")?
            .set_default("rate_limit.enabled", true)?
            .set_default("rate_limit.auth_requests_per_minute", 30)?
            .set_default("rate_limit.trust_proxy_headers", false)?;

        // 파일에서 로드
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        // 환경 변수로 오버라이드
        let builder = builder.add_source(
            config::Environment::with_prefix("BALLOT")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("cors.allowed_origins")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// `BALLOT_CONFIG` 경로 또는 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        let path = std::env::var("BALLOT_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load(Some(Path::new(&path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.auth.token_ttl_hours, 24);
        assert_eq!(config.store.operation_timeout(), Duration::from_secs(5));
        assert!(config.rate_limit.enabled);
        assert!(!config.rate_limit.trust_proxy_headers);
    }

    #[test]
    fn test_missing_file_is_optional() {
        let config = AppConfig::load(Some(Path::new("does/not/exist.toml"))).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let auth = AuthConfig {
            jwt_secret: Some("super-secret".to_string()),
            token_ttl_hours: 24,
        };
        let database = DatabaseConfig {
            url: Some("postgres://user:pw@localhost/db".to_string()),
            ..Default::default()
        };

        assert!(!format!("{:?}", auth).contains("super-secret"));
        assert!(!format!("{:?}", database).contains("pw@"));
    }

    #[test]
    fn test_logging_config_falls_back_to_pretty() {
        let logging = LoggingConfig {
            level: "debug".to_string(),
            format: "fancy".to_string(),
        };
        assert_eq!(logging.to_log_config().format, LogFormat::Pretty);
    }
}
