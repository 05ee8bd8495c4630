//! API 서버용 HTTP middleware.

mod metrics;
mod rate_limit;

pub use metrics::metrics_layer;
pub use rate_limit::{
    auth_rate_limit, spawn_cleanup, RateLimitConfig, RateLimitResult, RateLimitState, RateLimiter,
};
