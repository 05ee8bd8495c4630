//! HTTP 요청 metrics middleware.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

use crate::metrics::{
    normalize_path, record_http_duration, record_http_request, record_http_response,
};

/// 요청 수, 응답 상태, 처리 시간을 기록합니다.
///
/// 경로의 후보자 ID는 `:id`로 정규화되어 라벨 수가 후보자 수에 비례해 늘지 않습니다.
pub async fn metrics_layer(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    record_http_request(&method, &path);

    let response = next.run(request).await;

    record_http_response(&method, &path, response.status().as_u16());
    record_http_duration(&method, &path, start.elapsed().as_secs_f64());

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
        middleware,
        routing::post,
        Router,
    };
    use tower::ServiceExt;

    async fn vote() -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    #[tokio::test]
    async fn test_metrics_layer_passes_response_through() {
        let app = Router::new()
            .route("/candidates/{id}/vote", post(vote))
            .layer(middleware::from_fn(metrics_layer));

        let request = Request::builder()
            .method(Method::POST)
            .uri("/candidates/123e4567-e89b-12d3-a456-426614174000/vote")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
