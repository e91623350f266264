//! Relayer Pass-Through Proxy
//!
//! GET/POST를 설정된 업스트림으로 그대로 전달한다. 응답 본문과 상태
//! 코드는 변경 없이 되돌려주고, 제한 시간(기본 2분) 초과만 구분된
//! 504로 보고한다. 전달 과정에서 요청/응답 내용을 해석하거나 로그에
//! 남기지 않는다.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;

use crate::AppState;

/// GET /relayer/*path
pub async fn proxy_get(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    forward(&state, &path, None).await
}

/// POST /relayer/*path
pub async fn proxy_post(
    State(state): State<AppState>,
    Path(path): Path<String>,
    body: Bytes,
) -> Response {
    forward(&state, &path, Some(body)).await
}

async fn forward(state: &AppState, path: &str, body: Option<Bytes>) -> Response {
    let url = format!(
        "{}/{}",
        state.config.relayer_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let timeout = Duration::from_secs(state.config.relayer_timeout_secs);

    let request = match body {
        Some(bytes) => state
            .http
            .post(&url)
            .header("content-type", "application/json")
            .body(bytes.to_vec()),
        None => state.http.get(&url),
    };

    match request.timeout(timeout).send().await {
        Ok(response) => {
            // 상태 코드와 본문을 그대로 전달
            let status = StatusCode::from_u16(response.status().as_u16())
                .unwrap_or(StatusCode::BAD_GATEWAY);
            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("application/json")
                .to_string();
            let body = response.text().await.unwrap_or_default();

            (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) if e.is_timeout() => {
            tracing::warn!(path, "relayer request timed out");
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({ "error": "Relayer timeout (2 min)" })),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
