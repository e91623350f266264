//! Health Check Endpoint
//!
//! "깊은 헬스체크" 패턴: 프로세스 생존 여부만이 아니라 암호화 엔진이
//! 실제로 요청을 받을 수 있는 상태인지 함께 보고한다.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::services::EngineStatus;
use crate::AppState;

/// Health check 응답
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub engine: EngineHealth,
    pub chain_id: u64,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct EngineHealth {
    pub status: EngineStatus,
}

/// GET /health
///
/// 서버 및 엔진 상태 확인
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let engine_status = state.encryption.status().await;

    Json(HealthResponse {
        status: if engine_status == EngineStatus::Ready {
            "healthy"
        } else {
            "degraded"
        }
        .to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: EngineHealth {
            status: engine_status,
        },
        chain_id: state.config.chain_id,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
