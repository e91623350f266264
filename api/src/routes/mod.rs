//! API Routes Module
//!
//! 모든 HTTP 엔드포인트 정의
//!
//! # Routes
//! - `/health` - 헬스 체크 (엔진 준비 상태 포함)
//! - `/verify/*` - 레코드 스토어 컨트랙트 표면
//! - `/v1/user-decrypt` - 복호화 권한 서비스
//! - `/relayer/*path` - relayer pass-through 프록시

pub mod decrypt;
pub mod health;
pub mod relayer;
pub mod verification;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

/// 라우터 생성
///
/// # Route Structure
///
/// ```text
/// GET  /health                    - 서버/엔진 상태 확인
///
/// POST /verify/submit             - 암호화된 출생연도 제출
/// GET  /verify/status/:address    - 제출 여부 + 횟수 (누구나 조회 가능)
/// GET  /verify/handle/:address    - 최신 결과 핸들 (미제출 시 404)
/// GET  /verify/threshold          - 임계 연도 상수
///
/// POST /v1/user-decrypt           - 서명 검증 후 결과 복호화
///
/// GET  /relayer/*path             - 업스트림으로 그대로 전달
/// POST /relayer/*path             - 업스트림으로 그대로 전달 (120초 제한)
/// ```
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Contract surface
        .route("/verify/submit", post(verification::submit_birth_year))
        .route("/verify/status/:address", get(verification::get_status))
        .route(
            "/verify/handle/:address",
            get(verification::get_result_handle),
        )
        .route("/verify/threshold", get(verification::get_threshold))
        // Decryption authorization service
        .route("/v1/user-decrypt", post(decrypt::user_decrypt))
        // Relayer proxy
        .route(
            "/relayer/*path",
            get(relayer::proxy_get).post(relayer::proxy_post),
        )
        // 상태 주입
        .with_state(state)
}
