//! Decryption Authorization Endpoint
//!
//! 서명된 복호화 요청을 받아 권한을 검증하고 평문 결과를 돌려준다.
//! 검증 실패는 형식 오류든 권한 오류든 구분 없이 401이다.

use axum::{extract::State, Json};

use crate::services::{SignedDecryptRequest, UserDecryptResponse};
use crate::{error::ApiError, AppState};

/// POST /v1/user-decrypt
///
/// # Security Note
///
/// - 요청 서명은 (handle, contract, user)를 모두 묶는다
/// - 복구된 서명자 == user 인 경우에만 엔진에 복호화를 위임
/// - 읽기 전용이므로 재시도에 안전 (멱등)
pub async fn user_decrypt(
    State(state): State<AppState>,
    Json(req): Json<SignedDecryptRequest>,
) -> Result<Json<UserDecryptResponse>, ApiError> {
    let result = state.gateway.verify_and_decrypt(&req)?;

    Ok(Json(UserDecryptResponse {
        request_id: req.request_id,
        result,
    }))
}
