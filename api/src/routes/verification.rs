//! Verification Endpoints
//!
//! 레코드 스토어의 컨트랙트 표면을 REST로 노출한다. 제출 *여부*와
//! 횟수는 기밀이 아니므로 조회 엔드포인트는 호출자 제한이 없다.
//! 기밀인 출생연도는 암호문으로만 이 경계를 넘는다.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use fhe_age_protocol::{EncryptedInput, EthAddress};

use crate::{error::ApiError, AppState};

// ============ Request/Response Types ============

/// 출생연도 제출 요청
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    /// 제출자 주소
    pub address: String,
    /// 암호화된 출생연도 (hex)
    pub ciphertext: String,
    /// 입력 유효성 증명 (hex)
    pub proof: String,
}

/// 제출 응답
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    /// 원장 트랜잭션 참조
    pub tx_ref: String,
    /// 이번 제출 이후 누적 횟수
    pub submission_number: u64,
}

/// 제출 상태 응답
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub address: String,
    pub has_submitted: bool,
    pub submission_count: u64,
}

/// 결과 핸들 응답
#[derive(Debug, Serialize)]
pub struct HandleResponse {
    /// 핸들 자체는 비밀이 아님. 복호화에는 별도 권한이 필요.
    pub handle: String,
}

/// 임계값 응답
#[derive(Debug, Serialize)]
pub struct ThresholdResponse {
    pub minimum_age: u16,
    pub base_year: u16,
    pub threshold_year: u16,
}

// ============ Handlers ============

/// POST /verify/submit
///
/// # Flow
///
/// 1. 입력 파싱 (주소 검증)
/// 2. 스토어가 증명 검증 + 동형 비교 + 배타적 권한 부여를 원자적으로 수행
/// 3. 트랜잭션 참조와 새 제출 횟수 반환
///
/// 증명이 유효하지 않으면 422로 거부되고 어떤 상태도 변하지 않는다.
pub async fn submit_birth_year(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let user = EthAddress::new(&req.address).map_err(ApiError::ValidationError)?;
    let input = EncryptedInput {
        ciphertext: req.ciphertext,
        proof: req.proof,
    };

    let receipt = state.store.submit(&user, &input)?;

    Ok(Json(SubmitResponse {
        tx_ref: receipt.tx_ref,
        submission_number: receipt.submission_number,
    }))
}

/// GET /verify/status/:address
///
/// 누구나 어떤 주소에 대해서도 호출 가능하며 실패하지 않는다.
pub async fn get_status(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user = EthAddress::new(&address).map_err(ApiError::ValidationError)?;

    Ok(Json(StatusResponse {
        address: user.to_string(),
        has_submitted: state.store.has_submitted(&user),
        submission_count: state.store.submission_count_of(&user),
    }))
}

/// GET /verify/handle/:address
///
/// 미제출 주소는 404 `NO_SUBMISSION`.
pub async fn get_result_handle(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<HandleResponse>, ApiError> {
    let user = EthAddress::new(&address).map_err(ApiError::ValidationError)?;
    let handle = state.store.result_handle_of(&user)?;

    Ok(Json(HandleResponse {
        handle: handle.to_string(),
    }))
}

/// GET /verify/threshold
///
/// 순수 상수 조회. 저장된 상태를 전혀 읽지 않는다.
pub async fn get_threshold(State(state): State<AppState>) -> Json<ThresholdResponse> {
    let config = *state.store.config();

    Json(ThresholdResponse {
        minimum_age: config.minimum_age,
        base_year: config.base_year,
        threshold_year: config.threshold_year(),
    })
}
