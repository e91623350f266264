//! Protocol Error Types
//!
//! 프로토콜 레이어 공통 에러 분류.
//!
//! # Design Decision
//!
//! 암호/원장 레벨 실패(RejectedSubmission, NoSubmission, Unauthorized)는
//! 해당 시도에 대해 종결이며 그대로 노출됨. 어댑터 레벨 실패
//! (EncryptionUnavailable, NetworkTimeout)는 세션을 안정 상태로 되돌림.
//! 어떤 실패도 조용히 삼키지 않는다.

use thiserror::Error;

/// Result alias for protocol operations
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// 프로토콜 에러
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// 입력 증명 검증 실패. 제출 전체가 원자적으로 거부됨 (상태 변화 없음).
    #[error("Submission rejected: {0}")]
    RejectedSubmission(String),

    /// 제출 기록이 없는 주소에 대한 결과 조회
    #[error("No submission exists for this address")]
    NoSubmission,

    /// 복호화 권한 없음 (제출자 본인만 결과를 볼 수 있음)
    #[error("Not authorized to decrypt this handle")]
    Unauthorized,

    /// 클라이언트 암호화 엔진이 아직 초기화되지 않음
    #[error("Encryption engine is not ready")]
    EncryptionUnavailable,

    /// 복호화 서비스가 제한 시간 내에 응답하지 않음 (자동 재시도 안 함)
    #[error("Decryption service timed out after {0} seconds")]
    NetworkTimeout(u64),

    /// 사용자가 필수 승인 단계를 거부함
    #[error("User declined the request: {0}")]
    UserDeclined(String),
}
