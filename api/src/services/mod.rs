//! Services Module
//!
//! 비즈니스 로직을 담당하는 서비스 레이어
//!
//! # Services
//! - `EncryptionService`: 클라이언트 측 암호화 어댑터 (비동기 초기화)
//! - `DecryptionGateway`: 서명 검증 + 복호화 권한 확인
//! - `RelayerDecryptionClient`: 복호화 서비스 HTTP 클라이언트 (120초 제한)
//! - `VerificationFlow`: 세션 FSM을 구동하는 오케스트레이터

mod decryption;
mod fhe;
mod flow;
mod gateway;

pub use decryption::{
    build_decrypt_request, DecryptError, DecryptSigner, DecryptionAuthority,
    RelayerDecryptionClient, UserDecryptResponse,
};
pub use fhe::{EncryptionService, EngineStatus};
pub use flow::{FlowError, VerificationFlow};
pub use gateway::{decrypt_request_message, DecryptionGateway, SignedDecryptRequest};
