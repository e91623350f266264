//! Confidential Age Verification API Library
//!
//! # Overview
//!
//! 이 라이브러리는 기밀 연령 검증 프로토콜의 서비스 레이어를 제공합니다.
//! 출생연도는 클라이언트에서 암호화되고, 레코드 스토어가 동형 비교를
//! 수행하며, 결과는 제출자 본인만 복호화할 수 있습니다.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                         API                              │
//! │                                                          │
//! │  ┌─────────┐  ┌──────────┐  ┌──────────┐  ┌─────────┐   │
//! │  │ Routes  │  │ Services │  │ Protocol │  │ Config  │   │
//! │  └────┬────┘  └────┬─────┘  └────┬─────┘  └────┬────┘   │
//! │       │            │             │             │        │
//! │       └────────────┴─────────────┴─────────────┘        │
//! │                         │                                │
//! └─────────────────────────┼────────────────────────────────┘
//!                           │
//!                           ▼
//!                  ┌────────────────┐
//!                  │  FHE Engine    │
//!                  └────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: 환경 설정 관리
//! - `error`: 에러 타입 및 HTTP 매핑
//! - `routes`: HTTP 엔드포인트 핸들러 (컨트랙트 표면, 복호화 게이트웨이, relayer 프록시)
//! - `services`: 비즈니스 로직 (암호화 어댑터, 복호화 권한, 검증 플로우)

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod routes;
pub mod services;

// Re-exports for convenience
pub use config::Config;
pub use error::ApiError;
pub use services::{
    DecryptionGateway, EncryptionService, RelayerDecryptionClient, VerificationFlow,
};

use fhe_age_protocol::{AgeVerificationStore, MockFheEngine};

/// 배포 엔진 타입
///
/// 프로덕션에서는 실제 FHE 코프로세서 바인딩으로 교체되는 자리.
pub type FheEngine = MockFheEngine;

/// 애플리케이션 전역 상태
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AgeVerificationStore<FheEngine>>,
    pub encryption: Arc<EncryptionService>,
    pub gateway: Arc<DecryptionGateway>,
    pub config: Arc<Config>,
    /// relayer 프록시용 공용 HTTP 클라이언트
    pub http: reqwest::Client,
}
