//! Confidential Age Verification Protocol Core
//!
//! Privacy-preserving age verification over an FHE coprocessor:
//! the birth year is encrypted client-side, compared against a fixed
//! threshold homomorphically, and only the submitting identity may ever
//! decrypt the boolean outcome.
//!
//! # Modules
//! - `engine`: Comparison Engine capability (encrypt / compare / grant / decrypt)
//! - `store`: 사용자별 제출 기록을 보관하는 Confidential Record Store
//! - `session`: 클라이언트 검증 플로우 상태 머신
//! - `threshold`: 연령 임계값 상수 및 계산
//! - `error`: 프로토콜 에러 분류
//!
//! # Example
//! ```ignore
//! use fhe_age_protocol::{
//!     AgeVerificationStore, ComparisonEngine, EthAddress, MockFheEngine, ThresholdConfig,
//! };
//! use std::sync::Arc;
//!
//! let engine = Arc::new(MockFheEngine::new());
//! let store_addr = EthAddress::new("0x053ed58bd6c58cc53dc51a884cfe7477d070d922").unwrap();
//! let store = AgeVerificationStore::new(store_addr.clone(), ThresholdConfig::default(), engine.clone());
//!
//! let user = EthAddress::new("0x1234567890123456789012345678901234567890").unwrap();
//! let input = engine.encrypt(&store_addr, &user, 1990).unwrap();
//! let receipt = store.submit(&user, &input).unwrap();
//!
//! let handle = store.result_handle_of(&user).unwrap();
//! let is_adult = engine.user_decrypt(&handle, &user).unwrap();
//! assert!(is_adult);
//! ```

pub mod engine;
pub mod error;
pub mod session;
pub mod store;
pub mod threshold;
pub mod types;

// Engine exports
pub use engine::{ComparisonEngine, MockFheEngine};

// Record store exports
pub use store::{AgeVerificationStore, StoreEvent, SubmissionRecord, SubmitReceipt};

// Session FSM exports
pub use session::{
    SessionInput, TransitionError, VerificationSession, VerificationStep, DEFAULT_BIRTH_YEAR,
};

// Threshold exports
pub use threshold::{ThresholdConfig, BASE_YEAR, MINIMUM_AGE};

// Error handling
pub use error::{ProtocolError, ProtocolResult};

// Common types
pub use types::{EncryptedInput, EthAddress, ResultHandle};
