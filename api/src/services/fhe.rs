//! Encryption Adapter
//!
//! 클라이언트 측 암호화 capability. 실제 FHE SDK는 공개키 자료를
//! 비동기로 내려받아야 하므로, 초기화가 끝나기 전의 암호화 요청은
//! `EncryptionUnavailable`로 실패한다.

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tokio::sync::RwLock;

use fhe_age_protocol::{ComparisonEngine, EncryptedInput, EthAddress, ProtocolError, ProtocolResult};

use crate::FheEngine;

/// 암호화 엔진 초기화 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    Idle,
    Initializing,
    Ready,
    Error,
}

/// 암호화 어댑터
///
/// # Design Decision
///
/// 엔진 초기화 상태를 플로우 에러와 분리해서 관리:
/// - 초기화 전 요청은 세션을 깨뜨리지 않고 `EncryptionUnavailable` 반환
/// - `/health`가 상태를 그대로 노출 (deep health check)
pub struct EncryptionService {
    engine: Arc<FheEngine>,
    status: RwLock<EngineStatus>,
}

impl EncryptionService {
    pub fn new(engine: Arc<FheEngine>) -> Self {
        Self {
            engine,
            status: RwLock::new(EngineStatus::Idle),
        }
    }

    /// 엔진 초기화
    ///
    /// 실제 배포에서는 이 지점에서 코프로세서 공개키 자료를 받아온다.
    pub async fn init(&self) -> Result<()> {
        {
            let mut status = self.status.write().await;
            *status = EngineStatus::Initializing;
        }

        // Mock 엔진은 준비 과정이 없음
        let mut status = self.status.write().await;
        *status = EngineStatus::Ready;

        tracing::info!("encryption engine initialized");
        Ok(())
    }

    pub async fn status(&self) -> EngineStatus {
        *self.status.read().await
    }

    /// 출생연도 암호화
    ///
    /// 암호문과 증명은 (store, user)에 바인딩되어 다른 스토어나 타인
    /// 명의로 재사용할 수 없다. 평문 연도는 이 호출 밖으로 나가지
    /// 않는다.
    pub async fn encrypt_birth_year(
        &self,
        store: &EthAddress,
        user: &EthAddress,
        year: u16,
    ) -> ProtocolResult<EncryptedInput> {
        if *self.status.read().await != EngineStatus::Ready {
            return Err(ProtocolError::EncryptionUnavailable);
        }
        self.engine.encrypt(store, user, year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> EthAddress {
        EthAddress::from_bytes([n; 20])
    }

    #[tokio::test]
    async fn test_encrypt_before_init_unavailable() {
        let service = EncryptionService::new(Arc::new(FheEngine::new()));
        assert_eq!(service.status().await, EngineStatus::Idle);

        let err = service
            .encrypt_birth_year(&addr(1), &addr(2), 1990)
            .await
            .unwrap_err();
        assert_eq!(err, ProtocolError::EncryptionUnavailable);
    }

    #[tokio::test]
    async fn test_encrypt_after_init() {
        let service = EncryptionService::new(Arc::new(FheEngine::new()));
        service.init().await.unwrap();
        assert_eq!(service.status().await, EngineStatus::Ready);

        let input = service
            .encrypt_birth_year(&addr(1), &addr(2), 1990)
            .await
            .unwrap();
        assert!(input.ciphertext.starts_with("0x"));
        assert!(input.proof.starts_with("0x"));
    }
}
