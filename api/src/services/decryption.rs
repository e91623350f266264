//! Decryption Service Client
//!
//! 검증 플로우가 의존하는 복호화 권한 서비스의 클라이언트 쪽 경계.
//!
//! # Implementation Options
//!
//! 1. `DecryptionGateway` (in-process): 내장 게이트웨이 직접 호출,
//!    개발/테스트 구성
//! 2. `RelayerDecryptionClient` (HTTP): 외부 relayer에 서명된 요청을
//!    전달, 120초 제한 시간
//!
//! 제한 시간 초과는 보고 대상 실패이며 자동 재시도하지 않는다.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use fhe_age_protocol::{EthAddress, ProtocolError, ResultHandle};

use crate::services::gateway::{decrypt_request_message, DecryptionGateway, SignedDecryptRequest};

/// 복호화 경계 에러
#[derive(Debug, Error)]
pub enum DecryptError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// 전송 실패 등 제한 시간 외의 서비스 오류
    #[error("Decryption service error: {0}")]
    Service(String),
}

/// 복호화 서비스 응답
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDecryptResponse {
    pub request_id: Uuid,
    pub result: bool,
}

/// 복호화 권한 서비스 인터페이스
///
/// 멱등해야 한다: 같은 (handle, signer)로 두 번 호출해도 같은 평문을
/// 반환하고 추가 상태 변화가 없어야 한다.
#[async_trait]
pub trait DecryptionAuthority: Send + Sync {
    async fn user_decrypt(&self, request: &SignedDecryptRequest) -> Result<bool, DecryptError>;
}

/// 복호화 요청에 서명할 수 있는 주체
#[async_trait]
pub trait DecryptSigner: Send + Sync {
    fn identity(&self) -> EthAddress;
    async fn sign(&self, message: &str) -> anyhow::Result<String>;
}

#[async_trait]
impl DecryptSigner for ethers::signers::LocalWallet {
    fn identity(&self) -> EthAddress {
        EthAddress::from_bytes(ethers::signers::Signer::address(self).0)
    }

    async fn sign(&self, message: &str) -> anyhow::Result<String> {
        let signature = ethers::signers::Signer::sign_message(self, message).await?;
        Ok(format!("0x{}", hex::encode(signature.to_vec())))
    }
}

/// 서명된 복호화 요청 생성
pub async fn build_decrypt_request(
    signer: &dyn DecryptSigner,
    handle: &ResultHandle,
    contract: &EthAddress,
) -> anyhow::Result<SignedDecryptRequest> {
    let user = signer.identity();
    let message = decrypt_request_message(handle, contract, &user);
    let signature = signer.sign(&message).await?;

    Ok(SignedDecryptRequest {
        request_id: Uuid::new_v4(),
        handle: handle.to_string(),
        contract: contract.to_string(),
        user: user.to_string(),
        signature,
    })
}

/// 외부 복호화 서비스 HTTP 클라이언트
pub struct RelayerDecryptionClient {
    base_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl RelayerDecryptionClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

#[async_trait]
impl DecryptionAuthority for RelayerDecryptionClient {
    async fn user_decrypt(&self, request: &SignedDecryptRequest) -> Result<bool, DecryptError> {
        let url = format!("{}/v1/user-decrypt", self.base_url);

        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DecryptError::Protocol(ProtocolError::NetworkTimeout(self.timeout.as_secs()))
                } else {
                    DecryptError::Service(e.to_string())
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DecryptError::Protocol(ProtocolError::Unauthorized));
        }
        if !status.is_success() {
            // 업스트림 에러 페이로드를 그대로 전달
            let body = response.text().await.unwrap_or_default();
            return Err(DecryptError::Service(format!("{}: {}", status, body)));
        }

        let body: UserDecryptResponse = response
            .json()
            .await
            .map_err(|e| DecryptError::Service(e.to_string()))?;
        Ok(body.result)
    }
}

/// In-process 게이트웨이를 복호화 서비스로 사용
#[async_trait]
impl DecryptionAuthority for DecryptionGateway {
    async fn user_decrypt(&self, request: &SignedDecryptRequest) -> Result<bool, DecryptError> {
        Ok(self.verify_and_decrypt(request)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::LocalWallet;

    #[tokio::test]
    async fn test_build_decrypt_request_binds_signer_identity() {
        let wallet = LocalWallet::new(&mut rand::thread_rng());
        let handle = ResultHandle::from_bytes([3u8; 32]);
        let contract = EthAddress::from_bytes([0xaa; 20]);

        let request = build_decrypt_request(&wallet, &handle, &contract)
            .await
            .unwrap();

        assert_eq!(request.user, wallet.identity().to_string());
        assert_eq!(request.handle, handle.to_string());
        assert_eq!(request.contract, contract.to_string());
        assert!(request.signature.starts_with("0x"));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_service_error() {
        // 닫힌 포트: 전송 실패는 timeout이 아니라 Service 에러
        let client = RelayerDecryptionClient::new("http://127.0.0.1:1", 120);
        let wallet = LocalWallet::new(&mut rand::thread_rng());
        let handle = ResultHandle::from_bytes([3u8; 32]);
        let contract = EthAddress::from_bytes([0xaa; 20]);
        let request = build_decrypt_request(&wallet, &handle, &contract)
            .await
            .unwrap();

        let err = client.user_decrypt(&request).await.unwrap_err();
        assert!(matches!(err, DecryptError::Service(_)));
    }
}
