//! Decryption Authorization Gateway
//!
//! "핸들에 권한이 부여되어 있다"를 "권한 있는 호출자에게 평문 전달"로
//! 바꾸는 경계. 요청은 (handle, contract, user)를 묶는 EIP-191 서명을
//! 포함해야 하며, 복구된 서명자가 곧 요청의 user여야 한다.
//!
//! 검증 불가능한 요청은 모두 `Unauthorized`다. 이 경계에서 형식 오류와
//! 권한 오류를 구분해 주면 공격자에게 탐색 단서를 주게 된다.

use std::str::FromStr;
use std::sync::Arc;

use ethers::types::Signature;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fhe_age_protocol::{
    ComparisonEngine, EthAddress, ProtocolError, ProtocolResult, ResultHandle,
};

use crate::FheEngine;

/// 서명 대상 정본 메시지
///
/// handle + contract + user를 모두 묶는다. 어느 하나라도 바꾸면 서명이
/// 무효가 되므로, 서명 재사용으로 다른 핸들을 열 수 없다.
pub fn decrypt_request_message(
    handle: &ResultHandle,
    contract: &EthAddress,
    user: &EthAddress,
) -> String {
    format!(
        "fhe-age-verification/user-decrypt\nhandle: {}\ncontract: {}\nuser: {}",
        handle, contract, user
    )
}

/// 서명된 복호화 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedDecryptRequest {
    pub request_id: Uuid,
    /// 결과 핸들 (hex)
    pub handle: String,
    /// 레코드 스토어 주소
    pub contract: String,
    /// 권한을 주장하는 주소
    pub user: String,
    /// EIP-191 서명 (hex)
    pub signature: String,
}

/// 복호화 권한 게이트웨이
pub struct DecryptionGateway {
    engine: Arc<FheEngine>,
}

impl DecryptionGateway {
    pub fn new(engine: Arc<FheEngine>) -> Self {
        Self { engine }
    }

    /// 서명을 검증하고 결과를 복호화
    ///
    /// 읽기 전용이며 멱등: 같은 요청을 두 번 보내도 같은 평문이
    /// 반환되고 추가 상태 변화가 없다.
    pub fn verify_and_decrypt(&self, request: &SignedDecryptRequest) -> ProtocolResult<bool> {
        let handle =
            ResultHandle::new(&request.handle).map_err(|_| ProtocolError::Unauthorized)?;
        let contract =
            EthAddress::new(&request.contract).map_err(|_| ProtocolError::Unauthorized)?;
        let user = EthAddress::new(&request.user).map_err(|_| ProtocolError::Unauthorized)?;

        let message = decrypt_request_message(&handle, &contract, &user);
        let signature = Signature::from_str(request.signature.trim_start_matches("0x"))
            .map_err(|_| ProtocolError::Unauthorized)?;
        let recovered = signature
            .recover(message.as_str())
            .map_err(|_| ProtocolError::Unauthorized)?;

        if EthAddress::from_bytes(recovered.0) != user {
            tracing::warn!(request_id = %request.request_id, "decrypt signature does not match claimed user");
            return Err(ProtocolError::Unauthorized);
        }

        self.engine.user_decrypt(&handle, &user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::{LocalWallet, Signer};
    use fhe_age_protocol::{AgeVerificationStore, ThresholdConfig};

    fn wallet_address(wallet: &LocalWallet) -> EthAddress {
        EthAddress::from_bytes(wallet.address().0)
    }

    async fn signed_request(
        wallet: &LocalWallet,
        handle: &ResultHandle,
        contract: &EthAddress,
        user: &EthAddress,
    ) -> SignedDecryptRequest {
        let message = decrypt_request_message(handle, contract, user);
        let signature = wallet.sign_message(message).await.unwrap();
        SignedDecryptRequest {
            request_id: Uuid::new_v4(),
            handle: handle.to_string(),
            contract: contract.to_string(),
            user: user.to_string(),
            signature: format!("0x{}", hex::encode(signature.to_vec())),
        }
    }

    fn submitted_handle(
        engine: &Arc<FheEngine>,
        store: &AgeVerificationStore<FheEngine>,
        user: &EthAddress,
        year: u16,
    ) -> ResultHandle {
        let input = engine.encrypt(store.address(), user, year).unwrap();
        store.submit(user, &input).unwrap();
        store.result_handle_of(user).unwrap()
    }

    #[tokio::test]
    async fn test_submitter_can_decrypt_own_result() {
        let engine = Arc::new(FheEngine::new());
        let store = AgeVerificationStore::new(
            EthAddress::from_bytes([0xaa; 20]),
            ThresholdConfig::default(),
            engine.clone(),
        );
        let gateway = DecryptionGateway::new(engine.clone());

        let wallet = LocalWallet::new(&mut rand::thread_rng());
        let user = wallet_address(&wallet);
        let handle = submitted_handle(&engine, &store, &user, 1990);

        let request = signed_request(&wallet, &handle, store.address(), &user).await;
        assert!(gateway.verify_and_decrypt(&request).unwrap());
    }

    #[tokio::test]
    async fn test_other_identity_always_unauthorized() {
        let engine = Arc::new(FheEngine::new());
        let store = AgeVerificationStore::new(
            EthAddress::from_bytes([0xaa; 20]),
            ThresholdConfig::default(),
            engine.clone(),
        );
        let gateway = DecryptionGateway::new(engine.clone());

        let alice = LocalWallet::new(&mut rand::thread_rng());
        let eve = LocalWallet::new(&mut rand::thread_rng());
        let alice_addr = wallet_address(&alice);
        let eve_addr = wallet_address(&eve);
        let handle = submitted_handle(&engine, &store, &alice_addr, 1990);

        // eve가 자기 서명으로 alice의 핸들을 요청
        let request = signed_request(&eve, &handle, store.address(), &eve_addr).await;
        assert_eq!(
            gateway.verify_and_decrypt(&request).unwrap_err(),
            ProtocolError::Unauthorized
        );

        // eve가 alice 명의를 주장해도 서명자 복구가 어긋남
        let forged = signed_request(&eve, &handle, store.address(), &alice_addr).await;
        assert_eq!(
            gateway.verify_and_decrypt(&forged).unwrap_err(),
            ProtocolError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_garbage_signature_unauthorized() {
        let engine = Arc::new(FheEngine::new());
        let store = AgeVerificationStore::new(
            EthAddress::from_bytes([0xaa; 20]),
            ThresholdConfig::default(),
            engine.clone(),
        );
        let gateway = DecryptionGateway::new(engine.clone());

        let wallet = LocalWallet::new(&mut rand::thread_rng());
        let user = wallet_address(&wallet);
        let handle = submitted_handle(&engine, &store, &user, 1990);

        let request = SignedDecryptRequest {
            request_id: Uuid::new_v4(),
            handle: handle.to_string(),
            contract: store.address().to_string(),
            user: user.to_string(),
            signature: "0xdeadbeef".to_string(),
        };
        assert_eq!(
            gateway.verify_and_decrypt(&request).unwrap_err(),
            ProtocolError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_decrypt_is_idempotent() {
        let engine = Arc::new(FheEngine::new());
        let store = AgeVerificationStore::new(
            EthAddress::from_bytes([0xaa; 20]),
            ThresholdConfig::default(),
            engine.clone(),
        );
        let gateway = DecryptionGateway::new(engine.clone());

        let wallet = LocalWallet::new(&mut rand::thread_rng());
        let user = wallet_address(&wallet);
        let handle = submitted_handle(&engine, &store, &user, 2008);

        let request = signed_request(&wallet, &handle, store.address(), &user).await;
        let first = gateway.verify_and_decrypt(&request).unwrap();
        let second = gateway.verify_and_decrypt(&request).unwrap();

        assert_eq!(first, second);
        assert!(!first);
        assert_eq!(store.submission_count_of(&user), 1);
    }
}
