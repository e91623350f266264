//! Comparison Engine Capability
//!
//! 동형암호 코프로세서를 불투명한 capability로 추상화한다. 프로토콜
//! 로직은 정확히 네 가지 연산만 요구하며, 실제 암호 백엔드 없이 mock
//! 엔진으로 테스트 가능하다.
//!
//! # Operations
//!
//! ```text
//! encrypt        (store, user, year)            -> EncryptedInput
//! compare_le     (input, store, submitter, t)   -> ResultHandle    // 증명 검증 포함
//! grant_decrypt  (handle, user)                 -> ()              // 배타적 grant
//! user_decrypt   (handle, user)                 -> bool            // grant 필요
//! ```
//!
//! # Interview Q&A
//!
//! Q: 증명 검증이 왜 `compare_le`에 포함되는가?
//! A: 원장 위에서 입력 변환(검증)과 비교는 하나의 원자적 단계로 실행됨
//!    - 검증 실패 시 결과 핸들이 절대 만들어지지 않음
//!    - capability를 네 연산으로 고정하는 설계 제약 유지

use std::collections::HashMap;
use std::sync::RwLock;

use sha3::{Digest, Keccak256};

use crate::error::{ProtocolError, ProtocolResult};
use crate::types::{EncryptedInput, EthAddress, ResultHandle};

/// Keccak256 over concatenated parts
pub(crate) fn keccak256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// 동형 비교 엔진 capability
///
/// 실제 FHE 백엔드(코프로세서 + relayer SDK)를 대체 가능하도록 trait로
/// 분리. 프로토콜 코드는 이 네 연산 외의 어떤 암호 기능도 가정하지
/// 않는다.
pub trait ComparisonEngine: Send + Sync {
    /// 출생연도를 암호화하고 (store, user)에 바인딩된 유효성 증명을 생성
    fn encrypt(
        &self,
        store: &EthAddress,
        user: &EthAddress,
        year: u16,
    ) -> ProtocolResult<EncryptedInput>;

    /// 입력 증명을 검증한 뒤 암호화된 `year <= threshold`를 계산
    ///
    /// 검증 실패 시 `RejectedSubmission`을 반환하며 아무 상태도 남기지
    /// 않는다. 두 피연산자 모두 평문으로 드러나지 않는다.
    fn compare_le(
        &self,
        input: &EncryptedInput,
        store: &EthAddress,
        submitter: &EthAddress,
        threshold: u16,
    ) -> ProtocolResult<ResultHandle>;

    /// 핸들에 대한 복호화 권한을 특정 주소에 부여
    ///
    /// 핸들당 grantee는 정확히 하나. 재호출은 기존 grant를 대체한다.
    fn grant_decrypt(&self, handle: &ResultHandle, user: &EthAddress) -> ProtocolResult<()>;

    /// 권한이 부여된 주소로 결과를 복호화
    ///
    /// 읽기 전용이며 멱등: 같은 (handle, user)로 몇 번을 호출해도 같은
    /// 결과를 반환하고 추가 상태 변화가 없다.
    fn user_decrypt(&self, handle: &ResultHandle, user: &EthAddress) -> ProtocolResult<bool>;
}

/// 암호문 레코드 (엔진 내부 전용)
struct CipherRecord {
    year: u16,
    store: EthAddress,
    user: EthAddress,
}

#[derive(Default)]
struct MockState {
    /// ciphertext -> 평문 및 바인딩. 실제 엔진의 비밀키 영역에 해당.
    ciphertexts: HashMap<String, CipherRecord>,
    /// handle -> 비교 결과
    results: HashMap<ResultHandle, bool>,
    /// handle -> 유일한 grantee
    grants: HashMap<ResultHandle, EthAddress>,
}

/// Mock FHE Engine
///
/// 개발/테스트용 in-memory 구현. 암호문은 (store, user, year, nonce)에
/// 대한 Keccak256 커밋먼트이고, 증명은 (ciphertext, store, user) 바인딩
/// 해시다. 평문 출생연도는 엔진 내부 테이블 밖으로 절대 나가지 않는다.
///
/// NOTE: This is a development stand-in for the real coprocessor.
/// 실제 배포에서는 동일 trait을 구현하는 FHE 백엔드 바인딩으로 교체.
pub struct MockFheEngine {
    state: RwLock<MockState>,
}

impl MockFheEngine {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MockState::default()),
        }
    }

    fn input_proof(ciphertext: &str, store: &EthAddress, user: &EthAddress) -> String {
        let digest = keccak256(&[
            b"fhe-age-input-proof",
            ciphertext.as_bytes(),
            store.as_str().as_bytes(),
            user.as_str().as_bytes(),
        ]);
        format!("0x{}", hex::encode(digest))
    }
}

impl Default for MockFheEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ComparisonEngine for MockFheEngine {
    fn encrypt(
        &self,
        store: &EthAddress,
        user: &EthAddress,
        year: u16,
    ) -> ProtocolResult<EncryptedInput> {
        // nonce 덕분에 같은 연도를 다시 암호화해도 암호문이 달라짐
        let nonce: u64 = rand::random();
        let digest = keccak256(&[
            store.as_str().as_bytes(),
            user.as_str().as_bytes(),
            &year.to_be_bytes(),
            &nonce.to_be_bytes(),
        ]);
        let ciphertext = format!("0x{}", hex::encode(digest));
        let proof = Self::input_proof(&ciphertext, store, user);

        let mut state = self.state.write().unwrap();
        state.ciphertexts.insert(
            ciphertext.clone(),
            CipherRecord {
                year,
                store: store.clone(),
                user: user.clone(),
            },
        );

        Ok(EncryptedInput { ciphertext, proof })
    }

    fn compare_le(
        &self,
        input: &EncryptedInput,
        store: &EthAddress,
        submitter: &EthAddress,
        threshold: u16,
    ) -> ProtocolResult<ResultHandle> {
        let mut state = self.state.write().unwrap();

        let record = state.ciphertexts.get(&input.ciphertext).ok_or_else(|| {
            ProtocolError::RejectedSubmission("unknown ciphertext".to_string())
        })?;

        // 증명은 (ciphertext, store, submitter)를 묶는다: 다른 store로의
        // 재사용이나 타인 명의 제출은 여기서 걸러짐
        let expected = Self::input_proof(&input.ciphertext, store, submitter);
        if expected != input.proof {
            return Err(ProtocolError::RejectedSubmission(
                "input proof does not match ciphertext binding".to_string(),
            ));
        }
        if record.store != *store || record.user != *submitter {
            return Err(ProtocolError::RejectedSubmission(
                "ciphertext is bound to a different store or sender".to_string(),
            ));
        }

        let result = record.year <= threshold;
        let handle = ResultHandle::from_bytes(keccak256(&[
            b"fhe-age-result",
            input.ciphertext.as_bytes(),
            &threshold.to_be_bytes(),
        ]));
        state.results.insert(handle.clone(), result);

        Ok(handle)
    }

    fn grant_decrypt(&self, handle: &ResultHandle, user: &EthAddress) -> ProtocolResult<()> {
        let mut state = self.state.write().unwrap();
        if !state.results.contains_key(handle) {
            return Err(ProtocolError::Unauthorized);
        }
        // 배타적 grant: 기존 grantee는 대체됨
        state.grants.insert(handle.clone(), user.clone());
        Ok(())
    }

    fn user_decrypt(&self, handle: &ResultHandle, user: &EthAddress) -> ProtocolResult<bool> {
        let state = self.state.read().unwrap();
        match state.grants.get(handle) {
            Some(grantee) if grantee == user => {
                state.results.get(handle).copied().ok_or(ProtocolError::Unauthorized)
            }
            _ => Err(ProtocolError::Unauthorized),
        }
    }
}
