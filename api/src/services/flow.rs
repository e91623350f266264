//! Verification Flow Orchestrator
//!
//! 연결된 주소 하나당 하나의 세션을 소유하고, FSM을 네 개의 비동기
//! 경계(encrypt → submit → confirm → decrypt)를 따라 구동한다.
//!
//! # Concurrency Model
//!
//! - 세션 간에는 어떤 잠금도 공유하지 않는다 (주소별 독립)
//! - 한 세션 안에서는 엄격히 순차적: 이전 호출이 끝나기 전에 다음
//!   호출을 내보내지 않음
//! - 취소는 지갑 해제뿐이다. 진행 중인 호출은 강제 중단하지 않고,
//!   완료 결과를 epoch 가드로 폐기한다 (best-effort abandon)
//!
//! # Error Routing
//!
//! - 암호화 실패 / 사용자 거부 → connected로 복귀, 메시지 보존
//! - 원장/복호화 실패 → result로 이동, 에러 페이로드 표시
//! - 어떤 실패도 조용히 삼키지 않는다

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;

use fhe_age_protocol::{
    AgeVerificationStore, EthAddress, ProtocolError, SessionInput, TransitionError,
    VerificationSession,
};

use crate::services::decryption::{build_decrypt_request, DecryptSigner, DecryptionAuthority};
use crate::services::fhe::EncryptionService;
use crate::FheEngine;

/// 플로우 구동 에러 (세션 상태 오류는 세션에 기록되고, 여기에는
/// 오케스트레이션 자체의 오용만 담긴다)
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("no active session for {0}")]
    NoSession(EthAddress),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

struct SessionEntry {
    session: VerificationSession,
    signer: Arc<dyn DecryptSigner>,
}

/// 검증 플로우 오케스트레이터
pub struct VerificationFlow {
    store: Arc<AgeVerificationStore<FheEngine>>,
    encryption: Arc<EncryptionService>,
    authority: Arc<dyn DecryptionAuthority>,
    /// disconnect 이후에도 엔트리를 유지한다. epoch이 주소별로 단조
    /// 증가해야 뒤늦게 도착한 완료 결과를 안전하게 폐기할 수 있다.
    sessions: RwLock<HashMap<EthAddress, SessionEntry>>,
}

impl VerificationFlow {
    pub fn new(
        store: Arc<AgeVerificationStore<FheEngine>>,
        encryption: Arc<EncryptionService>,
        authority: Arc<dyn DecryptionAuthority>,
    ) -> Self {
        Self {
            store,
            encryption,
            authority,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// 지갑 연결: 세션 생성 (또는 기존 세션 재사용) 후 connected로
    pub async fn connect(&self, signer: Arc<dyn DecryptSigner>) -> Result<(), FlowError> {
        let user = signer.identity();
        let mut sessions = self.sessions.write().await;
        let entry = sessions.entry(user).or_insert_with(|| SessionEntry {
            session: VerificationSession::new(),
            signer: signer.clone(),
        });
        entry.session.apply(SessionInput::Connect)?;
        entry.signer = signer;
        Ok(())
    }

    /// 지갑 해제: 어떤 상태에서도 허용, 진행 중 호출은 버려진다
    pub async fn disconnect(&self, user: &EthAddress) -> Result<(), FlowError> {
        self.apply(user, SessionInput::Disconnect).await?;
        Ok(())
    }

    /// 검증 시작 (connected → input)
    pub async fn start(&self, user: &EthAddress) -> Result<(), FlowError> {
        self.apply(user, SessionInput::Start).await?;
        Ok(())
    }

    /// 결과 화면에서 재시작
    pub async fn restart(&self, user: &EthAddress) -> Result<(), FlowError> {
        self.apply(user, SessionInput::Restart).await?;
        Ok(())
    }

    /// 세션 스냅샷
    pub async fn session(&self, user: &EthAddress) -> Option<VerificationSession> {
        self.sessions
            .read()
            .await
            .get(user)
            .map(|entry| entry.session.clone())
    }

    /// 기존 제출 여부 (connected 화면의 "VIEW RESULT" 분기)
    pub fn has_existing_submission(&self, user: &EthAddress) -> bool {
        self.store.has_submitted(user)
    }

    /// 전체 검증 라운드트립 구동
    ///
    /// 프로토콜 수준의 실패는 세션에 기록되고 `Ok(())`로 끝난다.
    /// 반환 에러는 허용되지 않는 상태에서의 호출 같은 오용뿐이다.
    pub async fn run_verification(&self, user: &EthAddress, year: u16) -> Result<(), FlowError> {
        self.apply(user, SessionInput::SelectYear(year)).await?;
        let epoch = self.apply(user, SessionInput::BeginEncrypt).await?;

        // 중단점 1: 암호화
        let input = match self
            .encryption
            .encrypt_birth_year(self.store.address(), user, year)
            .await
        {
            Ok(input) => input,
            Err(e) => {
                self.reject_if_current(user, epoch, e.to_string()).await;
                return Ok(());
            }
        };
        // 중단점 2: 지갑 승인 + 원장 제출. 거부는 encrypting에서만
        // connected로 되돌릴 수 있으므로 영수증이 나오기 전에는 단계를
        // 진행시키지 않는다.
        let receipt = match self.store.submit(user, &input) {
            Ok(receipt) => receipt,
            Err(ProtocolError::UserDeclined(reason)) => {
                self.reject_if_current(user, epoch, reason).await;
                return Ok(());
            }
            Err(e) => {
                self.fail_if_current(user, epoch, e.to_string()).await;
                return Ok(());
            }
        };
        if !self
            .apply_if_current(user, epoch, SessionInput::EncryptReady)
            .await
        {
            return Ok(());
        }
        if !self
            .apply_if_current(user, epoch, SessionInput::TxAccepted(receipt.tx_ref))
            .await
        {
            return Ok(());
        }

        // 중단점 3: 확정 (in-process 원장은 영수증과 동시에 확정)
        if !self
            .apply_if_current(user, epoch, SessionInput::TxConfirmed)
            .await
        {
            return Ok(());
        }

        // 중단점 4: 복호화
        self.decrypt_current(user, epoch).await
    }

    /// 재제출 없이 기존 결과 보기 (connected → decrypting)
    pub async fn view_result(&self, user: &EthAddress) -> Result<(), FlowError> {
        let epoch = self.apply(user, SessionInput::ViewExisting).await?;
        self.decrypt_current(user, epoch).await
    }

    async fn decrypt_current(&self, user: &EthAddress, epoch: u64) -> Result<(), FlowError> {
        let signer = {
            let sessions = self.sessions.read().await;
            match sessions.get(user) {
                Some(entry) if entry.session.is_current(epoch) => entry.signer.clone(),
                _ => return Ok(()),
            }
        };

        let handle = match self.store.result_handle_of(user) {
            Ok(handle) => handle,
            Err(e) => {
                self.fail_if_current(user, epoch, e.to_string()).await;
                return Ok(());
            }
        };

        let request = match build_decrypt_request(signer.as_ref(), &handle, self.store.address())
            .await
        {
            Ok(request) => request,
            Err(e) => {
                self.fail_if_current(user, epoch, e.to_string()).await;
                return Ok(());
            }
        };

        match self.authority.user_decrypt(&request).await {
            Ok(eligible) => {
                self.apply_if_current(user, epoch, SessionInput::Decrypted(eligible))
                    .await;
            }
            Err(e) => {
                self.fail_if_current(user, epoch, e.to_string()).await;
            }
        }
        Ok(())
    }

    /// 단일 뮤테이션 포인트: 세션 잠금 아래에서 전이 적용
    async fn apply(&self, user: &EthAddress, input: SessionInput) -> Result<u64, FlowError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(user)
            .ok_or_else(|| FlowError::NoSession(user.clone()))?;
        entry.session.apply(input)?;
        Ok(entry.session.epoch())
    }

    /// epoch이 유효할 때만 전이 적용. 뒤늦은 완료 결과는 폐기한다.
    async fn apply_if_current(&self, user: &EthAddress, epoch: u64, input: SessionInput) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(entry) = sessions.get_mut(user) else {
            return false;
        };
        if !entry.session.is_current(epoch) {
            tracing::debug!(user = %user, "discarding result of abandoned call");
            return false;
        }
        if let Err(e) = entry.session.apply(input) {
            tracing::warn!(user = %user, error = %e, "unexpected session transition");
            return false;
        }
        true
    }

    async fn reject_if_current(&self, user: &EthAddress, epoch: u64, message: String) {
        self.apply_if_current(user, epoch, SessionInput::Reject(message))
            .await;
    }

    async fn fail_if_current(&self, user: &EthAddress, epoch: u64, message: String) {
        self.apply_if_current(user, epoch, SessionInput::Fail(message))
            .await;
    }
}
