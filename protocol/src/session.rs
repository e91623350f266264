//! Verification Session State Machine
//!
//! 클라이언트 검증 플로우를 명시적 FSM으로 모델링한다. 원래의
//! 콜백/이벤트 기반 흐름(지갑 훅, 영수증 watcher) 대신 전이마다
//! 단 하나의 뮤테이션 포인트를 갖는다.
//!
//! # States
//!
//! ```text
//! idle → connected → input → encrypting → submitting → confirming → decrypting → result
//!          │                                                            ▲
//!          └────────────── view existing result ───────────────────────┘
//!
//! result → connected        (restart)
//! any    → idle             (wallet disconnect, epoch 증가)
//! connected/input/encrypting → connected   (요청 거부, 에러 메시지 보존)
//! any active → result       (실패, 에러 페이로드 포함)
//! ```
//!
//! # Cancellation
//!
//! 중단점은 정확히 네 개의 비동기 경계(encrypt, submit, confirm,
//! decrypt)다. disconnect는 진행 중인 호출을 기다리지 않고 `epoch`을
//! 올린다. 이후 도착하는 완료 결과는 epoch 불일치로 폐기되어야 하며,
//! disconnect 이후 세션을 변경할 수 없다.

use serde::Serialize;
use thiserror::Error;

/// 세션 초기 선택 연도
pub const DEFAULT_BIRTH_YEAR: u16 = 2000;

/// 검증 플로우 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStep {
    /// 지갑 미연결
    Idle,
    /// 연결됨, 시작 대기
    Connected,
    /// 출생연도 선택 중
    Input,
    /// 출생연도 암호화 중
    Encrypting,
    /// 원장에 제출 중
    Submitting,
    /// 트랜잭션 확정 대기
    Confirming,
    /// 결과 복호화 중
    Decrypting,
    /// 최종 결과 (또는 에러) 표시
    Result,
}

/// 세션 전이 입력
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// 지갑 연결
    Connect,
    /// 지갑 해제. 어떤 상태에서도 허용되며 진행 중 호출은 버려짐
    Disconnect,
    /// 검증 시작
    Start,
    /// 출생연도 선택 (input 단계에서만)
    SelectYear(u16),
    /// 제출 버튼. 이 시점 이후 선택 연도는 불변
    BeginEncrypt,
    /// 암호화 어댑터가 (ciphertext, proof) 반환
    EncryptReady,
    /// 원장이 제출 호출을 수락
    TxAccepted(String),
    /// 원장이 트랜잭션을 확정
    TxConfirmed,
    /// 기존 제출 결과 바로 보기 (재제출 없이)
    ViewExisting,
    /// 복호화 어댑터가 평문 결과 반환
    Decrypted(bool),
    /// 요청 거부: connected로 복귀, 메시지 보존
    Reject(String),
    /// 시도 실패: result로 이동, 에러 페이로드 포함
    Fail(String),
    /// 결과 화면에서 재시작
    Restart,
}

impl SessionInput {
    fn name(&self) -> &'static str {
        match self {
            SessionInput::Connect => "connect",
            SessionInput::Disconnect => "disconnect",
            SessionInput::Start => "start",
            SessionInput::SelectYear(_) => "select_year",
            SessionInput::BeginEncrypt => "begin_encrypt",
            SessionInput::EncryptReady => "encrypt_ready",
            SessionInput::TxAccepted(_) => "tx_accepted",
            SessionInput::TxConfirmed => "tx_confirmed",
            SessionInput::ViewExisting => "view_existing",
            SessionInput::Decrypted(_) => "decrypted",
            SessionInput::Reject(_) => "reject",
            SessionInput::Fail(_) => "fail",
            SessionInput::Restart => "restart",
        }
    }
}

/// 허용되지 않는 전이
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: '{input}' is not allowed in step {step:?}")]
pub struct TransitionError {
    pub step: VerificationStep,
    pub input: &'static str,
}

/// 연결된 주소 하나당 하나씩 존재하는 임시 세션
///
/// 모든 변경은 `apply`를 통해서만 일어난다. 허용되지 않는 입력은
/// 세션을 건드리지 않고 에러를 반환한다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationSession {
    step: VerificationStep,
    selected_year: u16,
    tx_ref: Option<String>,
    is_eligible: Option<bool>,
    error: Option<String>,
    /// disconnect마다 증가. 이전 epoch에서 시작된 비동기 호출의 결과를
    /// 식별해 폐기하기 위한 가드.
    epoch: u64,
}

impl VerificationSession {
    pub fn new() -> Self {
        Self {
            step: VerificationStep::Idle,
            selected_year: DEFAULT_BIRTH_YEAR,
            tx_ref: None,
            is_eligible: None,
            error: None,
            epoch: 0,
        }
    }

    pub fn step(&self) -> VerificationStep {
        self.step
    }

    pub fn selected_year(&self) -> u16 {
        self.selected_year
    }

    pub fn tx_ref(&self) -> Option<&str> {
        self.tx_ref.as_deref()
    }

    pub fn is_eligible(&self) -> Option<bool> {
        self.is_eligible
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// 주어진 epoch에서 시작된 호출의 결과를 아직 반영해도 되는가
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch == epoch
    }

    fn reset_attempt(&mut self) {
        self.selected_year = DEFAULT_BIRTH_YEAR;
        self.tx_ref = None;
        self.is_eligible = None;
        self.error = None;
    }

    /// 단일 뮤테이션 포인트
    pub fn apply(&mut self, input: SessionInput) -> Result<(), TransitionError> {
        use VerificationStep::*;

        match (self.step, input) {
            // 지갑 연결/해제
            (Idle, SessionInput::Connect) => {
                self.step = Connected;
            }
            (_, SessionInput::Disconnect) => {
                self.reset_attempt();
                self.epoch += 1;
                self.step = Idle;
            }

            // 정상 경로
            (Connected, SessionInput::Start) => {
                self.error = None;
                self.step = Input;
            }
            (Input, SessionInput::SelectYear(year)) => {
                self.selected_year = year;
            }
            (Input, SessionInput::BeginEncrypt) => {
                // 이 시점부터 selected_year는 이번 시도 동안 불변
                self.step = Encrypting;
            }
            (Encrypting, SessionInput::EncryptReady) => {
                self.step = Submitting;
            }
            (Submitting, SessionInput::TxAccepted(tx_ref)) => {
                self.tx_ref = Some(tx_ref);
                self.step = Confirming;
            }
            (Confirming, SessionInput::TxConfirmed) => {
                self.step = Decrypting;
            }
            (Decrypting, SessionInput::Decrypted(eligible)) => {
                self.is_eligible = Some(eligible);
                self.step = Result;
            }

            // 기존 결과 바로 보기
            (Connected, SessionInput::ViewExisting) => {
                self.error = None;
                self.step = Decrypting;
            }

            // 거부: connected로 복귀, 메시지 보존
            (Connected | Input | Encrypting, SessionInput::Reject(message)) => {
                self.error = Some(message);
                self.step = Connected;
            }

            // 실패: 에러 페이로드와 함께 result로
            (
                Connected | Input | Encrypting | Submitting | Confirming | Decrypting | Result,
                SessionInput::Fail(message),
            ) => {
                self.is_eligible = None;
                self.error = Some(message);
                self.step = Result;
            }

            // 재시작
            (Result, SessionInput::Restart) => {
                self.reset_attempt();
                self.step = Connected;
            }

            (step, input) => {
                return Err(TransitionError {
                    step,
                    input: input.name(),
                })
            }
        }

        Ok(())
    }
}

impl Default for VerificationSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionInput::*;
    use VerificationStep as Step;

    fn connected() -> VerificationSession {
        let mut session = VerificationSession::new();
        session.apply(Connect).unwrap();
        session
    }

    #[test]
    fn test_happy_path() {
        let mut session = VerificationSession::new();
        assert_eq!(session.step(), Step::Idle);
        assert_eq!(session.selected_year(), DEFAULT_BIRTH_YEAR);

        session.apply(Connect).unwrap();
        session.apply(Start).unwrap();
        session.apply(SelectYear(1990)).unwrap();
        session.apply(BeginEncrypt).unwrap();
        session.apply(EncryptReady).unwrap();
        session.apply(TxAccepted("0xabc".to_string())).unwrap();
        session.apply(TxConfirmed).unwrap();
        session.apply(Decrypted(true)).unwrap();

        assert_eq!(session.step(), Step::Result);
        assert_eq!(session.selected_year(), 1990);
        assert_eq!(session.tx_ref(), Some("0xabc"));
        assert_eq!(session.is_eligible(), Some(true));
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_no_stage_skipping() {
        // result는 실제 복호화(또는 실패)로만 도달 가능
        let mut session = connected();
        assert!(session.apply(Decrypted(true)).is_err());
        assert!(session.apply(EncryptReady).is_err());
        assert!(session.apply(TxConfirmed).is_err());
        assert_eq!(session.step(), Step::Connected);
    }

    #[test]
    fn test_year_immutable_once_encrypting() {
        let mut session = connected();
        session.apply(Start).unwrap();
        session.apply(SelectYear(1999)).unwrap();
        session.apply(BeginEncrypt).unwrap();

        let err = session.apply(SelectYear(2010)).unwrap_err();
        assert_eq!(err.step, Step::Encrypting);
        assert_eq!(session.selected_year(), 1999);
    }

    #[test]
    fn test_view_existing_shortcut() {
        let mut session = connected();
        session.apply(ViewExisting).unwrap();
        assert_eq!(session.step(), Step::Decrypting);
        session.apply(Decrypted(false)).unwrap();
        assert_eq!(session.is_eligible(), Some(false));
    }

    #[test]
    fn test_reject_returns_to_connected_preserving_error() {
        let mut session = connected();
        session.apply(Start).unwrap();
        session.apply(BeginEncrypt).unwrap();
        session
            .apply(Reject("user rejected the request".to_string()))
            .unwrap();

        assert_eq!(session.step(), Step::Connected);
        assert_eq!(session.error(), Some("user rejected the request"));

        // 재시작하면 에러가 지워진다
        session.apply(Start).unwrap();
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_reject_not_allowed_mid_flight() {
        let mut session = connected();
        session.apply(Start).unwrap();
        session.apply(BeginEncrypt).unwrap();
        session.apply(EncryptReady).unwrap();
        // submitting 이후에는 거부가 아니라 실패로 처리
        assert!(session.apply(Reject("late".to_string())).is_err());
    }

    #[test]
    fn test_fail_lands_on_result_with_error() {
        let mut session = connected();
        session.apply(ViewExisting).unwrap();
        session.apply(Fail("decryption timed out".to_string())).unwrap();

        assert_eq!(session.step(), Step::Result);
        assert_eq!(session.is_eligible(), None);
        assert_eq!(session.error(), Some("decryption timed out"));
    }

    #[test]
    fn test_restart_from_result() {
        let mut session = connected();
        session.apply(ViewExisting).unwrap();
        session.apply(Decrypted(true)).unwrap();
        session.apply(Restart).unwrap();

        assert_eq!(session.step(), Step::Connected);
        assert_eq!(session.is_eligible(), None);
        assert_eq!(session.error(), None);
        assert_eq!(session.selected_year(), DEFAULT_BIRTH_YEAR);
    }

    #[test]
    fn test_disconnect_from_any_state_resets_and_bumps_epoch() {
        let mut session = connected();
        session.apply(Start).unwrap();
        session.apply(SelectYear(1990)).unwrap();
        session.apply(BeginEncrypt).unwrap();

        let before = session.epoch();
        session.apply(Disconnect).unwrap();

        assert_eq!(session.step(), Step::Idle);
        assert_eq!(session.epoch(), before + 1);
        assert_eq!(session.selected_year(), DEFAULT_BIRTH_YEAR);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_stale_epoch_detection() {
        let mut session = connected();
        let in_flight_epoch = session.epoch();
        session.apply(Disconnect).unwrap();

        // disconnect 이전에 시작된 호출의 결과는 폐기 대상
        assert!(!session.is_current(in_flight_epoch));
        session.apply(Connect).unwrap();
        assert!(!session.is_current(in_flight_epoch));
        assert!(session.is_current(in_flight_epoch + 1));
    }

    #[test]
    fn test_connect_only_from_idle() {
        let mut session = connected();
        assert!(session.apply(Connect).is_err());
    }

    #[test]
    fn test_step_serialization() {
        let json = serde_json::to_string(&Step::Encrypting).unwrap();
        assert_eq!(json, "\"encrypting\"");

        let session = VerificationSession::new();
        let value: serde_json::Value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["step"], "idle");
        assert_eq!(value["selected_year"], 2000);
    }
}
