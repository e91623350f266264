//! Confidential Record Store
//!
//! 주소별 제출 기록을 보관하는 원장 권한 컴포넌트. 암호화된 출생연도를
//! 받아 동형 비교를 수행하고, 결과 핸들에 대한 복호화 권한을 제출자
//! 에게만 부여한다.
//!
//! # Design Decision
//!
//! 전역 가변 원장 상태는 명시적 key-value 추상화로 모델링:
//! - 키(주소) 단위 원자성: 단일 `RwLock` 아래에서 레코드 갱신이
//!   통째로 일어나며, 동시 제출은 last-writer-wins
//! - 레코드 부재가 곧 "미제출" 상태 (`exists = false`와 동일하게 동작)
//! - 다른 주소에 대한 읽기는 쓰기와 무관하게 진행 가능
//!
//! 제출 *여부*는 기밀이 아니므로 조회는 누구나 가능하다. 기밀인 것은
//! 출생연도뿐이다.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;

use crate::engine::{keccak256, ComparisonEngine};
use crate::error::{ProtocolError, ProtocolResult};
use crate::threshold::ThresholdConfig;
use crate::types::{EncryptedInput, EthAddress, ResultHandle};

/// 주소별 제출 기록
///
/// 첫 제출에 생성되고, 재제출 시 통째로 덮어써진다 (append 아님).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    /// 최신 비교 결과 핸들
    pub result_handle: ResultHandle,
    /// 누적 제출 횟수 (허용된 제출마다 정확히 1 증가)
    pub submission_count: u64,
}

/// 제출 영수증
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    /// 원장 트랜잭션 참조
    pub tx_ref: String,
    /// 이번 제출 이후의 누적 횟수
    pub submission_number: u64,
}

/// 스토어 이벤트 (온체인 이벤트에 대응)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    YearSubmitted {
        user: EthAddress,
        submission_number: u64,
    },
    VerificationComplete {
        user: EthAddress,
    },
}

/// Confidential Record Store
///
/// # Example
/// ```ignore
/// let receipt = store.submit(&user, &input)?;
/// assert_eq!(store.submission_count_of(&user), receipt.submission_number);
/// ```
pub struct AgeVerificationStore<E: ComparisonEngine> {
    address: EthAddress,
    config: ThresholdConfig,
    engine: Arc<E>,
    records: RwLock<HashMap<EthAddress, SubmissionRecord>>,
    events: RwLock<Vec<StoreEvent>>,
}

impl<E: ComparisonEngine> AgeVerificationStore<E> {
    pub fn new(address: EthAddress, config: ThresholdConfig, engine: Arc<E>) -> Self {
        Self {
            address,
            config,
            engine,
            records: RwLock::new(HashMap::new()),
            events: RwLock::new(Vec::new()),
        }
    }

    /// 암호화된 출생연도 제출
    ///
    /// # Flow
    ///
    /// 1. 엔진이 증명을 검증하고 `year <= threshold_year`를 동형 계산
    /// 2. 새 핸들이 기존 핸들을 통째로 대체
    /// 3. 제출자에게만 복호화 권한 부여
    /// 4. 제출 횟수 1 증가, 이벤트 기록
    ///
    /// 증명 검증 실패 시 전체 연산이 원자적으로 거부된다: 횟수 증가도,
    /// 핸들 기록도, 권한 부여도 일어나지 않는다.
    pub fn submit(
        &self,
        user: &EthAddress,
        input: &EncryptedInput,
    ) -> ProtocolResult<SubmitReceipt> {
        // 검증 + 비교가 먼저다. 여기서 실패하면 스토어 상태는 그대로.
        let handle =
            self.engine
                .compare_le(input, &self.address, user, self.config.threshold_year())?;
        self.engine.grant_decrypt(&handle, user)?;

        let submission_number = {
            let mut records = self.records.write().unwrap();
            let record = records
                .entry(user.clone())
                .and_modify(|r| {
                    r.result_handle = handle.clone();
                    r.submission_count += 1;
                })
                .or_insert_with(|| SubmissionRecord {
                    result_handle: handle.clone(),
                    submission_count: 1,
                });
            record.submission_count
        };

        let tx_ref = format!(
            "0x{}",
            hex::encode(keccak256(&[
                b"fhe-age-tx",
                user.as_str().as_bytes(),
                handle.as_str().as_bytes(),
                &submission_number.to_be_bytes(),
            ]))
        );

        {
            let mut events = self.events.write().unwrap();
            events.push(StoreEvent::YearSubmitted {
                user: user.clone(),
                submission_number,
            });
            events.push(StoreEvent::VerificationComplete { user: user.clone() });
        }

        // 평문 연도는 절대 로그에 남기지 않는다
        tracing::info!(user = %user, submission_number, "birth year submission accepted");

        Ok(SubmitReceipt {
            tx_ref,
            submission_number,
        })
    }

    /// 최신 결과 핸들 조회
    ///
    /// 핸들 자체는 비밀이 아니다. 복호화는 별도의 권한 grant가 필요하며
    /// 그 권한은 제출자만 갖는다.
    pub fn result_handle_of(&self, user: &EthAddress) -> ProtocolResult<ResultHandle> {
        let records = self.records.read().unwrap();
        records
            .get(user)
            .map(|r| r.result_handle.clone())
            .ok_or(ProtocolError::NoSubmission)
    }

    /// 제출 여부 조회 (누구나, 어떤 주소에 대해서도 호출 가능)
    pub fn has_submitted(&self, user: &EthAddress) -> bool {
        self.records.read().unwrap().contains_key(user)
    }

    /// 누적 제출 횟수 조회 (미제출 주소는 0)
    pub fn submission_count_of(&self, user: &EthAddress) -> u64 {
        self.records
            .read()
            .unwrap()
            .get(user)
            .map(|r| r.submission_count)
            .unwrap_or(0)
    }

    /// 임계 연도. 순수 함수이며 저장된 레코드를 전혀 읽지 않는다.
    pub fn threshold_year(&self) -> u16 {
        self.config.threshold_year()
    }

    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// 스토어(컨트랙트) 주소
    pub fn address(&self) -> &EthAddress {
        &self.address
    }

    /// 지금까지 기록된 이벤트 스냅샷
    pub fn events(&self) -> Vec<StoreEvent> {
        self.events.read().unwrap().clone()
    }
}
