//! Configuration Module
//!
//! # Interview Q&A
//!
//! Q: 환경변수 vs 설정 파일, 어떤 방식을 선택했고 왜인가?
//! A: 환경변수를 선택
//!    - 12-Factor App 원칙 준수
//!    - Docker/K8s 배포 시 환경별 설정 분리 용이
//!    - 민감 정보를 코드에 포함하지 않음
//!
//! Q: 설정 검증은 어떻게 하는가?
//! A: from_env()에서 파싱 실패 시 즉시 실패 (fail-fast)
//!    - 앱 시작 시점에 모든 설정 검증
//!    - 런타임 에러보다 시작 실패가 디버깅에 유리

use std::env;

use anyhow::{anyhow, Context, Result};
use fhe_age_protocol::EthAddress;

/// Sepolia 테스트넷 체인 ID
pub const SEPOLIA_CHAIN_ID: u64 = 11155111;

/// 복호화 서비스 제한 시간 기본값 (초)
pub const DEFAULT_RELAYER_TIMEOUT_SECS: u64 = 120;

/// 애플리케이션 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 포트 (기본값: 3001)
    pub port: u16,

    /// Relayer 업스트림 URL (pass-through 프록시 대상)
    pub relayer_url: String,

    /// 복호화 권한 서비스 base URL
    /// 기본값은 자기 자신 (게이트웨이 엔드포인트 내장)
    pub decrypt_service_url: String,

    /// Relayer/복호화 경계 제한 시간 (초, 기본 120)
    pub relayer_timeout_secs: u64,

    /// 배포된 레코드 스토어(컨트랙트) 주소
    pub contract_address: EthAddress,

    /// 체인 ID
    pub chain_id: u64,

    /// 환경 (development, staging, production)
    pub environment: Environment,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Config {
    /// 환경변수에서 설정 로드
    ///
    /// # Optional Environment Variables
    ///
    /// - `PORT`: 서버 포트 (기본값: 3001)
    /// - `RELAYER_URL`: relayer 업스트림 URL
    /// - `DECRYPT_SERVICE_URL`: 복호화 권한 서비스 URL
    /// - `RELAYER_TIMEOUT_SECS`: 복호화 경계 제한 시간 (기본 120)
    /// - `CONTRACT_ADDRESS`: 레코드 스토어 주소
    /// - `CHAIN_ID`: 체인 ID (기본 Sepolia)
    /// - `ENVIRONMENT`: development | staging | production
    pub fn from_env() -> Result<Self> {
        let environment = match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" => Environment::Production,
            "staging" => Environment::Staging,
            _ => Environment::Development,
        };

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse()
            .context("PORT must be a valid number")?;

        let contract_address = EthAddress::new(
            &env::var("CONTRACT_ADDRESS")
                .unwrap_or_else(|_| "0x053ed58bd6c58cc53dc51a884cfe7477d070d922".to_string()),
        )
        .map_err(|e| anyhow!("CONTRACT_ADDRESS: {}", e))?;

        Ok(Config {
            port,

            relayer_url: env::var("RELAYER_URL")
                .unwrap_or_else(|_| "https://relayer.testnet.zama.org".to_string()),

            decrypt_service_url: env::var("DECRYPT_SERVICE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{}", port)),

            relayer_timeout_secs: env::var("RELAYER_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_RELAYER_TIMEOUT_SECS.to_string())
                .parse()
                .context("RELAYER_TIMEOUT_SECS must be a valid number")?,

            contract_address,

            chain_id: env::var("CHAIN_ID")
                .unwrap_or_else(|_| SEPOLIA_CHAIN_ID.to_string())
                .parse()
                .context("Invalid CHAIN_ID")?,

            environment,
        })
    }

    /// 프로덕션 환경인지 확인
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // 환경변수 없이 기본값으로 설정 생성
        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.relayer_timeout_secs, 120);
        assert_eq!(config.chain_id, SEPOLIA_CHAIN_ID);
        assert_eq!(config.environment, Environment::Development);
        assert!(!config.is_production());
    }
}
