//! Common Protocol Types
//!
//! 프로토콜 전반에서 사용되는 공통 타입 정의

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ethereum 주소 타입
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EthAddress(String);

impl EthAddress {
    pub fn new(addr: &str) -> Result<Self, String> {
        let addr = addr.to_lowercase();
        if addr.starts_with("0x")
            && addr.len() == 42
            && addr[2..].chars().all(|c| c.is_ascii_hexdigit())
        {
            Ok(Self(addr))
        } else {
            Err("Invalid Ethereum address format".to_string())
        }
    }

    /// 20바이트 원시 주소로부터 생성 (서명 복구 결과 등)
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EthAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 암호화된 비교 결과를 가리키는 불투명 핸들 (bytes32, hex 인코딩)
///
/// 핸들 자체는 비밀이 아님. 복호화에는 별도의 권한 grant가 필요하다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultHandle(String);

impl ResultHandle {
    pub fn new(handle: &str) -> Result<Self, String> {
        let handle = handle.to_lowercase();
        if handle.starts_with("0x")
            && handle.len() == 66
            && handle[2..].chars().all(|c| c.is_ascii_hexdigit())
        {
            Ok(Self(handle))
        } else {
            Err("Invalid result handle format".to_string())
        }
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 클라이언트가 생성한 외부 암호문 + 유효성 증명
///
/// 증명은 (store 주소, 제출자) 바인딩을 포함하므로 다른 store나 다른
/// 제출자 명의로 재사용할 수 없다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput {
    /// 암호화된 출생연도 핸들 (hex)
    pub ciphertext: String,
    /// 입력 유효성 증명 (hex)
    pub proof: String,
}
