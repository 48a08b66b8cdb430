pub mod keepass;

pub use self::keepass::KeepassVault;

use crate::config::DatabaseSettings;
use crate::error::Result;

/// OTP 속성 이름 (otpauth:// URI)
pub const OTP: &str = "otp";
/// 레거시 TOTP 시드 속성 이름 (base32 시크릿)
pub const TOTP_SEED: &str = "TOTP Seed";
/// 레거시 TOTP 설정 속성 이름 ("주기;자릿수")
pub const TOTP_SETTINGS: &str = "TOTP Settings";

/// 창 제목과 autotype 시퀀스 연결
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Association {
    /// 창 제목 패턴 (glob 또는 //정규식//)
    pub window: String,
    pub sequence: String,
}

/// 복호화된 엔트리 하나
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entry {
    /// (이름, 값) 속성 목록 (Title, UserName, Password, URL, Notes, 사용자 정의 필드)
    pub attributes: Vec<(String, String)>,
    /// 엔트리 기본 autotype 시퀀스
    pub default_sequence: String,
    pub associations: Vec<Association>,
}

impl Entry {
    pub fn new<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// 속성 값 (정확히 일치, 없으면 빈 문자열)
    pub fn get(&self, key: &str) -> &str {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// 대소문자 무시 속성 값
    pub fn get_ignore_case(&self, key: &str) -> &str {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    pub fn title(&self) -> &str {
        self.get("Title")
    }

    /// OTP 시드를 가진 엔트리인지
    pub fn has_otp(&self) -> bool {
        !self.get(OTP).is_empty() || !self.get(TOTP_SEED).is_empty()
    }
}

/// 암호화된 자격 증명 저장소
///
/// 자격 증명은 `derive_credentials`로 한 번 만들어 두고, `open`은 몇 번이든
/// 같은 자격 증명으로 다시 복호화할 수 있어야 합니다.
pub trait Vault: Send + Sync {
    /// 비밀번호(와 설정의 키 파일)로 자격 증명 생성
    fn derive_credentials(&mut self, settings: &DatabaseSettings, password: &str) -> Result<()>;

    /// 데이터베이스를 복호화하고 모든 엔트리를 나열
    fn open(&mut self, settings: &DatabaseSettings) -> Result<Vec<Entry>>;
}
