//! RFC 6238 TOTP 코드 생성
//!
//! 엔트리의 `otp` 속성(otpauth:// URI) 또는 레거시 `TOTP Seed`/`TOTP Settings`
//! 속성에서 시크릿과 매개변수를 읽습니다.

use crate::error::{KpMenuError, Result};
use crate::vault::{Entry, OTP, TOTP_SEED, TOTP_SETTINGS};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

/// TOTP 매개변수
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpParams {
    pub secret: Vec<u8>,
    pub period: u64,
    pub digits: u32,
    pub algorithm: Algorithm,
}

impl TotpParams {
    /// 엔트리 속성에서 매개변수 추출
    pub fn from_entry(entry: &Entry) -> Result<Self> {
        let uri = entry.get(OTP);
        if !uri.is_empty() {
            return Self::from_uri(uri);
        }

        let seed = entry.get(TOTP_SEED);
        if seed.is_empty() {
            return Err(KpMenuError::Otp("entry has no OTP seed".to_string()));
        }
        let mut params = Self {
            secret: decode_base32(seed)?,
            period: 30,
            digits: 6,
            algorithm: Algorithm::Sha1,
        };

        // "30;6" 형식
        let settings = entry.get(TOTP_SETTINGS);
        let mut parts = settings.split(';').map(str::trim);
        if let Some(period) = parts.next().filter(|p| !p.is_empty()) {
            params.period = parse_number(period, "period")?;
        }
        if let Some(digits) = parts.next().filter(|d| !d.is_empty()) {
            params.digits = parse_number(digits, "digits")?;
        }
        params.check()?;
        Ok(params)
    }

    /// otpauth://totp/label?secret=...&period=...&digits=...&algorithm=...
    pub fn from_uri(uri: &str) -> Result<Self> {
        let query = uri
            .strip_prefix("otpauth://totp/")
            .and_then(|rest| rest.split_once('?'))
            .map(|(_, query)| query)
            .ok_or_else(|| KpMenuError::Otp(format!("not a TOTP URI: {}", uri)))?;

        let mut secret = None;
        let mut params = Self {
            secret: Vec::new(),
            period: 30,
            digits: 6,
            algorithm: Algorithm::Sha1,
        };

        for pair in query.split('&') {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key.to_ascii_lowercase().as_str() {
                "secret" => secret = Some(decode_base32(value)?),
                "period" => params.period = parse_number(value, "period")?,
                "digits" => params.digits = parse_number(value, "digits")?,
                "algorithm" => {
                    params.algorithm = match value.to_ascii_uppercase().as_str() {
                        "SHA1" => Algorithm::Sha1,
                        "SHA256" => Algorithm::Sha256,
                        "SHA512" => Algorithm::Sha512,
                        other => {
                            return Err(KpMenuError::Otp(format!("unsupported algorithm: {}", other)))
                        }
                    }
                }
                _ => {}
            }
        }

        params.secret =
            secret.ok_or_else(|| KpMenuError::Otp("URI has no secret".to_string()))?;
        params.check()?;
        Ok(params)
    }

    fn check(&self) -> Result<()> {
        if self.period == 0 {
            return Err(KpMenuError::Otp("period must be positive".to_string()));
        }
        if !(1..=10).contains(&self.digits) {
            return Err(KpMenuError::Otp(format!("invalid digits: {}", self.digits)));
        }
        Ok(())
    }

    /// `now` (유닉스 초) 시점의 코드
    pub fn code_at(&self, now: u64) -> Result<String> {
        let counter = (now / self.period).to_be_bytes();
        let digest = match self.algorithm {
            Algorithm::Sha1 => hmac_digest::<Hmac<Sha1>>(&self.secret, &counter)?,
            Algorithm::Sha256 => hmac_digest::<Hmac<Sha256>>(&self.secret, &counter)?,
            Algorithm::Sha512 => hmac_digest::<Hmac<Sha512>>(&self.secret, &counter)?,
        };

        // RFC 4226 dynamic truncation
        let offset = (digest[digest.len() - 1] & 0x0f) as usize;
        let binary = u32::from_be_bytes([
            digest[offset] & 0x7f,
            digest[offset + 1],
            digest[offset + 2],
            digest[offset + 3],
        ]);
        let code = u64::from(binary) % 10u64.pow(self.digits);
        Ok(format!("{:0width$}", code, width = self.digits as usize))
    }
}

fn hmac_digest<M: Mac + hmac::digest::KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    let mut mac = <M as hmac::digest::KeyInit>::new_from_slice(key)
        .map_err(|e| KpMenuError::Otp(e.to_string()))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn parse_number<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| KpMenuError::Otp(format!("invalid {}: {:?}", what, raw)))
}

/// RFC 4648 base32 디코딩 (대소문자, 공백, 패딩 무시)
pub fn decode_base32(input: &str) -> Result<Vec<u8>> {
    let mut bits: u64 = 0;
    let mut bit_count = 0u32;
    let mut out = Vec::with_capacity(input.len() * 5 / 8);

    for c in input.chars().filter(|c| !c.is_whitespace() && *c != '=') {
        let value = match c.to_ascii_uppercase() {
            c @ 'A'..='Z' => c as u64 - 'A' as u64,
            c @ '2'..='7' => c as u64 - '2' as u64 + 26,
            other => {
                return Err(KpMenuError::Otp(format!("invalid base32 character: {:?}", other)))
            }
        };
        bits = (bits << 5) | value;
        bit_count += 5;
        if bit_count >= 8 {
            bit_count -= 8;
            out.push((bits >> bit_count) as u8);
            bits &= (1 << bit_count) - 1;
        }
    }

    if out.is_empty() {
        return Err(KpMenuError::Otp("empty secret".to_string()));
    }
    Ok(out)
}

/// 엔트리의 현재 TOTP 코드
pub fn compute(entry: &Entry, now: u64) -> Result<String> {
    TotpParams::from_entry(entry)?.code_at(now)
}

/// 현재 유닉스 시간 (초)
pub fn now_seconds() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const GITHUB_URI: &str = "otpauth://totp/github:test?secret=NBSXEZLTMF2GK43UON2HE2LOM4FA====&period=30&digits=6&issuer=github";

    #[test]
    fn test_otp_from_uri() {
        let entry = Entry::new([(OTP, GITHUB_URI)]);
        assert_eq!(compute(&entry, 0).unwrap(), "717299");
    }

    #[test]
    fn test_otp_uri_defaults() {
        let entry = Entry::new([(
            OTP,
            "otpauth://totp/buhtig:tset?secret=NBSXEZLTMF2GK43UON2HE2LOM4FA====&digits=6&issuer=Homeassistant",
        )]);
        assert_eq!(compute(&entry, 123456789).unwrap(), "045678");
    }

    #[test]
    fn test_rfc6238_sha1_vectors() {
        // "12345678901234567890"
        let entry = Entry::new([(
            OTP,
            "otpauth://totp/rfc?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ&digits=8",
        )]);
        assert_eq!(compute(&entry, 59).unwrap(), "94287082");
        assert_eq!(compute(&entry, 1111111109).unwrap(), "07081804");
    }

    #[test]
    fn test_legacy_seed_attribute() {
        let entry = Entry::new([
            (TOTP_SEED, "nbsx ezlt mf2g k43u on2h e2lo m4fa"),
            (TOTP_SETTINGS, "30;6"),
        ]);
        assert_eq!(compute(&entry, 0).unwrap(), "717299");
    }

    #[test]
    fn test_missing_seed() {
        let entry = Entry::new([("Title", "no otp")]);
        assert!(matches!(compute(&entry, 0), Err(KpMenuError::Otp(_))));
    }

    #[test]
    fn test_invalid_uri() {
        assert!(TotpParams::from_uri("otpauth://hotp/x?secret=AAAA").is_err());
        assert!(TotpParams::from_uri("otpauth://totp/x?period=30").is_err());
        assert!(TotpParams::from_uri("otpauth://totp/x?secret=AAAA&algorithm=MD5").is_err());
    }

    #[test]
    fn test_decode_base32() {
        assert_eq!(decode_base32("MZXW6YTBOI======").unwrap(), b"foobar");
        assert_eq!(decode_base32("mzxw6ytboi").unwrap(), b"foobar");
        assert!(decode_base32("M1").is_err());
    }
}
