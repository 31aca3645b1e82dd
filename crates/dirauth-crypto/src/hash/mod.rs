//! Hash utilities

use crate::CryptoError;
use base64::{engine::general_purpose::STANDARD, Engine};
use digest::Digest;
use hmac::{Hmac, Mac};
use md5::Md5;
use sha1::Sha1;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub fn sha1_base64(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    STANDARD.encode(hasher.finalize())
}

pub fn sha256_base64(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    STANDARD.encode(hasher.finalize())
}

pub fn md5_base64(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    STANDARD.encode(hasher.finalize())
}

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

pub fn hmac_sha256_hex(key: &[u8], data: &[u8]) -> Result<String, CryptoError> {
    hmac_sha256(key, data).map(hex::encode)
}

/// Check a hex encoded HMAC-SHA256 tag in constant time
pub fn verify_hmac_sha256_hex(key: &[u8], data: &[u8], tag: &str) -> Result<bool, CryptoError> {
    let tag = hex::decode(tag).map_err(|e| CryptoError::InvalidEncoding(e.to_string()))?;
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    mac.update(data);
    Ok(mac.verify_slice(&tag).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digests() {
        assert_eq!(sha1_base64(b"password"), "W6ph5Mm5Pz8GgiULbPgzG37mj9g=");
        assert_eq!(
            sha256_base64(b"password"),
            "XohImNooBHFR0OVvjcYpJ3NgPQ1qq73WKhHvch0VQtg="
        );
        assert_eq!(md5_base64(b"password"), "X03MO1qnZdYdgyfeuILPmQ==");
    }

    #[test]
    fn test_hmac_verification() {
        let tag = hmac_sha256_hex(b"key", b"alice:1700000000000:token").unwrap();
        assert_eq!(tag.len(), 64);
        assert!(verify_hmac_sha256_hex(b"key", b"alice:1700000000000:token", &tag).unwrap());
        assert!(!verify_hmac_sha256_hex(b"other", b"alice:1700000000000:token", &tag).unwrap());
        assert!(verify_hmac_sha256_hex(b"key", b"data", "not-hex").is_err());
    }
}
