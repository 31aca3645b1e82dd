//! LDAP password encoders
//!
//! Values are produced in the RFC 2307 userPassword form, e.g.
//! `{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g=`, so they can be compared verbatim
//! against a stored attribute.

use crate::hash::{md5_base64, sha1_base64, sha256_base64};
use std::fmt::Debug;

/// Encodes a raw password into the form stored in the directory
pub trait PasswordEncoder: Send + Sync + Debug {
    fn encode(&self, raw: &str) -> String;
}

/// Unsalted userPassword schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LdapPasswordEncoder {
    /// Stored as cleartext
    Plain,
    Sha,
    Sha256,
    Md5,
}

impl LdapPasswordEncoder {
    pub fn prefix(&self) -> &'static str {
        match self {
            LdapPasswordEncoder::Plain => "",
            LdapPasswordEncoder::Sha => "{SHA}",
            LdapPasswordEncoder::Sha256 => "{SHA256}",
            LdapPasswordEncoder::Md5 => "{MD5}",
        }
    }
}

impl PasswordEncoder for LdapPasswordEncoder {
    fn encode(&self, raw: &str) -> String {
        let data = raw.as_bytes();
        let digest = match self {
            LdapPasswordEncoder::Plain => return raw.to_string(),
            LdapPasswordEncoder::Sha => sha1_base64(data),
            LdapPasswordEncoder::Sha256 => sha256_base64(data),
            LdapPasswordEncoder::Md5 => md5_base64(data),
        };
        format!("{}{}", self.prefix(), digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(LdapPasswordEncoder::Plain.encode("secret"), "secret");
        assert_eq!(
            LdapPasswordEncoder::Sha.encode("password"),
            "{SHA}W6ph5Mm5Pz8GgiULbPgzG37mj9g="
        );
        assert_eq!(
            LdapPasswordEncoder::Md5.encode("password"),
            "{MD5}X03MO1qnZdYdgyfeuILPmQ=="
        );
        assert!(LdapPasswordEncoder::Sha256.encode("password").starts_with("{SHA256}"));
    }
}
