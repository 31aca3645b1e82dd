//! Password change

use crate::directory::DirectorySession;
use dirauth_core::config::AccountControl;
use dirauth_core::{AuthenticationProperties, Error, Result};
use tracing::debug;

const UNICODE_PWD: &str = "unicodePwd";

/// How a verified user's password is replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordChanger {
    /// RFC 3062 password modify extended operation
    ExtendedOperation,
    /// Bind with the old password, then replace `unicodePwd` with the
    /// quoted UTF-16LE new one (Active Directory, Samba)
    UnicodePwd,
}

impl PasswordChanger {
    pub fn new(properties: &AuthenticationProperties) -> Self {
        match properties.account_control {
            AccountControl::ActiveDirectory => PasswordChanger::UnicodePwd,
            AccountControl::None => PasswordChanger::ExtendedOperation,
        }
    }

    pub fn change(
        &self,
        session: &mut dyn DirectorySession,
        dn: &str,
        old: &str,
        new: &str,
    ) -> Result<()> {
        match self {
            PasswordChanger::ExtendedOperation => session.modify_password(dn, old, new)?,
            PasswordChanger::UnicodePwd => {
                if !session.bind(dn, old)? {
                    debug!("Bind with the old password failed for {}", dn);
                    return Err(Error::BadCredentials);
                }
                session.replace_binary_attribute(dn, UNICODE_PWD, &unicode_pwd(new))?;
            }
        }
        Ok(())
    }
}

/// `"password"` encoded as UTF-16LE
pub fn unicode_pwd(password: &str) -> Vec<u8> {
    format!("\"{}\"", password)
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection() {
        let ad = AuthenticationProperties {
            account_control: AccountControl::ActiveDirectory,
            ..Default::default()
        };
        assert_eq!(PasswordChanger::new(&ad), PasswordChanger::UnicodePwd);
        assert_eq!(
            PasswordChanger::new(&AuthenticationProperties::default()),
            PasswordChanger::ExtendedOperation
        );
    }

    #[test]
    fn test_unicode_pwd() {
        assert_eq!(
            unicode_pwd("ab"),
            vec![b'"', 0, b'a', 0, b'b', 0, b'"', 0]
        );
        // non-ASCII characters keep both bytes
        assert_eq!(&unicode_pwd("é")[2..4], &[0xe9, 0x00]);
    }
}
