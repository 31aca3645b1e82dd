//! Remember-me support
//!
//! [`RememberMeTokenProvider`] derives a comparison-only token from the
//! current state of an account, [`RememberMeServices`] signs it into a
//! cookie and checks returning cookies against a freshly derived token.

mod cookie;

pub use cookie::{RememberMeCookie, RememberMeServices};

use crate::account::AccountStatusEvaluator;
use dirauth_core::types::{AccountStatus, DirectoryEntry};
use dirauth_core::AuthenticationProperties;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum RememberMeTokenProvider {
    /// Bound to the account status facts and the DN
    AccountStatusBound { evaluator: AccountStatusEvaluator },
    /// Bound to the account status facts and the password change time
    PasswordLastSetBound {
        evaluator: AccountStatusEvaluator,
        attribute: String,
    },
}

impl RememberMeTokenProvider {
    pub fn new(properties: &AuthenticationProperties) -> Self {
        let evaluator = AccountStatusEvaluator::from(properties.account_control);
        match properties.password_last_set_attribute_name() {
            Some(attribute) => RememberMeTokenProvider::PasswordLastSetBound {
                evaluator,
                attribute: attribute.to_string(),
            },
            None => RememberMeTokenProvider::AccountStatusBound { evaluator },
        }
    }

    pub fn derive(&self, entry: &DirectoryEntry) -> String {
        match self {
            RememberMeTokenProvider::AccountStatusBound { evaluator } => {
                format!("{}{}", status_prefix(&evaluator.evaluate(entry)), entry.dn())
            }
            RememberMeTokenProvider::PasswordLastSetBound {
                evaluator,
                attribute,
            } => match entry.first_value(attribute) {
                Some(last_set) => {
                    format!("{}{}", status_prefix(&evaluator.evaluate(entry)), last_set)
                }
                None => {
                    debug!("{} has no {}; issuing a one-off token", entry.dn(), attribute);
                    Uuid::new_v4().to_string()
                }
            },
        }
    }
}

fn status_prefix(status: &AccountStatus) -> String {
    format!(
        "{}:{}:{}:{}-",
        status.account_non_expired,
        status.account_non_locked,
        status.credentials_non_expired,
        status.enabled
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirauth_core::config::AccountControl;

    fn entry(uac: &str) -> DirectoryEntry {
        DirectoryEntry::new("cn=junit,cn=users,dc=example,dc=org")
            .with_attribute("userAccountControl", [uac])
            .with_attribute("pwdLastSet", ["133485408000000000"])
    }

    #[test]
    fn test_account_status_bound() {
        let provider = RememberMeTokenProvider::new(&AuthenticationProperties {
            account_control: AccountControl::ActiveDirectory,
            ..Default::default()
        });

        assert_eq!(
            provider.derive(&entry("512")),
            "true:true:true:true-cn=junit,cn=users,dc=example,dc=org"
        );
        assert_ne!(provider.derive(&entry("512")), provider.derive(&entry("514")));
    }

    #[test]
    fn test_password_last_set_bound() {
        let provider = RememberMeTokenProvider::new(&AuthenticationProperties {
            account_control: AccountControl::ActiveDirectory,
            password_last_set_attribute: Some("pwdLastSet".to_string()),
            ..Default::default()
        });

        assert_eq!(
            provider.derive(&entry("512")),
            "true:true:true:true-133485408000000000"
        );
        assert_eq!(
            provider.derive(&entry("514")),
            "true:true:true:false-133485408000000000"
        );
    }

    #[test]
    fn test_missing_password_last_set_is_never_stable() {
        let provider = RememberMeTokenProvider::new(&AuthenticationProperties {
            password_last_set_attribute: Some("pwdLastSet".to_string()),
            ..Default::default()
        });
        let entry = DirectoryEntry::new("uid=alice,ou=people,dc=example,dc=org");

        assert_ne!(provider.derive(&entry), provider.derive(&entry));
    }
}
