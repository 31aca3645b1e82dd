//! Account status types

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Four independent facts about an account, derived on every authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountStatus {
    pub account_non_expired: bool,
    pub account_non_locked: bool,
    pub credentials_non_expired: bool,
    pub enabled: bool,
}

impl Default for AccountStatus {
    /// An account nothing is known about is fine
    fn default() -> Self {
        Self {
            account_non_expired: true,
            account_non_locked: true,
            credentials_non_expired: true,
            enabled: true,
        }
    }
}

impl AccountStatus {
    pub fn is_usable(&self) -> bool {
        self.check().is_ok()
    }

    /// Reject the account with the first failing fact.
    ///
    /// Order: disabled, locked, expired, credentials expired.
    pub fn check(&self) -> Result<()> {
        if !self.enabled {
            return Err(Error::AccountDisabled);
        }
        if !self.account_non_locked {
            return Err(Error::AccountLocked);
        }
        if !self.account_non_expired {
            return Err(Error::AccountExpired);
        }
        if !self.credentials_non_expired {
            return Err(Error::CredentialsExpired);
        }
        Ok(())
    }
}
