//! Account status evaluation

use chrono::{DateTime, Utc};
use dirauth_core::config::AccountControl;
use dirauth_core::types::{AccountStatus, DirectoryEntry};
use tracing::debug;

const USER_ACCOUNT_CONTROL: &str = "userAccountControl";
const ACCOUNT_EXPIRES: &str = "accountExpires";

/// ADS_UF_ACCOUNTDISABLE
const ACCOUNT_DISABLE: i64 = 0x2;

/// 100ns intervals between 1601-01-01 and the Unix epoch
const FILETIME_UNIX_OFFSET: i64 = 116_444_736_000_000_000;

/// Derives the four account facts from a user entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatusEvaluator {
    None,
    ActiveDirectory,
}

impl From<AccountControl> for AccountStatusEvaluator {
    fn from(control: AccountControl) -> Self {
        match control {
            AccountControl::None => AccountStatusEvaluator::None,
            AccountControl::ActiveDirectory => AccountStatusEvaluator::ActiveDirectory,
        }
    }
}

impl AccountStatusEvaluator {
    pub fn evaluate(&self, entry: &DirectoryEntry) -> AccountStatus {
        self.evaluate_at(entry, Utc::now())
    }

    pub fn evaluate_at(&self, entry: &DirectoryEntry, now: DateTime<Utc>) -> AccountStatus {
        match self {
            AccountStatusEvaluator::None => AccountStatus::default(),
            AccountStatusEvaluator::ActiveDirectory => {
                let enabled = match parse_i64(entry, USER_ACCOUNT_CONTROL) {
                    Some(flags) => flags & ACCOUNT_DISABLE == 0,
                    None => true,
                };
                let account_non_expired = parse_i64(entry, ACCOUNT_EXPIRES)
                    .and_then(filetime_to_datetime)
                    .map_or(true, |expires| expires > now);

                AccountStatus {
                    enabled,
                    account_non_expired,
                    ..AccountStatus::default()
                }
            }
        }
    }
}

fn parse_i64(entry: &DirectoryEntry, attribute: &str) -> Option<i64> {
    let raw = entry.first_value(attribute)?;
    match raw.trim().parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("Ignoring malformed {} on {}: {}", attribute, entry.dn(), raw);
            None
        }
    }
}

/// Windows FILETIME to UTC; `None` for the "never" markers
fn filetime_to_datetime(value: i64) -> Option<DateTime<Utc>> {
    if value <= 0 || value == i64::MAX {
        return None;
    }
    let unix = value - FILETIME_UNIX_OFFSET;
    let secs = unix.div_euclid(10_000_000);
    let nanos = (unix.rem_euclid(10_000_000) * 100) as u32;
    DateTime::from_timestamp(secs, nanos)
}
