//! Authentication result types

use super::{AccountStatus, DirectoryEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Attribute names the profile fields of a result are read from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAttributes {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Outcome of a successful authentication
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    username: String,
    roles: BTreeSet<String>,
    entry: DirectoryEntry,
    account_status: AccountStatus,
    remember_me_token: String,
    profile: ProfileAttributes,
}

impl AuthenticationResult {
    pub fn new(
        username: String,
        roles: BTreeSet<String>,
        entry: DirectoryEntry,
        account_status: AccountStatus,
        remember_me_token: String,
        profile: ProfileAttributes,
    ) -> Self {
        Self {
            username,
            roles,
            entry,
            account_status,
            remember_me_token,
            profile,
        }
    }

    /// Canonical username
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn dn(&self) -> &str {
        self.entry.dn()
    }

    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn entry(&self) -> &DirectoryEntry {
        &self.entry
    }

    pub fn account_status(&self) -> AccountStatus {
        self.account_status
    }

    /// Comparison-only value bound to the account state
    pub fn remember_me_token(&self) -> &str {
        &self.remember_me_token
    }

    pub fn first_name(&self) -> Option<&str> {
        self.project(self.profile.first_name.as_deref())
    }

    pub fn last_name(&self) -> Option<&str> {
        self.project(self.profile.last_name.as_deref())
    }

    pub fn email(&self) -> Option<&str> {
        self.project(self.profile.email.as_deref())
    }

    fn project(&self, attribute: Option<&str>) -> Option<&str> {
        attribute.and_then(|name| self.entry.first_value(name))
    }

    pub fn summary(&self) -> AuthenticationSummary {
        AuthenticationSummary {
            username: self.username.clone(),
            dn: self.dn().to_string(),
            roles: self.roles.iter().cloned().collect(),
            first_name: self.first_name().map(String::from),
            last_name: self.last_name().map(String::from),
            email: self.email().map(String::from),
            account_status: self.account_status,
        }
    }
}

/// Serializable view of a result, without the remember-me token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationSummary {
    pub username: String,
    pub dn: String,
    pub roles: Vec<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub account_status: AccountStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_projection() {
        let entry = DirectoryEntry::new("uid=alice,ou=people,dc=example,dc=org")
            .with_attribute("givenName", ["Alice"])
            .with_attribute("sn", ["Liddell"]);
        let result = AuthenticationResult::new(
            "alice".to_string(),
            BTreeSet::from(["ROLE_USER".to_string()]),
            entry,
            AccountStatus::default(),
            "token".to_string(),
            ProfileAttributes {
                first_name: Some("givenName".to_string()),
                last_name: Some("sn".to_string()),
                email: Some("mail".to_string()),
            },
        );

        assert_eq!(result.first_name(), Some("Alice"));
        assert_eq!(result.last_name(), Some("Liddell"));
        assert_eq!(result.email(), None);
        assert!(result.has_role("ROLE_USER"));

        let summary = result.summary();
        assert_eq!(summary.dn, "uid=alice,ou=people,dc=example,dc=org");
        assert_eq!(summary.roles, vec!["ROLE_USER".to_string()]);
    }
}
