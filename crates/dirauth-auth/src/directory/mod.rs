//! Directory access
//!
//! The engine talks to the directory through [`SessionFactory`] and
//! [`DirectorySession`]. Two implementations exist:
//! - [`LdapSessionFactory`] over the ldap3 client (LDAP, LDAPS, STARTTLS)
//! - [`InMemoryDirectory`], a test double holding entries in memory

mod client;
mod memory;

pub use client::{LdapSessionFactory, ServerInfo};
pub use memory::InMemoryDirectory;

use dirauth_core::config::SearchScope;
use dirauth_core::types::DirectoryEntry;
use dirauth_core::DirectoryError;
use std::fmt;

/// Filter matching any entry
pub const ANY_OBJECT_FILTER: &str = "(objectClass=*)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base_dn: String,
    pub scope: SearchScope,
    pub filter: String,
    /// Requested attributes, all user attributes when empty
    pub attributes: Vec<String>,
    /// Maximum number of entries, unlimited when `None`
    pub size_limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(base_dn: impl Into<String>, scope: SearchScope, filter: impl Into<String>) -> Self {
        Self {
            base_dn: base_dn.into(),
            scope,
            filter: filter.into(),
            attributes: Vec::new(),
            size_limit: None,
        }
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_size_limit(mut self, limit: usize) -> Self {
        self.size_limit = Some(limit);
        self
    }
}

/// Identity a new session authenticates as
#[derive(Clone, PartialEq, Eq)]
pub enum ConnectionInitializer {
    /// The configured service account, or anonymous
    Application,
    /// A simple bind as the given DN
    Bind { dn: String, credential: String },
}

impl fmt::Debug for ConnectionInitializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionInitializer::Application => f.write_str("Application"),
            ConnectionInitializer::Bind { dn, .. } => f
                .debug_struct("Bind")
                .field("dn", dn)
                .field("credential", &"***")
                .finish(),
        }
    }
}

/// An open, authenticated connection to the directory
pub trait DirectorySession {
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<DirectoryEntry>, DirectoryError>;

    /// Rebind the session. `Ok(false)` means the directory rejected the
    /// credentials.
    fn bind(&mut self, dn: &str, credential: &str) -> Result<bool, DirectoryError>;

    fn compare(&mut self, dn: &str, attribute: &str, value: &str) -> Result<bool, DirectoryError>;

    /// RFC 3062 password modify extended operation
    fn modify_password(&mut self, dn: &str, old: &str, new: &str) -> Result<(), DirectoryError>;

    /// Replace every value of a binary attribute with `value`
    fn replace_binary_attribute(
        &mut self,
        dn: &str,
        attribute: &str,
        value: &[u8],
    ) -> Result<(), DirectoryError>;
}

pub trait SessionFactory: Send + Sync {
    /// Connect and authenticate. A rejected user bind fails with an error
    /// that reports invalid credentials.
    fn open(
        &self,
        initializer: &ConnectionInitializer,
    ) -> Result<Box<dyn DirectorySession>, DirectoryError>;
}

/// Escape a value for use inside a search filter
pub fn escape_filter_value(value: &str) -> String {
    ldap3::ldap_escape(value).into_owned()
}

/// Escape a value for use inside a distinguished name
pub fn escape_dn_value(value: &str) -> String {
    ldap3::dn_escape(value).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initializer_hides_credential() {
        let init = ConnectionInitializer::Bind {
            dn: "uid=alice,ou=people,dc=example,dc=org".to_string(),
            credential: "secret".to_string(),
        };
        let debug = format!("{:?}", init);
        assert!(debug.contains("uid=alice"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_filter_value("a*b(c)").to_lowercase(), "a\\2ab\\28c\\29");
        assert_eq!(escape_filter_value("alice"), "alice");

        let escaped = escape_dn_value("Smith, John");
        assert!(escaped.starts_with("Smith\\"));
        assert_eq!(escape_dn_value("alice"), "alice");
    }
}
