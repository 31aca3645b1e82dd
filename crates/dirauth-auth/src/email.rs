//! Email to username lookup

use crate::directory::{
    escape_filter_value, ConnectionInitializer, SearchRequest, SessionFactory, ANY_OBJECT_FILTER,
};
use dirauth_core::config::{EmailLookup, SearchScope};
use dirauth_core::utils::non_blank;
use dirauth_core::{AuthenticationProperties, DirectoryError, Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("EMAIL_PATTERN is a valid regex pattern")
});

/// Resolves a login given as an email address to the username it belongs to
#[derive(Debug)]
pub struct EmailUsernameResolver {
    mode: EmailLookup,
    lookup: Option<LookupSettings>,
    reachable: OnceLock<bool>,
}

#[derive(Debug, Clone)]
struct LookupSettings {
    base_dn: String,
    scope: SearchScope,
    object_class: String,
    email_attribute: String,
    username_attribute: String,
}

impl EmailUsernameResolver {
    pub fn new(properties: &AuthenticationProperties) -> Self {
        let lookup = match (
            non_blank(Some(properties.user_base_dn.as_str())),
            non_blank(Some(properties.user_object_class.as_str())),
            non_blank(properties.email_attribute.as_deref()),
            non_blank(Some(properties.username_attribute.as_str())),
        ) {
            (Some(base_dn), Some(object_class), Some(email), Some(username)) => {
                Some(LookupSettings {
                    base_dn: base_dn.to_string(),
                    scope: properties.user_search_scope,
                    object_class: object_class.to_string(),
                    email_attribute: email.to_string(),
                    username_attribute: username.to_string(),
                })
            }
            _ => None,
        };

        Self {
            mode: properties.email_lookup,
            lookup,
            reachable: OnceLock::new(),
        }
    }

    pub fn is_email(value: &str) -> bool {
        EMAIL_PATTERN.is_match(value)
    }

    /// Username for `input`, or `input` itself when it is not an email
    /// address or no single user owns it
    pub fn resolve(&self, factory: &dyn SessionFactory, input: &str) -> Result<String> {
        if self.mode == EmailLookup::Disabled || !Self::is_email(input) {
            return Ok(input.to_string());
        }
        let Some(lookup) = &self.lookup else {
            return Ok(input.to_string());
        };
        if !self.is_reachable(factory, lookup) {
            debug!("Directory unreachable, skipping email lookup for {}", input);
            return Ok(input.to_string());
        }

        match lookup.find_username(factory, input) {
            Ok(Some(username)) => {
                debug!("Resolved {} to {}", input, username);
                Ok(username)
            }
            Ok(None) => Ok(input.to_string()),
            Err(e) if self.mode == EmailLookup::Strict => Err(Error::Directory(e)),
            Err(e) => {
                warn!("Email lookup for {} failed: {}", input, e);
                Ok(input.to_string())
            }
        }
    }

    /// Computed once; concurrent first calls may both probe
    fn is_reachable(&self, factory: &dyn SessionFactory, lookup: &LookupSettings) -> bool {
        if let Some(reachable) = self.reachable.get() {
            return *reachable;
        }
        let reachable = match lookup.probe(factory) {
            Ok(()) => true,
            Err(e) => {
                warn!("Email lookup disabled, cannot search {}: {}", lookup.base_dn, e);
                false
            }
        };
        *self.reachable.get_or_init(|| reachable)
    }
}

impl LookupSettings {
    fn probe(&self, factory: &dyn SessionFactory) -> std::result::Result<(), DirectoryError> {
        let mut session = factory.open(&ConnectionInitializer::Application)?;
        let request = SearchRequest::new(&self.base_dn, SearchScope::Base, ANY_OBJECT_FILTER)
            .with_attributes(["objectClass"])
            .with_size_limit(1);
        session.search(&request).map(|_| ())
    }

    fn find_username(
        &self,
        factory: &dyn SessionFactory,
        email: &str,
    ) -> std::result::Result<Option<String>, DirectoryError> {
        let filter = format!(
            "(&(objectClass={})({}={}))",
            self.object_class,
            self.email_attribute,
            escape_filter_value(email)
        );
        let request = SearchRequest::new(&self.base_dn, self.scope, filter)
            .with_attributes([self.username_attribute.as_str()])
            .with_size_limit(2);

        let mut session = factory.open(&ConnectionInitializer::Application)?;
        let entries = session.search(&request)?;
        if entries.len() != 1 {
            debug!("{} entries carry {}, keeping it as username", entries.len(), email);
            return Ok(None);
        }

        Ok(entries[0]
            .first_value(&self.username_attribute)
            .map(String::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use dirauth_core::types::DirectoryEntry;

    fn directory() -> InMemoryDirectory {
        InMemoryDirectory::new()
            .with_entry(DirectoryEntry::new("ou=people,dc=example,dc=org"))
            .with_entry(
                DirectoryEntry::new("uid=alice,ou=people,dc=example,dc=org")
                    .with_attribute("objectClass", ["inetOrgPerson"])
                    .with_attribute("uid", ["alice"])
                    .with_attribute("mail", ["alice@example.org"]),
            )
            .with_entry(
                DirectoryEntry::new("uid=bob,ou=people,dc=example,dc=org")
                    .with_attribute("objectClass", ["inetOrgPerson"])
                    .with_attribute("uid", ["bob"])
                    .with_attribute("mail", ["shared@example.org"]),
            )
            .with_entry(
                DirectoryEntry::new("uid=carol,ou=people,dc=example,dc=org")
                    .with_attribute("objectClass", ["inetOrgPerson"])
                    .with_attribute("uid", ["carol"])
                    .with_attribute("mail", ["shared@example.org"]),
            )
    }

    fn resolver(mode: EmailLookup) -> EmailUsernameResolver {
        EmailUsernameResolver::new(&AuthenticationProperties {
            user_base_dn: "ou=people,dc=example,dc=org".to_string(),
            email_lookup: mode,
            ..Default::default()
        })
    }

    #[test]
    fn test_email_detection() {
        assert!(EmailUsernameResolver::is_email("alice@example.org"));
        assert!(!EmailUsernameResolver::is_email("alice"));
        assert!(!EmailUsernameResolver::is_email("alice@localhost"));
        assert!(!EmailUsernameResolver::is_email("uid=alice,ou=people,dc=example,dc=org"));
    }

    #[test]
    fn test_resolves_single_match() {
        let directory = directory();
        let resolver = resolver(EmailLookup::Tolerant);

        assert_eq!(resolver.resolve(&directory, "alice@example.org").unwrap(), "alice");
        assert_eq!(resolver.resolve(&directory, "alice").unwrap(), "alice");
        assert_eq!(
            resolver.resolve(&directory, "shared@example.org").unwrap(),
            "shared@example.org"
        );
        assert_eq!(
            resolver.resolve(&directory, "nobody@example.org").unwrap(),
            "nobody@example.org"
        );
    }

    #[test]
    fn test_reachability_is_memoized() {
        let directory = directory();
        let resolver = resolver(EmailLookup::Tolerant);

        resolver.resolve(&directory, "alice@example.org").unwrap();
        resolver.resolve(&directory, "alice@example.org").unwrap();

        let probes = directory
            .searches()
            .iter()
            .filter(|s| s.scope == SearchScope::Base)
            .count();
        assert_eq!(probes, 1);
    }

    #[test]
    fn test_unreachable_directory_falls_back() {
        let directory = directory();
        directory.set_unreachable(true);
        let resolver = resolver(EmailLookup::Strict);

        assert_eq!(
            resolver.resolve(&directory, "alice@example.org").unwrap(),
            "alice@example.org"
        );
    }

    #[test]
    fn test_lookup_errors_follow_mode() {
        let directory = directory();

        let tolerant = resolver(EmailLookup::Tolerant);
        let strict = resolver(EmailLookup::Strict);
        // probe while the directory still answers
        tolerant.resolve(&directory, "alice@example.org").unwrap();
        strict.resolve(&directory, "alice@example.org").unwrap();

        directory.fail_searches(DirectoryError::with_code(51, "Server busy"));
        assert_eq!(
            tolerant.resolve(&directory, "alice@example.org").unwrap(),
            "alice@example.org"
        );
        assert!(matches!(
            strict.resolve(&directory, "alice@example.org"),
            Err(Error::Directory(_))
        ));
    }

    #[test]
    fn test_disabled() {
        let directory = directory();
        let resolver = resolver(EmailLookup::Disabled);

        assert_eq!(
            resolver.resolve(&directory, "alice@example.org").unwrap(),
            "alice@example.org"
        );
        assert!(directory.searches().is_empty());
    }
}
