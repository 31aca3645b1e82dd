//! In-memory directory
//!
//! A [`SessionFactory`] over a shared entry list. Intended for tests: it
//! records bind attempts and searches and can be told to fail.

use super::{ConnectionInitializer, DirectorySession, SearchRequest, SessionFactory};
use dirauth_core::config::SearchScope;
use dirauth_core::error::result_code;
use dirauth_core::types::DirectoryEntry;
use dirauth_core::utils::{is_descendant_of, split_dn, unescape_dn_value};
use dirauth_core::DirectoryError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<Mutex<DirectoryState>>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    entries: Vec<DirectoryEntry>,
    passwords: HashMap<String, String>,
    bind_attempts: Vec<String>,
    searches: Vec<SearchRequest>,
    search_failure: Option<DirectoryError>,
    wrap_bind_failures: bool,
    unreachable: bool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, entry: DirectoryEntry) -> Self {
        self.add_entry(entry);
        self
    }

    pub fn add_entry(&self, entry: DirectoryEntry) {
        let mut state = self.state.lock();
        state.entries.retain(|e| !e.dn().eq_ignore_ascii_case(entry.dn()));
        state.entries.push(entry);
    }

    /// Password accepted when binding as `dn`
    pub fn set_password(&self, dn: &str, password: &str) {
        self.state
            .lock()
            .passwords
            .insert(dn.to_lowercase(), password.to_string());
    }

    pub fn password(&self, dn: &str) -> Option<String> {
        self.state.lock().passwords.get(&dn.to_lowercase()).cloned()
    }

    /// Make every following search fail with `error`
    pub fn fail_searches(&self, error: DirectoryError) {
        self.state.lock().search_failure = Some(error);
    }

    /// Report rejected binds as connection errors carrying the bind result
    pub fn wrap_bind_failures(&self) {
        self.state.lock().wrap_bind_failures = true;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unreachable = unreachable;
    }

    /// DNs of every bind attempted, in order
    pub fn bind_attempts(&self) -> Vec<String> {
        self.state.lock().bind_attempts.clone()
    }

    pub fn searches(&self) -> Vec<SearchRequest> {
        self.state.lock().searches.clone()
    }
}

impl SessionFactory for InMemoryDirectory {
    fn open(
        &self,
        initializer: &ConnectionInitializer,
    ) -> Result<Box<dyn DirectorySession>, DirectoryError> {
        let mut session = InMemorySession {
            state: self.state.clone(),
        };

        if self.state.lock().unreachable {
            return Err(DirectoryError::with_code(
                result_code::CONNECT_ERROR,
                "Connection refused",
            ));
        }

        if let ConnectionInitializer::Bind { dn, credential } = initializer {
            if !session.bind(dn, credential)? {
                let rejected = DirectoryError::with_code(
                    result_code::INVALID_CREDENTIALS,
                    format!("Invalid credentials for {}", dn),
                );
                if self.state.lock().wrap_bind_failures {
                    return Err(DirectoryError::new("Connection initialization failed")
                        .caused_by(rejected));
                }
                return Err(rejected);
            }
        }

        Ok(Box::new(session))
    }
}

struct InMemorySession {
    state: Arc<Mutex<DirectoryState>>,
}

impl DirectorySession for InMemorySession {
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let mut state = self.state.lock();
        state.searches.push(request.clone());

        if let Some(error) = &state.search_failure {
            return Err(error.clone());
        }

        let filter = Filter::parse(&request.filter)?;
        let limit = request.size_limit.filter(|l| *l > 0).unwrap_or(usize::MAX);

        Ok(state
            .entries
            .iter()
            .filter(|e| in_scope(e.dn(), &request.base_dn, request.scope))
            .filter(|e| filter.matches(e))
            .take(limit)
            .cloned()
            .collect())
    }

    fn bind(&mut self, dn: &str, credential: &str) -> Result<bool, DirectoryError> {
        let mut state = self.state.lock();
        state.bind_attempts.push(dn.to_string());
        Ok(!credential.is_empty()
            && state.passwords.get(&dn.to_lowercase()).map(String::as_str) == Some(credential))
    }

    fn compare(&mut self, dn: &str, attribute: &str, value: &str) -> Result<bool, DirectoryError> {
        let state = self.state.lock();
        let entry = state
            .entries
            .iter()
            .find(|e| e.dn().eq_ignore_ascii_case(dn))
            .ok_or_else(|| no_such_object(dn))?;

        Ok(entry
            .values(attribute)
            .is_some_and(|values| values.iter().any(|v| v == value)))
    }

    fn modify_password(&mut self, dn: &str, old: &str, new: &str) -> Result<(), DirectoryError> {
        let mut state = self.state.lock();
        let key = dn.to_lowercase();
        let current = state.passwords.get(&key).cloned();
        match current {
            None => Err(no_such_object(dn)),
            Some(current) if current != old => Err(DirectoryError::with_code(
                result_code::UNWILLING_TO_PERFORM,
                "Old password does not match",
            )),
            Some(_) => {
                state.passwords.insert(key, new.to_string());
                Ok(())
            }
        }
    }

    fn replace_binary_attribute(
        &mut self,
        dn: &str,
        attribute: &str,
        value: &[u8],
    ) -> Result<(), DirectoryError> {
        let mut state = self.state.lock();
        let index = state
            .entries
            .iter()
            .position(|e| e.dn().eq_ignore_ascii_case(dn))
            .ok_or_else(|| no_such_object(dn))?;

        let entry = state.entries[index]
            .clone()
            .with_binary_attribute(attribute, vec![value.to_vec()]);
        state.entries[index] = entry;

        // the directory derives the bind password from unicodePwd
        if attribute.eq_ignore_ascii_case("unicodePwd") {
            let password = decode_unicode_pwd(value).ok_or_else(|| {
                DirectoryError::with_code(
                    result_code::UNWILLING_TO_PERFORM,
                    "Malformed unicodePwd value",
                )
            })?;
            state.passwords.insert(dn.to_lowercase(), password);
        }
        Ok(())
    }
}

/// Quoted UTF-16LE password as written to unicodePwd
fn decode_unicode_pwd(value: &[u8]) -> Option<String> {
    if value.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = value
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let quoted = String::from_utf16(&units).ok()?;
    quoted
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map(String::from)
}

fn no_such_object(dn: &str) -> DirectoryError {
    DirectoryError::with_code(result_code::NO_SUCH_OBJECT, format!("No such object: {}", dn))
}

fn in_scope(dn: &str, base_dn: &str, scope: SearchScope) -> bool {
    let same = || split_dn(dn) == split_dn(base_dn) || dn.eq_ignore_ascii_case(base_dn);
    match scope {
        SearchScope::Base => same(),
        SearchScope::OneLevel => {
            is_descendant_of(dn, base_dn) && split_dn(dn).len() == split_dn(base_dn).len() + 1
        }
        SearchScope::Subtree => same() || is_descendant_of(dn, base_dn),
    }
}

/// Search filter subset: `&`, `|`, `!`, equality, presence and substrings
#[derive(Debug, PartialEq)]
enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    /// Attribute value pattern split on unescaped `*`
    Match(String, Vec<String>),
}

impl Filter {
    fn parse(input: &str) -> Result<Self, DirectoryError> {
        let (filter, rest) = parse_filter(input.trim())
            .ok_or_else(|| invalid_filter(input))?;
        if !rest.trim().is_empty() {
            return Err(invalid_filter(input));
        }
        Ok(filter)
    }

    fn matches(&self, entry: &DirectoryEntry) -> bool {
        match self {
            Filter::And(items) => items.iter().all(|f| f.matches(entry)),
            Filter::Or(items) => items.iter().any(|f| f.matches(entry)),
            Filter::Not(inner) => !inner.matches(entry),
            Filter::Match(attribute, pattern) => entry
                .values(attribute)
                .is_some_and(|values| values.iter().any(|v| glob_matches(pattern, v))),
        }
    }
}

fn invalid_filter(filter: &str) -> DirectoryError {
    DirectoryError::with_code(result_code::FILTER_ERROR, format!("Invalid filter: {}", filter))
}

fn parse_filter(input: &str) -> Option<(Filter, &str)> {
    let body = input.trim_start().strip_prefix('(')?;
    match body.chars().next()? {
        '&' => parse_list(&body[1..]).map(|(items, rest)| (Filter::And(items), rest)),
        '|' => parse_list(&body[1..]).map(|(items, rest)| (Filter::Or(items), rest)),
        '!' => {
            let (inner, rest) = parse_filter(&body[1..])?;
            let rest = rest.trim_start().strip_prefix(')')?;
            Some((Filter::Not(Box::new(inner)), rest))
        }
        _ => {
            let end = body.find(')')?;
            let (attribute, value) = body[..end].split_once('=')?;
            let pattern = value.split('*').map(unescape_dn_value).collect();
            Some((Filter::Match(attribute.trim().to_string(), pattern), &body[end + 1..]))
        }
    }
}

fn parse_list(mut input: &str) -> Option<(Vec<Filter>, &str)> {
    let mut items = Vec::new();
    loop {
        input = input.trim_start();
        if let Some(rest) = input.strip_prefix(')') {
            return Some((items, rest));
        }
        let (item, rest) = parse_filter(input)?;
        items.push(item);
        input = rest;
    }
}

fn glob_matches(pattern: &[String], value: &str) -> bool {
    let value = value.to_lowercase();
    let parts: Vec<String> = pattern.iter().map(|p| p.to_lowercase()).collect();

    if parts.len() == 1 {
        return value == parts[0];
    }

    let (first, rest) = match parts.split_first() {
        Some(split) => split,
        None => return false,
    };
    let Some(remaining) = value.strip_prefix(first.as_str()) else {
        return false;
    };
    let (last, middle) = match rest.split_last() {
        Some(split) => split,
        None => return true,
    };

    let mut cursor = remaining;
    for part in middle {
        match cursor.find(part.as_str()) {
            Some(pos) => cursor = &cursor[pos + part.len()..],
            None => return false,
        }
    }
    cursor.ends_with(last.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryDirectory {
        let directory = InMemoryDirectory::new()
            .with_entry(
                DirectoryEntry::new("uid=alice,ou=people,dc=example,dc=org")
                    .with_attribute("objectClass", ["top", "inetOrgPerson"])
                    .with_attribute("uid", ["alice"])
                    .with_attribute("mail", ["alice@example.org"]),
            )
            .with_entry(
                DirectoryEntry::new("uid=bob,ou=contractors,ou=people,dc=example,dc=org")
                    .with_attribute("objectClass", ["inetOrgPerson"])
                    .with_attribute("uid", ["bob"]),
            );
        directory.set_password("uid=alice,ou=people,dc=example,dc=org", "secret");
        directory
    }

    fn search(directory: &InMemoryDirectory, scope: SearchScope, filter: &str) -> Vec<String> {
        let mut session = directory.open(&ConnectionInitializer::Application).unwrap();
        session
            .search(&SearchRequest::new("ou=people,dc=example,dc=org", scope, filter))
            .unwrap()
            .iter()
            .map(|e| e.dn().to_string())
            .collect()
    }

    #[test]
    fn test_scopes() {
        let directory = directory();
        assert_eq!(search(&directory, SearchScope::OneLevel, "(objectClass=*)").len(), 1);
        assert_eq!(search(&directory, SearchScope::Subtree, "(objectClass=*)").len(), 2);
        assert!(search(&directory, SearchScope::Base, "(objectClass=*)").is_empty());
    }

    #[test]
    fn test_filters() {
        let directory = directory();
        assert_eq!(
            search(&directory, SearchScope::Subtree, "(&(objectClass=inetOrgPerson)(uid=ALICE))"),
            vec!["uid=alice,ou=people,dc=example,dc=org".to_string()]
        );
        assert_eq!(search(&directory, SearchScope::Subtree, "(|(uid=alice)(uid=bob))").len(), 2);
        assert_eq!(search(&directory, SearchScope::Subtree, "(!(uid=alice))").len(), 1);
        assert_eq!(search(&directory, SearchScope::Subtree, "(mail=*@example.org)").len(), 1);
        assert!(search(&directory, SearchScope::Subtree, "(uid=al\\2a)").is_empty());
    }

    #[test]
    fn test_bind() {
        let directory = directory();
        let ok = directory.open(&ConnectionInitializer::Bind {
            dn: "uid=alice,ou=people,dc=example,dc=org".to_string(),
            credential: "secret".to_string(),
        });
        assert!(ok.is_ok());

        let err = directory
            .open(&ConnectionInitializer::Bind {
                dn: "uid=alice,ou=people,dc=example,dc=org".to_string(),
                credential: "wrong".to_string(),
            })
            .err()
            .unwrap();
        assert_eq!(err.result_code, Some(result_code::INVALID_CREDENTIALS));

        directory.wrap_bind_failures();
        let err = directory
            .open(&ConnectionInitializer::Bind {
                dn: "uid=alice,ou=people,dc=example,dc=org".to_string(),
                credential: "wrong".to_string(),
            })
            .err()
            .unwrap();
        assert_eq!(err.result_code, None);
        assert!(err.is_invalid_credentials());
        assert_eq!(directory.bind_attempts().len(), 3);
    }

    #[test]
    fn test_modify_password() {
        let directory = directory();
        let dn = "uid=alice,ou=people,dc=example,dc=org";
        let mut session = directory.open(&ConnectionInitializer::Application).unwrap();

        assert!(session.modify_password(dn, "wrong", "new").is_err());
        session.modify_password(dn, "secret", "new").unwrap();
        assert_eq!(directory.password(dn).as_deref(), Some("new"));
    }

    #[test]
    fn test_replace_unicode_pwd() {
        let directory = directory();
        let dn = "uid=alice,ou=people,dc=example,dc=org";
        let mut session = directory.open(&ConnectionInitializer::Application).unwrap();
        let value: Vec<u8> = "\"changed\"".encode_utf16().flat_map(u16::to_le_bytes).collect();

        session.replace_binary_attribute(dn, "unicodePwd", &value).unwrap();
        assert_eq!(directory.password(dn).as_deref(), Some("changed"));

        let entry = session
            .search(&SearchRequest::new(dn, SearchScope::Base, "(objectClass=*)"))
            .unwrap()
            .remove(0);
        assert_eq!(entry.binary_values("unicodePwd"), Some(&[value][..]));

        assert!(session
            .replace_binary_attribute(dn, "unicodePwd", b"not quoted")
            .is_err());
        assert!(session
            .replace_binary_attribute("uid=nobody,dc=example,dc=org", "jpegPhoto", b"x")
            .is_err());
    }

    #[test]
    fn test_search_failure() {
        let directory = directory();
        directory.fail_searches(DirectoryError::with_code(51, "busy"));
        let mut session = directory.open(&ConnectionInitializer::Application).unwrap();
        let err = session
            .search(&SearchRequest::new("dc=example,dc=org", SearchScope::Subtree, "(uid=alice)"))
            .unwrap_err();
        assert_eq!(err.result_code, Some(51));
    }
}
