//! Directory entry types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node of the directory tree as returned by a search.
///
/// Attribute names are looked up case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    dn: String,
    #[serde(default)]
    attributes: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing)]
    binary_attributes: BTreeMap<String, Vec<Vec<u8>>>,
}

impl DirectoryEntry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
            binary_attributes: BTreeMap::new(),
        }
    }

    /// Build an entry from the attribute maps a directory client produced
    pub fn from_parts(
        dn: impl Into<String>,
        attributes: impl IntoIterator<Item = (String, Vec<String>)>,
        binary_attributes: impl IntoIterator<Item = (String, Vec<Vec<u8>>)>,
    ) -> Self {
        Self {
            dn: dn.into(),
            attributes: attributes.into_iter().collect(),
            binary_attributes: binary_attributes.into_iter().collect(),
        }
    }

    pub fn with_attribute<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_binary_attribute(mut self, name: impl Into<String>, values: Vec<Vec<u8>>) -> Self {
        self.binary_attributes.insert(name.into(), values);
        self
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// All string values of an attribute
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    /// First value of an attribute
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn binary_values(&self, name: &str) -> Option<&[Vec<u8>]> {
        self.binary_attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.values(name).is_some() || self.binary_values(name).is_some()
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .keys()
            .chain(self.binary_attributes.keys())
            .map(String::as_str)
    }

    /// Value of the leading RDN
    pub fn rdn_value(&self) -> String {
        crate::utils::rdn_value(&self.dn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let entry = DirectoryEntry::new("uid=alice,ou=people,dc=example,dc=org")
            .with_attribute("memberOf", ["cn=admins,ou=groups,dc=example,dc=org"])
            .with_attribute("mail", ["alice@example.org", "a@example.org"]);

        assert_eq!(entry.values("memberof").map(|v| v.len()), Some(1));
        assert_eq!(entry.first_value("MAIL"), Some("alice@example.org"));
        assert!(entry.first_value("sn").is_none());
        assert_eq!(entry.rdn_value(), "alice");
    }

    #[test]
    fn test_binary_attributes_are_not_serialized() {
        let entry = DirectoryEntry::new("cn=junit,cn=users,dc=example,dc=org")
            .with_binary_attribute("objectGUID", vec![vec![1, 2, 3]]);
        assert!(entry.has_attribute("objectguid"));

        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("objectGUID"));
    }
}
