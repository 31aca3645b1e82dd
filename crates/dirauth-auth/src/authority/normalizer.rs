use dirauth_core::config::CaseTransformation;
use dirauth_core::{AuthenticationProperties, Error, Result};
use regex::Regex;
use std::collections::BTreeSet;

/// Turns raw group names into role identifiers.
///
/// Each raw role is looked up in the mapping table first; a mapped role is
/// emitted verbatim. Otherwise the case transformation, the regex
/// replacements and the prefix are applied in that order. Default roles
/// skip the mapping table.
#[derive(Debug, Clone)]
pub struct AuthorityNormalizer {
    /// Lowercased source and verbatim target
    mappings: Vec<(String, String)>,
    default_roles: Vec<String>,
    case: CaseTransformation,
    replacements: Vec<(Regex, String)>,
    prefix: Option<String>,
}

impl AuthorityNormalizer {
    pub fn new(properties: &AuthenticationProperties) -> Result<Self> {
        if properties.default_roles.iter().any(|r| r.trim().is_empty()) {
            return Err(Error::Configuration("Default roles must not be blank".into()));
        }

        let replacements = properties
            .role_string_replacements
            .iter()
            .map(|r| -> Result<(Regex, String)> {
                let regex = Regex::new(&r.regex).map_err(|e| {
                    Error::Configuration(format!("Invalid role replacement {}: {}", r.regex, e))
                })?;
                Ok((regex, expand_group_references(&r.replacement)?))
            })
            .collect::<Result<Vec<_>>>()?;

        let mappings = properties
            .role_mapping
            .iter()
            .map(|m| (m.source.to_lowercase(), m.target.clone()))
            .collect();

        Ok(Self {
            mappings,
            default_roles: properties.default_roles.clone(),
            case: properties.role_case_transformation,
            replacements,
            prefix: Some(properties.role_prefix.clone()).filter(|p| !p.is_empty()),
        })
    }

    pub fn normalize<I, S>(&self, raw_roles: I) -> Result<BTreeSet<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roles = BTreeSet::new();

        for raw in raw_roles {
            let raw = raw.as_ref();
            if raw.trim().is_empty() {
                return Err(Error::Configuration("Role names must not be blank".into()));
            }
            match self.mapped(raw) {
                Some(target) => roles.insert(target.to_string()),
                None => roles.insert(self.transform(raw)),
            };
        }

        for role in &self.default_roles {
            roles.insert(self.transform(role));
        }

        Ok(roles)
    }

    fn mapped(&self, raw: &str) -> Option<&str> {
        let raw = raw.to_lowercase();
        self.mappings
            .iter()
            .find(|(source, _)| *source == raw)
            .map(|(_, target)| target.as_str())
    }

    fn transform(&self, role: &str) -> String {
        let mut role = match self.case {
            CaseTransformation::None => role.to_string(),
            CaseTransformation::ToUpperCase => role.to_uppercase(),
            CaseTransformation::ToLowerCase => role.to_lowercase(),
        };

        for (regex, replacement) in &self.replacements {
            role = regex.replace_all(&role, replacement.as_str()).into_owned();
        }

        match &self.prefix {
            Some(prefix) if !role.starts_with(prefix.as_str()) => format!("{}{}", prefix, role),
            _ => role,
        }
    }
}

/// Rewrite a `$1` / `\$` style replacement into regex crate syntax.
///
/// `$N` becomes `${N}` and a backslash takes the next character literally.
/// A `$` followed by neither a digit nor `{` is rejected.
fn expand_group_references(replacement: &str) -> Result<String> {
    let mut expanded = String::with_capacity(replacement.len());
    let mut chars = replacement.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('$') => expanded.push_str("$$"),
                Some(escaped) => expanded.push(escaped),
                None => {
                    return Err(Error::Configuration(format!(
                        "Trailing backslash in role replacement {}",
                        replacement
                    )))
                }
            },
            '$' => match chars.peek() {
                Some(d) if d.is_ascii_digit() => {
                    expanded.push_str("${");
                    while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                        expanded.push(d);
                        chars.next();
                    }
                    expanded.push('}');
                }
                Some('{') => expanded.push('$'),
                _ => {
                    return Err(Error::Configuration(format!(
                        "Illegal group reference in role replacement {}",
                        replacement
                    )))
                }
            },
            other => expanded.push(other),
        }
    }

    Ok(expanded)
}
