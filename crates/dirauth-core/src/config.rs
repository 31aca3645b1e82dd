//! Configuration for dirauth

use crate::types::ProfileAttributes;
use crate::utils::non_blank;
use crate::{Error, Result, USERNAME_PLACEHOLDER};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirauthConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub authentication: AuthenticationProperties,

    #[serde(default)]
    pub encoder: EncoderConfig,

    #[serde(default)]
    pub remember_me: RememberMeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DirauthConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Configuration(format!("Failed to read config {}: {}", path, e)))?;

        let config = Self::from_toml(&content)?;
        debug!("Loaded configuration from {}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))?;
        config.authentication = config.authentication.with_template_applied();
        Ok(config)
    }

    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("DIRAUTH_LDAP_URL") {
            config.connection.server_url = url;
        }
        if std::env::var("DIRAUTH_START_TLS").map(|v| v == "true").unwrap_or(false) {
            config.connection.start_tls = true;
        }
        if let Ok(dn) = std::env::var("DIRAUTH_BIND_DN") {
            config.connection.bind_dn = dn;
        }
        if let Ok(password) = std::env::var("DIRAUTH_BIND_PASSWORD") {
            config.connection.bind_password = password;
        }
        if let Ok(base) = std::env::var("DIRAUTH_USER_BASE_DN") {
            config.authentication.user_base_dn = base;
        }
        if let Ok(base) = std::env::var("DIRAUTH_GROUP_BASE_DN") {
            config.authentication.group_base_dn = Some(base);
        }
        if let Ok(attribute) = std::env::var("DIRAUTH_PASSWORD_ATTRIBUTE") {
            config.authentication.password_attribute = Some(attribute);
        }
        if let Ok(template) = std::env::var("DIRAUTH_TEMPLATE") {
            config.authentication.template = DirectoryTemplate::parse(&template);
        }
        if let Ok(scheme) = std::env::var("DIRAUTH_PASSWORD_SCHEME") {
            config.encoder.scheme = PasswordScheme::parse(&scheme);
        }
        if let Ok(key) = std::env::var("DIRAUTH_REMEMBER_ME_KEY") {
            config.remember_me.key = Some(key);
        }
        if let Ok(level) = std::env::var("DIRAUTH_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("DIRAUTH_LOG_FORMAT") {
            config.logging.format = format;
        }

        config.authentication = config.authentication.with_template_applied();
        config
    }

    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;
        self.authentication.validate()?;
        Ok(())
    }
}

// ============================================================================
// Connection Configuration
// ============================================================================

/// Transport settings for the directory client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Directory URL (ldap://, ldaps:// or ldapi://)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Upgrade plain connections with STARTTLS
    #[serde(default)]
    pub start_tls: bool,

    /// Skip TLS certificate verification (not recommended for production)
    #[serde(default)]
    pub skip_tls_verify: bool,

    /// Service account used by application sessions, empty for anonymous
    #[serde(default)]
    pub bind_dn: String,

    #[serde(default)]
    pub bind_password: String,

    /// Connect and operation timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_server_url() -> String {
    "ldap://localhost:389".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            start_tls: false,
            skip_tls_verify: false,
            bind_dn: String::new(),
            bind_password: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl ConnectionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.server_url.is_empty() {
            return Err(Error::Configuration("Server URL is required".into()));
        }

        if !["ldap://", "ldaps://", "ldapi://"]
            .iter()
            .any(|scheme| self.server_url.starts_with(scheme))
        {
            return Err(Error::Configuration(
                "Server URL must start with ldap://, ldaps:// or ldapi://".into(),
            ));
        }

        if self.start_tls && self.server_url.starts_with("ldaps://") {
            return Err(Error::Configuration(
                "STARTTLS cannot be combined with an ldaps:// URL".into(),
            ));
        }

        if !self.bind_dn.is_empty() && self.bind_password.is_empty() {
            return Err(Error::Configuration(
                "Bind password is required when a bind DN is set".into(),
            ));
        }

        if self.timeout_seconds == 0 {
            return Err(Error::Configuration("Timeout must be positive".into()));
        }

        Ok(())
    }
}

// ============================================================================
// Authentication Properties
// ============================================================================

/// Directory layout and role normalization settings of one engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthenticationProperties {
    /// Preset applied over values left at their defaults
    pub template: Option<DirectoryTemplate>,

    pub bind_dn_strategy: BindDnStrategy,

    /// Example: "ou=people,dc=example,dc=org"
    pub user_base_dn: String,
    pub user_object_class: String,
    pub username_attribute: String,

    /// Defaults to the username attribute
    pub user_rdn_attribute: Option<String>,

    /// Selects the compare strategy when set; bind otherwise
    pub password_attribute: Option<String>,

    /// Binds remember-me tokens to password rotation when set
    pub password_last_set_attribute: Option<String>,

    /// Use {username} as placeholder. Generated from object class and
    /// username attribute when unset.
    pub user_find_one_filter: Option<String>,
    pub user_search_scope: SearchScope,

    pub first_name_attribute: Option<String>,
    pub last_name_attribute: Option<String>,
    pub email_attribute: Option<String>,

    pub account_control: AccountControl,

    pub group_fetch_strategy: GroupFetchStrategy,

    /// Multi-valued user attribute holding group DNs
    pub member_attribute: String,

    pub group_base_dn: Option<String>,
    pub group_search_scope: SearchScope,
    pub group_object_class: String,
    pub group_id_attribute: Option<String>,
    pub group_member_attribute: String,

    /// Member value template, e.g. "uid=${username},ou=people,dc=example,dc=org".
    /// The user DN is used when unset.
    pub group_member_format: Option<String>,

    pub role_mapping: Vec<RoleMapping>,
    pub default_roles: Vec<String>,
    pub role_prefix: String,
    pub role_case_transformation: CaseTransformation,
    pub role_string_replacements: Vec<StringReplacement>,

    pub email_lookup: EmailLookup,
}

impl Default for AuthenticationProperties {
    fn default() -> Self {
        Self {
            template: None,
            bind_dn_strategy: BindDnStrategy::ByUserRdnAttribute,
            user_base_dn: String::new(),
            user_object_class: "inetOrgPerson".to_string(),
            username_attribute: "uid".to_string(),
            user_rdn_attribute: None,
            password_attribute: None,
            password_last_set_attribute: None,
            user_find_one_filter: None,
            user_search_scope: SearchScope::OneLevel,
            first_name_attribute: Some("givenName".to_string()),
            last_name_attribute: Some("sn".to_string()),
            email_attribute: Some("mail".to_string()),
            account_control: AccountControl::None,
            group_fetch_strategy: GroupFetchStrategy::UserContainsGroups,
            member_attribute: "memberOf".to_string(),
            group_base_dn: None,
            group_search_scope: SearchScope::OneLevel,
            group_object_class: "groupOfUniqueNames".to_string(),
            group_id_attribute: None,
            group_member_attribute: "uniqueMember".to_string(),
            group_member_format: None,
            role_mapping: Vec::new(),
            default_roles: Vec::new(),
            role_prefix: crate::DEFAULT_ROLE_PREFIX.to_string(),
            role_case_transformation: CaseTransformation::None,
            role_string_replacements: Vec::new(),
            email_lookup: EmailLookup::Tolerant,
        }
    }
}

impl AuthenticationProperties {
    pub fn user_rdn_attribute(&self) -> &str {
        non_blank(self.user_rdn_attribute.as_deref()).unwrap_or(&self.username_attribute)
    }

    /// Filter locating one user, with a {username} placeholder
    pub fn user_find_one_filter(&self) -> Option<String> {
        if let Some(filter) = non_blank(self.user_find_one_filter.as_deref()) {
            return Some(filter.to_string());
        }
        if self.user_object_class.trim().is_empty() || self.username_attribute.trim().is_empty()
        {
            return None;
        }
        Some(format!(
            "(&(objectClass={})({}={}))",
            self.user_object_class, self.username_attribute, USERNAME_PLACEHOLDER
        ))
    }

    /// Bind as the user unless a password attribute is configured
    pub fn bind_with_authentication(&self) -> bool {
        self.password_attribute_name().is_none()
    }

    pub fn password_attribute_name(&self) -> Option<&str> {
        non_blank(self.password_attribute.as_deref())
    }

    pub fn password_last_set_attribute_name(&self) -> Option<&str> {
        non_blank(self.password_last_set_attribute.as_deref())
    }

    pub fn group_id_attribute_name(&self) -> Option<&str> {
        non_blank(self.group_id_attribute.as_deref())
    }

    pub fn group_member_format_value(&self) -> Option<&str> {
        non_blank(self.group_member_format.as_deref())
    }

    pub fn profile_attributes(&self) -> ProfileAttributes {
        ProfileAttributes {
            first_name: non_blank(self.first_name_attribute.as_deref()).map(String::from),
            last_name: non_blank(self.last_name_attribute.as_deref()).map(String::from),
            email: non_blank(self.email_attribute.as_deref()).map(String::from),
        }
    }

    /// Replace every value still at its default with the template's preset
    pub fn with_template_applied(mut self) -> Self {
        let Some(template) = self.template else {
            return self;
        };
        let defaults = Self::default();
        let preset = template.properties();

        keep_or_preset(&mut self.bind_dn_strategy, &defaults.bind_dn_strategy, preset.bind_dn_strategy);
        keep_or_preset(&mut self.user_object_class, &defaults.user_object_class, preset.user_object_class);
        keep_or_preset(&mut self.username_attribute, &defaults.username_attribute, preset.username_attribute);
        keep_or_preset(&mut self.user_rdn_attribute, &defaults.user_rdn_attribute, preset.user_rdn_attribute);
        keep_or_preset(&mut self.password_attribute, &defaults.password_attribute, preset.password_attribute);
        keep_or_preset(
            &mut self.password_last_set_attribute,
            &defaults.password_last_set_attribute,
            preset.password_last_set_attribute,
        );
        keep_or_preset(&mut self.user_search_scope, &defaults.user_search_scope, preset.user_search_scope);
        keep_or_preset(&mut self.first_name_attribute, &defaults.first_name_attribute, preset.first_name_attribute);
        keep_or_preset(&mut self.last_name_attribute, &defaults.last_name_attribute, preset.last_name_attribute);
        keep_or_preset(&mut self.email_attribute, &defaults.email_attribute, preset.email_attribute);
        keep_or_preset(&mut self.account_control, &defaults.account_control, preset.account_control);
        keep_or_preset(&mut self.group_fetch_strategy, &defaults.group_fetch_strategy, preset.group_fetch_strategy);
        keep_or_preset(&mut self.member_attribute, &defaults.member_attribute, preset.member_attribute);
        keep_or_preset(&mut self.group_search_scope, &defaults.group_search_scope, preset.group_search_scope);
        keep_or_preset(&mut self.group_object_class, &defaults.group_object_class, preset.group_object_class);
        keep_or_preset(&mut self.group_id_attribute, &defaults.group_id_attribute, preset.group_id_attribute);
        keep_or_preset(
            &mut self.group_member_attribute,
            &defaults.group_member_attribute,
            preset.group_member_attribute,
        );

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.user_base_dn.trim().is_empty() {
            return Err(Error::Configuration("User base DN is required".into()));
        }

        if self.username_attribute.trim().is_empty() {
            return Err(Error::Configuration("Username attribute is required".into()));
        }

        match self.user_find_one_filter() {
            None => {
                return Err(Error::Configuration(
                    "Either a user filter or user object class and username attribute are required"
                        .into(),
                ))
            }
            Some(filter) if !filter.contains(USERNAME_PLACEHOLDER) => {
                return Err(Error::Configuration(format!(
                    "User filter must contain {} placeholder",
                    USERNAME_PLACEHOLDER
                )))
            }
            Some(_) => {}
        }

        match self.group_fetch_strategy {
            GroupFetchStrategy::None => {}
            GroupFetchStrategy::UserContainsGroups => {
                if self.member_attribute.trim().is_empty() {
                    return Err(Error::Configuration(
                        "Member attribute is required to read groups from the user".into(),
                    ));
                }
            }
            GroupFetchStrategy::GroupContainsUsers => {
                if non_blank(self.group_base_dn.as_deref()).is_none() {
                    return Err(Error::Configuration(
                        "Group base DN is required to search groups".into(),
                    ));
                }
                if self.group_object_class.trim().is_empty()
                    || self.group_member_attribute.trim().is_empty()
                {
                    return Err(Error::Configuration(
                        "Group object class and group member attribute are required".into(),
                    ));
                }
            }
        }

        if self.role_mapping.iter().any(|m| m.source.trim().is_empty()) {
            return Err(Error::Configuration("Role mapping source must not be blank".into()));
        }

        Ok(())
    }
}

fn keep_or_preset<T: PartialEq>(value: &mut T, default: &T, preset: T) {
    if value == default {
        *value = preset;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    Base,
    #[default]
    OneLevel,
    Subtree,
}

/// How a username becomes the DN of a user bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BindDnStrategy {
    /// "<rdn attribute>=<username>,<user base dn>"
    #[default]
    ByUserRdnAttribute,
    /// "<username>@<domain from dc components>"
    ByDomainEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountControl {
    /// The directory has no account control concept
    #[default]
    None,
    /// userAccountControl bitmask and accountExpires timestamp
    ActiveDirectory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GroupFetchStrategy {
    None,
    #[default]
    UserContainsGroups,
    GroupContainsUsers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaseTransformation {
    #[default]
    None,
    ToUpperCase,
    ToLowerCase,
}

/// Behaviour of the email to username lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmailLookup {
    Disabled,
    /// Directory errors disable the lookup for the call
    #[default]
    Tolerant,
    /// Directory errors fail the authentication
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMapping {
    pub source: String,
    pub target: String,
}

impl RoleMapping {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Regex replacement applied to role names.
///
/// `replacement` refers to capture groups as `$1` or `${name}`; `\$` is a
/// literal dollar sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringReplacement {
    pub regex: String,
    pub replacement: String,
}

impl StringReplacement {
    pub fn new(regex: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            replacement: replacement.into(),
        }
    }
}

// ============================================================================
// Directory Templates
// ============================================================================

/// Preset property bundles for common directory layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryTemplate {
    ActiveDirectory,
    OpenLdap,
    UserContainsGroups,
    GroupContainsUsers,
}

impl DirectoryTemplate {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "active_directory" | "ad" => Some(Self::ActiveDirectory),
            "open_ldap" | "openldap" => Some(Self::OpenLdap),
            "user_contains_groups" => Some(Self::UserContainsGroups),
            "group_contains_users" => Some(Self::GroupContainsUsers),
            _ => None,
        }
    }

    pub fn properties(self) -> AuthenticationProperties {
        let mut props = AuthenticationProperties {
            template: Some(self),
            ..Default::default()
        };

        match self {
            DirectoryTemplate::ActiveDirectory => {
                props.bind_dn_strategy = BindDnStrategy::ByDomainEmail;
                props.user_object_class = "user".to_string();
                props.username_attribute = "sAMAccountName".to_string();
                props.user_rdn_attribute = Some("cn".to_string());
                props.password_last_set_attribute = Some("pwdLastSet".to_string());
                props.user_search_scope = SearchScope::Subtree;
                props.account_control = AccountControl::ActiveDirectory;
                props.group_fetch_strategy = GroupFetchStrategy::UserContainsGroups;
                props.member_attribute = "memberOf".to_string();
                props.group_object_class = "group".to_string();
                props.group_member_attribute = "member".to_string();
            }
            DirectoryTemplate::OpenLdap => {
                props.user_object_class = "inetOrgPerson".to_string();
                props.username_attribute = "uid".to_string();
                props.group_fetch_strategy = GroupFetchStrategy::UserContainsGroups;
                props.member_attribute = "memberOf".to_string();
            }
            DirectoryTemplate::UserContainsGroups => {
                props.group_fetch_strategy = GroupFetchStrategy::UserContainsGroups;
            }
            DirectoryTemplate::GroupContainsUsers => {
                props.group_fetch_strategy = GroupFetchStrategy::GroupContainsUsers;
                props.group_object_class = "groupOfUniqueNames".to_string();
                props.group_member_attribute = "uniqueMember".to_string();
            }
        }

        props
    }
}

// ============================================================================
// Encoder, Remember-me and Logging
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// Scheme used to encode passwords for the compare strategy
    #[serde(default)]
    pub scheme: Option<PasswordScheme>,
}

/// LDAP userPassword storage schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PasswordScheme {
    Plain,
    Sha,
    Sha256,
    Md5,
}

impl PasswordScheme {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().trim_matches(|c| c == '{' || c == '}').to_lowercase().as_str() {
            "plain" | "cleartext" => Some(Self::Plain),
            "sha" | "sha1" => Some(Self::Sha),
            "sha256" => Some(Self::Sha256),
            "md5" => Some(Self::Md5),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RememberMeConfig {
    /// Secret the cookie signatures are keyed with
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default = "default_token_validity")]
    pub token_validity_seconds: u64,
}

fn default_token_validity() -> u64 {
    crate::DEFAULT_REMEMBER_ME_VALIDITY_SECS
}

impl Default for RememberMeConfig {
    fn default() -> Self {
        Self {
            key: None,
            token_validity_seconds: default_token_validity(),
        }
    }
}

impl RememberMeConfig {
    pub fn key(&self) -> Result<&str> {
        non_blank(self.key.as_deref())
            .ok_or_else(|| Error::Configuration("Remember-me key is required".into()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props() -> AuthenticationProperties {
        AuthenticationProperties {
            user_base_dn: "ou=people,dc=example,dc=org".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_generated_user_filter() {
        assert_eq!(
            props().user_find_one_filter().unwrap(),
            "(&(objectClass=inetOrgPerson)(uid={username}))"
        );

        let explicit = AuthenticationProperties {
            user_find_one_filter: Some("(cn={username})".to_string()),
            ..props()
        };
        assert_eq!(explicit.user_find_one_filter().unwrap(), "(cn={username})");
    }

    #[test]
    fn test_rdn_attribute_defaults_to_username_attribute() {
        assert_eq!(props().user_rdn_attribute(), "uid");

        let custom = AuthenticationProperties {
            user_rdn_attribute: Some("cn".to_string()),
            ..props()
        };
        assert_eq!(custom.user_rdn_attribute(), "cn");
    }

    #[test]
    fn test_strategy_selection() {
        assert!(props().bind_with_authentication());

        let blank = AuthenticationProperties {
            password_attribute: Some("  ".to_string()),
            ..props()
        };
        assert!(blank.bind_with_authentication());

        let compare = AuthenticationProperties {
            password_attribute: Some("userPassword".to_string()),
            ..props()
        };
        assert!(!compare.bind_with_authentication());
    }

    #[test]
    fn test_validation() {
        assert!(props().validate().is_ok());
        assert!(AuthenticationProperties::default().validate().is_err());

        let no_group_base = AuthenticationProperties {
            group_fetch_strategy: GroupFetchStrategy::GroupContainsUsers,
            ..props()
        };
        assert!(matches!(no_group_base.validate(), Err(Error::Configuration(_))));

        let bad_filter = AuthenticationProperties {
            user_find_one_filter: Some("(uid=alice)".to_string()),
            ..props()
        };
        assert!(bad_filter.validate().is_err());
    }

    #[test]
    fn test_active_directory_template() {
        let props = AuthenticationProperties {
            template: Some(DirectoryTemplate::ActiveDirectory),
            user_base_dn: "cn=users,dc=example,dc=org".to_string(),
            email_attribute: Some("userPrincipalName".to_string()),
            ..Default::default()
        }
        .with_template_applied();

        assert_eq!(props.username_attribute, "sAMAccountName");
        assert_eq!(props.bind_dn_strategy, BindDnStrategy::ByDomainEmail);
        assert_eq!(props.account_control, AccountControl::ActiveDirectory);
        assert_eq!(props.password_last_set_attribute_name(), Some("pwdLastSet"));
        // explicit values win over the preset
        assert_eq!(props.email_attribute.as_deref(), Some("userPrincipalName"));
    }

    #[test]
    fn test_connection_validation() {
        let mut config = ConnectionConfig::default();
        assert!(config.validate().is_ok());

        config.server_url = "http://localhost".to_string();
        assert!(config.validate().is_err());

        config.server_url = "ldaps://ldap.example.org:636".to_string();
        config.start_tls = true;
        assert!(config.validate().is_err());

        config.start_tls = false;
        config.bind_dn = "cn=admin,dc=example,dc=org".to_string();
        assert!(config.validate().is_err());

        config.bind_password = "secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = DirauthConfig::from_toml(
            r#"
            [connection]
            server_url = "ldap://ldap.example.org:389"
            bind_dn = "cn=admin,dc=example,dc=org"
            bind_password = "secret"

            [authentication]
            template = "group_contains_users"
            user_base_dn = "ou=people,dc=example,dc=org"
            group_base_dn = "ou=groups,dc=example,dc=org"
            role_case_transformation = "to_upper_case"
            default_roles = ["ROLE_USER"]

            [[authentication.role_string_replacements]]
            regex = "[-]"
            replacement = "_"

            [encoder]
            scheme = "sha"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.authentication.group_fetch_strategy,
            GroupFetchStrategy::GroupContainsUsers
        );
        assert_eq!(
            config.authentication.role_case_transformation,
            CaseTransformation::ToUpperCase
        );
        assert_eq!(config.authentication.role_string_replacements.len(), 1);
        assert_eq!(config.authentication.role_prefix, "ROLE_");
        assert_eq!(config.encoder.scheme, Some(PasswordScheme::Sha));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(DirectoryTemplate::parse("active-directory"), Some(DirectoryTemplate::ActiveDirectory));
        assert_eq!(DirectoryTemplate::parse("unknown"), None);
        assert_eq!(PasswordScheme::parse("{SHA}"), Some(PasswordScheme::Sha));
        assert_eq!(PasswordScheme::parse("sha256"), Some(PasswordScheme::Sha256));
    }
}
