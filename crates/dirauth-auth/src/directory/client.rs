//! LDAP session factory
//!
//! Opens blocking ldap3 connections per session. Supports LDAP, LDAPS (SSL)
//! and STARTTLS connections.

use super::{ConnectionInitializer, DirectorySession, SearchRequest, SessionFactory, ANY_OBJECT_FILTER};
use dirauth_core::config::SearchScope;
use dirauth_core::error::result_code;
use dirauth_core::types::DirectoryEntry;
use dirauth_core::{ConnectionConfig, DirectoryError};
use ldap3::exop::PasswordModify;
use ldap3::{
    LdapConn, LdapConnSettings, LdapError, LdapResult, Mod, Scope, SearchEntry, SearchOptions,
    SearchResult,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

/// Root DSE details reported by [`LdapSessionFactory::probe`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub server_url: String,
    pub vendor: Option<String>,
    pub version: Option<String>,
    pub naming_contexts: Vec<String>,
    pub supported_ldap_version: Vec<String>,
}

pub struct LdapSessionFactory {
    config: ConnectionConfig,
}

impl LdapSessionFactory {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Create LDAP connection with proper TLS settings
    fn connect(&self) -> Result<LdapConn, DirectoryError> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(Duration::from_secs(self.config.timeout_seconds))
            .set_starttls(self.config.start_tls)
            .set_no_tls_verify(self.config.skip_tls_verify);

        debug!("Connecting to LDAP server: {}", self.config.server_url);

        LdapConn::with_settings(settings, &self.config.server_url).map_err(|e| {
            DirectoryError::with_code(
                result_code::CONNECT_ERROR,
                format!("Failed to connect to {}", self.config.server_url),
            )
            .caused_by(ldap_error(e))
        })
    }

    /// Query the root DSE through an application session
    pub fn probe(&self) -> Result<ServerInfo, DirectoryError> {
        let mut session = self.open(&ConnectionInitializer::Application)?;

        let request = SearchRequest::new("", SearchScope::Base, ANY_OBJECT_FILTER).with_attributes([
            "vendorName",
            "vendorVersion",
            "namingContexts",
            "supportedLDAPVersion",
        ]);
        let root_dse = session.search(&request)?.into_iter().next();

        let info = match root_dse {
            Some(entry) => ServerInfo {
                server_url: self.config.server_url.clone(),
                vendor: entry.first_value("vendorName").map(String::from),
                version: entry.first_value("vendorVersion").map(String::from),
                naming_contexts: entry.values("namingContexts").map(<[String]>::to_vec).unwrap_or_default(),
                supported_ldap_version: entry
                    .values("supportedLDAPVersion")
                    .map(<[String]>::to_vec)
                    .unwrap_or_default(),
            },
            None => ServerInfo {
                server_url: self.config.server_url.clone(),
                vendor: None,
                version: None,
                naming_contexts: vec![],
                supported_ldap_version: vec!["3".to_string()],
            },
        };

        Ok(info)
    }
}

impl SessionFactory for LdapSessionFactory {
    fn open(
        &self,
        initializer: &ConnectionInitializer,
    ) -> Result<Box<dyn DirectorySession>, DirectoryError> {
        let mut session = LdapSession { conn: self.connect()? };

        match initializer {
            ConnectionInitializer::Application => {
                if !self.config.bind_dn.is_empty() {
                    let result = session
                        .conn
                        .simple_bind(&self.config.bind_dn, &self.config.bind_password)
                        .map_err(ldap_error)?;
                    if result.rc != result_code::SUCCESS {
                        return Err(result_error("Service account bind failed", &result));
                    }
                }
            }
            ConnectionInitializer::Bind { dn, credential } => {
                let result = session.conn.simple_bind(dn, credential).map_err(ldap_error)?;
                if result.rc != result_code::SUCCESS {
                    debug!("User bind rejected for {} with code {}", dn, result.rc);
                    return Err(result_error("User bind failed", &result));
                }
            }
        }

        Ok(Box::new(session))
    }
}

struct LdapSession {
    conn: LdapConn,
}

impl DirectorySession for LdapSession {
    fn search(&mut self, request: &SearchRequest) -> Result<Vec<DirectoryEntry>, DirectoryError> {
        let scope = match request.scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        };
        let attrs: Vec<&str> = if request.attributes.is_empty() {
            vec!["*"]
        } else {
            request.attributes.iter().map(String::as_str).collect()
        };
        let limit = request
            .size_limit
            .map(|l| i32::try_from(l).unwrap_or(i32::MAX))
            .unwrap_or(0);

        debug!("Searching {} with filter: {}", request.base_dn, request.filter);

        let SearchResult(entries, result) = self
            .conn
            .with_search_options(SearchOptions::new().sizelimit(limit))
            .search(&request.base_dn, scope, &request.filter, attrs)
            .map_err(ldap_error)?;

        match result.rc {
            result_code::SUCCESS | result_code::SIZE_LIMIT_EXCEEDED => {}
            result_code::NO_SUCH_OBJECT => return Ok(Vec::new()),
            _ => return Err(result_error("Search failed", &result)),
        }

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(|entry| DirectoryEntry::from_parts(entry.dn, entry.attrs, entry.bin_attrs))
            .collect())
    }

    fn bind(&mut self, dn: &str, credential: &str) -> Result<bool, DirectoryError> {
        let result = self.conn.simple_bind(dn, credential).map_err(ldap_error)?;
        match result.rc {
            result_code::SUCCESS => Ok(true),
            result_code::INVALID_CREDENTIALS => Ok(false),
            _ => Err(result_error("Bind failed", &result)),
        }
    }

    fn compare(&mut self, dn: &str, attribute: &str, value: &str) -> Result<bool, DirectoryError> {
        self.conn
            .compare(dn, attribute, value)
            .map_err(ldap_error)?
            .equal()
            .map_err(ldap_error)
    }

    fn modify_password(&mut self, dn: &str, old: &str, new: &str) -> Result<(), DirectoryError> {
        self.conn
            .extended(PasswordModify {
                user_id: Some(dn),
                old_pass: Some(old),
                new_pass: Some(new),
            })
            .map_err(ldap_error)?
            .success()
            .map_err(ldap_error)?;
        Ok(())
    }

    fn replace_binary_attribute(
        &mut self,
        dn: &str,
        attribute: &str,
        value: &[u8],
    ) -> Result<(), DirectoryError> {
        let modification = Mod::Replace(
            attribute.as_bytes().to_vec(),
            HashSet::from([value.to_vec()]),
        );
        self.conn
            .modify(dn, vec![modification])
            .map_err(ldap_error)?
            .success()
            .map_err(ldap_error)?;
        Ok(())
    }
}

impl Drop for LdapSession {
    fn drop(&mut self) {
        if let Err(e) = self.conn.unbind() {
            warn!("LDAP unbind failed: {}", e);
        }
    }
}

fn result_error(context: &str, result: &LdapResult) -> DirectoryError {
    let mut message = format!("{}: resultCode={}", context, result.rc);
    if !result.text.is_empty() {
        message.push_str(&format!(", {}", result.text));
    }
    DirectoryError::with_code(result.rc, message)
}

fn ldap_error(err: LdapError) -> DirectoryError {
    match err {
        LdapError::LdapResult { result } => result_error("Operation failed", &result),
        other => DirectoryError::with_code(result_code::CONNECT_ERROR, other.to_string()),
    }
}
