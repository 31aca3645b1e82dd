//! Credential verification

use crate::bind_dn::UsernameToBindDnConverter;
use crate::directory::{ConnectionInitializer, DirectorySession, SessionFactory};
use dirauth_core::config::PasswordScheme;
use dirauth_core::types::DirectoryEntry;
use dirauth_core::{AuthenticationProperties, DirectoryError, Error, Result};
use dirauth_crypto::{LdapPasswordEncoder, PasswordEncoder};
use std::sync::Arc;
use tracing::debug;

/// Encoder for a configured userPassword scheme
pub fn password_encoder(scheme: PasswordScheme) -> Arc<dyn PasswordEncoder> {
    let encoder = match scheme {
        PasswordScheme::Plain => LdapPasswordEncoder::Plain,
        PasswordScheme::Sha => LdapPasswordEncoder::Sha,
        PasswordScheme::Sha256 => LdapPasswordEncoder::Sha256,
        PasswordScheme::Md5 => LdapPasswordEncoder::Md5,
    };
    Arc::new(encoder)
}

/// Proves a presented password, either by binding as the user or by
/// comparing its encoded form with the stored password attribute.
#[derive(Debug, Clone)]
pub enum CredentialVerifier {
    Bind {
        converter: UsernameToBindDnConverter,
    },
    Compare {
        password_attribute: String,
        encoder: Arc<dyn PasswordEncoder>,
    },
}

impl CredentialVerifier {
    pub fn new(
        properties: &AuthenticationProperties,
        encoder: Option<Arc<dyn PasswordEncoder>>,
    ) -> Result<Self> {
        match properties.password_attribute_name() {
            None => Ok(CredentialVerifier::Bind {
                converter: UsernameToBindDnConverter::new(properties),
            }),
            Some(attribute) => {
                let encoder = encoder.ok_or_else(|| {
                    Error::Configuration(format!(
                        "A password encoder is required to compare against {}",
                        attribute
                    ))
                })?;
                Ok(CredentialVerifier::Compare {
                    password_attribute: attribute.to_string(),
                    encoder,
                })
            }
        }
    }

    pub fn is_bind(&self) -> bool {
        matches!(self, CredentialVerifier::Bind { .. })
    }

    /// Open the session the user is looked up through.
    ///
    /// For the bind strategy a successful open already proves the password.
    pub fn open_session(
        &self,
        factory: &dyn SessionFactory,
        username: &str,
        password: &str,
    ) -> Result<Box<dyn DirectorySession>> {
        match self {
            CredentialVerifier::Bind { converter } => {
                // An empty password would turn into an unauthenticated bind
                if password.is_empty() {
                    return Err(Error::BadCredentials);
                }
                let dn = converter.convert(username)?;
                debug!("Binding as {}", dn);
                factory
                    .open(&ConnectionInitializer::Bind {
                        dn,
                        credential: password.to_string(),
                    })
                    .map_err(bind_error)
            }
            CredentialVerifier::Compare { .. } => Ok(factory.open(&ConnectionInitializer::Application)?),
        }
    }

    pub fn verify(
        &self,
        session: &mut dyn DirectorySession,
        entry: &DirectoryEntry,
        password: &str,
    ) -> Result<()> {
        match self {
            CredentialVerifier::Bind { .. } => Ok(()),
            CredentialVerifier::Compare {
                password_attribute,
                encoder,
            } => {
                let encoded = encoder.encode(password);
                if session.compare(entry.dn(), password_attribute, &encoded)? {
                    Ok(())
                } else {
                    debug!("Password compare failed for {}", entry.dn());
                    Err(Error::BadCredentials)
                }
            }
        }
    }
}

fn bind_error(err: DirectoryError) -> Error {
    if err.is_invalid_credentials() {
        Error::BadCredentials
    } else {
        Error::Directory(err)
    }
}
