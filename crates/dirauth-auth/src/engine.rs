//! Authentication engine
//!
//! One pass per call, no retries:
//! 1. resolve the username (email lookup)
//! 2. open a session, binding as the user for the bind strategy
//! 3. fetch the user entry
//! 4. verify the password
//! 5. gate on the account status
//! 6. resolve and normalize roles

use crate::account::AccountStatusEvaluator;
use crate::authority::{AuthorityNormalizer, AuthorityResolver};
use crate::credential::{password_encoder, CredentialVerifier};
use crate::directory::{
    escape_filter_value, ConnectionInitializer, DirectorySession, SearchRequest, SessionFactory,
    ANY_OBJECT_FILTER,
};
use crate::email::EmailUsernameResolver;
use crate::password_change::PasswordChanger;
use crate::remember_me::RememberMeTokenProvider;
use dirauth_core::config::SearchScope;
use dirauth_core::types::{AccountStatus, AuthenticationResult, DirectoryEntry};
use dirauth_core::utils::is_descendant_of;
use dirauth_core::{
    AuthenticationProperties, DirauthConfig, Error, Result, USERNAME_PLACEHOLDER,
};
use dirauth_crypto::PasswordEncoder;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct AuthenticationEngine {
    factory: Arc<dyn SessionFactory>,
    properties: AuthenticationProperties,
    user_filter: String,
    verifier: CredentialVerifier,
    changer: PasswordChanger,
    evaluator: AccountStatusEvaluator,
    resolver: AuthorityResolver,
    normalizer: AuthorityNormalizer,
    tokens: RememberMeTokenProvider,
    email: EmailUsernameResolver,
}

impl AuthenticationEngine {
    /// Validate `properties` and build every component.
    ///
    /// Fails with a configuration error when the compare strategy is
    /// selected without an encoder.
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        properties: AuthenticationProperties,
        encoder: Option<Arc<dyn PasswordEncoder>>,
    ) -> Result<Self> {
        properties.validate()?;

        let user_filter = properties
            .user_find_one_filter()
            .ok_or_else(|| Error::Configuration("User filter cannot be built".into()))?;

        Ok(Self {
            verifier: CredentialVerifier::new(&properties, encoder)?,
            changer: PasswordChanger::new(&properties),
            evaluator: AccountStatusEvaluator::from(properties.account_control),
            resolver: AuthorityResolver::new(&properties),
            normalizer: AuthorityNormalizer::new(&properties)?,
            tokens: RememberMeTokenProvider::new(&properties),
            email: EmailUsernameResolver::new(&properties),
            user_filter,
            properties,
            factory,
        })
    }

    /// Build from a loaded configuration, taking the encoder from
    /// `[encoder]`
    pub fn from_config(factory: Arc<dyn SessionFactory>, config: &DirauthConfig) -> Result<Self> {
        let encoder = config.encoder.scheme.map(password_encoder);
        Self::new(factory, config.authentication.clone(), encoder)
    }

    pub fn properties(&self) -> &AuthenticationProperties {
        &self.properties
    }

    pub fn authenticate(&self, username_or_email: &str, password: &str) -> Result<AuthenticationResult> {
        let username = self.email.resolve(self.factory.as_ref(), username_or_email)?;
        debug!("Authenticating {}", username);

        let result = self
            .authenticate_resolved(&username, password)
            .map_err(|e| {
                log_failure(&username, &e);
                e
            })?;

        info!(
            username = result.username(),
            roles = result.roles().len(),
            "Authentication succeeded"
        );
        Ok(result)
    }

    fn authenticate_resolved(&self, username: &str, password: &str) -> Result<AuthenticationResult> {
        let mut session = self
            .verifier
            .open_session(self.factory.as_ref(), username, password)?;
        let entry = self.fetch_user(session.as_mut(), username)?;
        self.verifier.verify(session.as_mut(), &entry, password)?;

        let status = self.evaluator.evaluate(&entry);
        status.check()?;

        self.assemble(session.as_mut(), username, entry, status)
    }

    /// Verify `old` the same way [`authenticate`](Self::authenticate) does,
    /// then replace it with `new` on the same session, through the password
    /// modify operation or, for Active Directory, `unicodePwd`
    pub fn change_password(&self, username: &str, old: &str, new: &str) -> Result<()> {
        let username = self.email.resolve(self.factory.as_ref(), username)?;

        let mut session = self
            .verifier
            .open_session(self.factory.as_ref(), &username, old)?;
        let entry = self.fetch_user(session.as_mut(), &username)?;
        self.verifier.verify(session.as_mut(), &entry, old)?;

        self.changer.change(session.as_mut(), entry.dn(), old, new)?;
        info!("Password changed for {}", entry.dn());
        Ok(())
    }

    /// Look a user up through the application session without a password.
    ///
    /// The account status is evaluated but not enforced.
    pub fn load_user(&self, username_or_email: &str) -> Result<AuthenticationResult> {
        let username = self.email.resolve(self.factory.as_ref(), username_or_email)?;

        let mut session = self.factory.open(&ConnectionInitializer::Application)?;
        let entry = self.fetch_user(session.as_mut(), &username)?;
        let status = self.evaluator.evaluate(&entry);

        self.assemble(session.as_mut(), &username, entry, status)
    }

    fn is_user_dn(&self, username: &str) -> bool {
        username.contains('=') && is_descendant_of(username, &self.properties.user_base_dn)
    }

    fn fetch_user(&self, session: &mut dyn DirectorySession, username: &str) -> Result<DirectoryEntry> {
        let request = if self.is_user_dn(username) {
            SearchRequest::new(username, SearchScope::Base, ANY_OBJECT_FILTER)
        } else {
            let filter = self
                .user_filter
                .replace(USERNAME_PLACEHOLDER, &escape_filter_value(username));
            SearchRequest::new(
                &self.properties.user_base_dn,
                self.properties.user_search_scope,
                filter,
            )
        };

        session
            .search(&request.with_size_limit(1))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::UserNotFound(username.to_string()))
    }

    fn assemble(
        &self,
        session: &mut dyn DirectorySession,
        username: &str,
        entry: DirectoryEntry,
        status: AccountStatus,
    ) -> Result<AuthenticationResult> {
        let canonical = entry
            .first_value(&self.properties.username_attribute)
            .unwrap_or(username)
            .to_string();

        let raw_roles = self.resolver.resolve(&entry, &canonical, session)?;
        let roles = self.normalizer.normalize(&raw_roles)?;
        let token = self.tokens.derive(&entry);

        Ok(AuthenticationResult::new(
            canonical,
            roles,
            entry,
            status,
            token,
            self.properties.profile_attributes(),
        ))
    }
}

fn log_failure(username: &str, error: &Error) {
    if error.is_invalid_login() || error.is_account_state() {
        info!(username, code = error.code(), "Authentication rejected");
    } else {
        warn!(username, "Authentication failed: {}", error);
    }
}
