//! Directory-backed authentication for dirauth
//!
//! Verifies credentials against an LDAP directory, evaluates the account
//! state and turns group membership into normalized roles.

pub mod account;
pub mod async_engine;
pub mod authority;
pub mod bind_dn;
pub mod credential;
pub mod directory;
pub mod email;
pub mod engine;
pub mod password_change;
pub mod remember_me;

pub use account::AccountStatusEvaluator;
pub use async_engine::AsyncAuthenticationEngine;
pub use authority::{AuthorityNormalizer, AuthorityResolver};
pub use bind_dn::UsernameToBindDnConverter;
pub use credential::{password_encoder, CredentialVerifier};
pub use directory::{
    ConnectionInitializer, DirectorySession, InMemoryDirectory, LdapSessionFactory,
    SearchRequest, ServerInfo, SessionFactory,
};
pub use email::EmailUsernameResolver;
pub use engine::AuthenticationEngine;
pub use password_change::PasswordChanger;
pub use remember_me::{RememberMeCookie, RememberMeServices, RememberMeTokenProvider};
