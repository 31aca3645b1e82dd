//! Async facade over the blocking engine

use crate::engine::AuthenticationEngine;
use dirauth_core::types::AuthenticationResult;
use dirauth_core::{Error, Result};
use std::sync::Arc;

/// Runs whole engine calls on tokio's blocking thread pool
#[derive(Clone)]
pub struct AsyncAuthenticationEngine {
    inner: Arc<AuthenticationEngine>,
}

impl AsyncAuthenticationEngine {
    pub fn new(engine: Arc<AuthenticationEngine>) -> Self {
        Self { inner: engine }
    }

    pub fn engine(&self) -> Arc<AuthenticationEngine> {
        self.inner.clone()
    }

    pub async fn authenticate(
        &self,
        username_or_email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AuthenticationResult> {
        let engine = self.inner.clone();
        let (username, password) = (username_or_email.into(), password.into());
        run_blocking(move || engine.authenticate(&username, &password)).await
    }

    pub async fn change_password(
        &self,
        username: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Result<()> {
        let engine = self.inner.clone();
        let (username, old, new) = (username.into(), old.into(), new.into());
        run_blocking(move || engine.change_password(&username, &old, &new)).await
    }

    pub async fn load_user(&self, username_or_email: impl Into<String>) -> Result<AuthenticationResult> {
        let engine = self.inner.clone();
        let username = username_or_email.into();
        run_blocking(move || engine.load_user(&username)).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::InternalError(format!("Directory task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use dirauth_core::types::DirectoryEntry;
    use dirauth_core::AuthenticationProperties;

    const ALICE: &str = "uid=alice,ou=people,dc=example,dc=org";

    fn engine() -> AsyncAuthenticationEngine {
        let directory = InMemoryDirectory::new().with_entry(
            DirectoryEntry::new(ALICE)
                .with_attribute("objectClass", ["inetOrgPerson"])
                .with_attribute("uid", ["alice"])
                .with_attribute("memberOf", ["cn=admins,ou=groups,dc=example,dc=org"]),
        );
        directory.set_password(ALICE, "password");

        let engine = AuthenticationEngine::new(
            Arc::new(directory),
            AuthenticationProperties {
                user_base_dn: "ou=people,dc=example,dc=org".to_string(),
                ..Default::default()
            },
            None,
        )
        .unwrap();
        AsyncAuthenticationEngine::new(Arc::new(engine))
    }

    #[tokio::test]
    async fn test_authenticate() {
        let engine = engine();

        let result = engine.authenticate("alice", "password").await.unwrap();
        assert!(result.has_role("ROLE_admins"));

        assert!(matches!(
            engine.authenticate("alice", "wrong").await,
            Err(Error::BadCredentials)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_calls() {
        let engine = engine();

        let calls = (0..8).map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.authenticate("alice", "password").await })
        });
        for call in calls.collect::<Vec<_>>() {
            assert!(call.await.unwrap().is_ok());
        }
    }

    #[tokio::test]
    async fn test_change_password_and_load_user() {
        let engine = engine();

        engine.change_password("alice", "password", "changed").await.unwrap();
        assert!(engine.authenticate("alice", "changed").await.is_ok());

        let user = engine.load_user("alice").await.unwrap();
        assert_eq!(user.dn(), ALICE);
    }
}
