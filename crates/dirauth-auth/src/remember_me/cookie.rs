use crate::engine::AuthenticationEngine;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use dirauth_core::config::RememberMeConfig;
use dirauth_core::types::AuthenticationResult;
use dirauth_core::{Error, Result};
use dirauth_crypto::{hmac_sha256_hex, verify_hmac_sha256_hex};
use std::sync::Arc;
use tracing::debug;

const ALGORITHM: &str = "HMACSHA256";

/// A signed remember-me cookie value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberMeCookie {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and checks remember-me cookies.
///
/// Cookie value: `base64url(username:expiry_millis:HMACSHA256:signature)`
/// where the signature covers `username:expiry_millis:token` and the token
/// is re-derived from the directory on every check.
pub struct RememberMeServices {
    engine: Arc<AuthenticationEngine>,
    key: String,
    validity: Duration,
}

impl RememberMeServices {
    pub fn new(engine: Arc<AuthenticationEngine>, config: &RememberMeConfig) -> Result<Self> {
        let validity = i64::try_from(config.token_validity_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .filter(|d| *d > Duration::zero())
            .filter(|d| Utc::now().checked_add_signed(*d).is_some())
            .ok_or_else(|| Error::Configuration("Invalid remember-me validity".into()))?;

        Ok(Self {
            engine,
            key: config.key()?.to_string(),
            validity,
        })
    }

    pub fn issue(&self, result: &AuthenticationResult) -> Result<RememberMeCookie> {
        self.issue_at(result, Utc::now())
    }

    pub fn issue_at(&self, result: &AuthenticationResult, now: DateTime<Utc>) -> Result<RememberMeCookie> {
        let expires_at = now
            .checked_add_signed(self.validity)
            .ok_or_else(|| Error::Configuration("Remember-me expiry is out of range".into()))?;
        let expiry = expires_at.timestamp_millis();
        let signature = self.sign(result.username(), expiry, result.remember_me_token())?;

        let raw = format!("{}:{}:{}:{}", result.username(), expiry, ALGORITHM, signature);
        Ok(RememberMeCookie {
            value: URL_SAFE_NO_PAD.encode(raw),
            expires_at,
        })
    }

    /// Reload the user behind `cookie` and check it is still entitled to
    /// the cookie
    pub fn validate(&self, cookie: &str) -> Result<AuthenticationResult> {
        self.validate_at(cookie, Utc::now())
    }

    pub fn validate_at(&self, cookie: &str, now: DateTime<Utc>) -> Result<AuthenticationResult> {
        let (username, expiry, signature) = parse_cookie(cookie)?;

        if expiry < now.timestamp_millis() {
            debug!("Remember-me cookie for {} expired", username);
            return Err(Error::BadCredentials);
        }

        let result = self.engine.load_user(&username)?;
        let data = signed_data(&username, expiry, result.remember_me_token());
        let valid = verify_hmac_sha256_hex(self.key.as_bytes(), data.as_bytes(), &signature)
            .map_err(|_| Error::BadCredentials)?;
        if !valid {
            debug!("Remember-me signature mismatch for {}", username);
            return Err(Error::BadCredentials);
        }

        result.account_status().check()?;
        Ok(result)
    }

    fn sign(&self, username: &str, expiry: i64, token: &str) -> Result<String> {
        hmac_sha256_hex(self.key.as_bytes(), signed_data(username, expiry, token).as_bytes())
            .map_err(|e| Error::InternalError(e.to_string()))
    }
}

fn signed_data(username: &str, expiry: i64, token: &str) -> String {
    format!("{}:{}:{}", username, expiry, token)
}

fn parse_cookie(cookie: &str) -> Result<(String, i64, String)> {
    let decoded = URL_SAFE_NO_PAD
        .decode(cookie.trim())
        .map_err(|_| Error::BadCredentials)?;
    let decoded = String::from_utf8(decoded).map_err(|_| Error::BadCredentials)?;

    // usernames may contain ':', the other fields cannot
    let mut parts = decoded.rsplitn(4, ':');
    let (Some(signature), Some(algorithm), Some(expiry), Some(username)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::BadCredentials);
    };

    if algorithm != ALGORITHM || username.is_empty() {
        return Err(Error::BadCredentials);
    }
    let expiry = expiry.parse::<i64>().map_err(|_| Error::BadCredentials)?;

    Ok((username.to_string(), expiry, signature.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use dirauth_core::config::AccountControl;
    use dirauth_core::types::DirectoryEntry;
    use dirauth_core::AuthenticationProperties;

    const JUNIT: &str = "cn=junit,cn=users,dc=example,dc=org";

    fn junit(uac: &str, pwd_last_set: &str) -> DirectoryEntry {
        DirectoryEntry::new(JUNIT)
            .with_attribute("objectClass", ["inetOrgPerson"])
            .with_attribute("uid", ["junit"])
            .with_attribute("userAccountControl", [uac])
            .with_attribute("pwdLastSet", [pwd_last_set])
    }

    fn setup() -> (InMemoryDirectory, RememberMeServices) {
        let directory = InMemoryDirectory::new().with_entry(junit("512", "1"));
        directory.set_password(JUNIT, "password");

        let engine = AuthenticationEngine::new(
            Arc::new(directory.clone()),
            AuthenticationProperties {
                user_base_dn: "cn=users,dc=example,dc=org".to_string(),
                user_rdn_attribute: Some("cn".to_string()),
                account_control: AccountControl::ActiveDirectory,
                password_last_set_attribute: Some("pwdLastSet".to_string()),
                ..Default::default()
            },
            None,
        )
        .unwrap();

        let services = RememberMeServices::new(
            Arc::new(engine),
            &RememberMeConfig {
                key: Some("remember-me-key".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        (directory, services)
    }

    fn login(services: &RememberMeServices) -> AuthenticationResult {
        services.engine.authenticate("junit", "password").unwrap()
    }

    #[test]
    fn test_issue_and_validate() {
        let (_directory, services) = setup();
        let cookie = services.issue(&login(&services)).unwrap();

        let result = services.validate(&cookie.value).unwrap();
        assert_eq!(result.username(), "junit");
    }

    #[test]
    fn test_expired_cookie() {
        let (_directory, services) = setup();
        let now = Utc::now();
        let cookie = services.issue_at(&login(&services), now).unwrap();

        let later = now + Duration::days(15);
        assert!(matches!(
            services.validate_at(&cookie.value, later),
            Err(Error::BadCredentials)
        ));
    }

    #[test]
    fn test_password_rotation_invalidates_cookie() {
        let (directory, services) = setup();
        let cookie = services.issue(&login(&services)).unwrap();

        directory.add_entry(junit("512", "2"));
        assert!(matches!(
            services.validate(&cookie.value),
            Err(Error::BadCredentials)
        ));
    }

    #[test]
    fn test_disabled_account_invalidates_cookie() {
        let (directory, services) = setup();
        let cookie = services.issue(&login(&services)).unwrap();

        directory.add_entry(junit("514", "1"));
        assert!(services.validate(&cookie.value).is_err());
    }

    #[test]
    fn test_tampered_cookie() {
        let (_directory, services) = setup();
        let cookie = services.issue(&login(&services)).unwrap();

        let raw = String::from_utf8(URL_SAFE_NO_PAD.decode(&cookie.value).unwrap()).unwrap();
        let forged = URL_SAFE_NO_PAD.encode(raw.replacen("junit", "admin", 1));
        assert!(services.validate(&forged).is_err());

        assert!(matches!(services.validate("not a cookie"), Err(Error::BadCredentials)));
        let wrong_algorithm = URL_SAFE_NO_PAD.encode("junit:99999999999999:MD5:abcd");
        assert!(matches!(
            services.validate(&wrong_algorithm),
            Err(Error::BadCredentials)
        ));
    }

    #[test]
    fn test_out_of_range_validity() {
        let (_directory, services) = setup();
        let engine = services.engine.clone();

        let too_long = RememberMeServices::new(
            engine,
            &RememberMeConfig {
                key: Some("remember-me-key".to_string()),
                token_validity_seconds: 9_000_000_000_000_000,
            },
        );
        assert!(matches!(too_long, Err(Error::Configuration(_))));

        let result = login(&services);
        assert!(matches!(
            services.issue_at(&result, DateTime::<Utc>::MAX_UTC),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_key_is_required() {
        let engine = AuthenticationEngine::new(
            Arc::new(InMemoryDirectory::new()),
            AuthenticationProperties {
                user_base_dn: "cn=users,dc=example,dc=org".to_string(),
                ..Default::default()
            },
            None,
        )
        .unwrap();

        assert!(matches!(
            RememberMeServices::new(Arc::new(engine), &RememberMeConfig::default()),
            Err(Error::Configuration(_))
        ));
    }
}
