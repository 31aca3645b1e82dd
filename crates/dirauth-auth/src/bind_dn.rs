//! Username to bind DN conversion

use crate::directory::escape_dn_value;
use dirauth_core::config::BindDnStrategy;
use dirauth_core::utils::{domain_components, is_descendant_of, non_blank};
use dirauth_core::{AuthenticationProperties, Error, Result};

#[derive(Debug, Clone)]
pub struct UsernameToBindDnConverter {
    strategy: BindDnStrategy,
    user_base_dn: Option<String>,
    rdn_attribute: String,
}

impl UsernameToBindDnConverter {
    pub fn new(properties: &AuthenticationProperties) -> Self {
        Self {
            strategy: properties.bind_dn_strategy,
            user_base_dn: non_blank(Some(properties.user_base_dn.as_str())).map(String::from),
            rdn_attribute: properties.user_rdn_attribute().to_string(),
        }
    }

    pub fn convert(&self, username: &str) -> Result<String> {
        let base = self
            .user_base_dn
            .as_deref()
            .ok_or_else(|| Error::Configuration("User base DN is required to build a bind DN".into()))?;

        // Already a DN below the user base
        if is_descendant_of(username, base) {
            return Ok(username.to_string());
        }

        match self.strategy {
            BindDnStrategy::ByUserRdnAttribute => {
                Ok(format!(
                    "{}={},{}",
                    self.rdn_attribute,
                    escape_dn_value(username),
                    base
                ))
            }
            BindDnStrategy::ByDomainEmail => {
                let components = domain_components(base);
                if components.is_empty() {
                    return Err(Error::Configuration(format!(
                        "User base DN {} has no dc components",
                        base
                    )));
                }
                Ok(format!("{}@{}", username, components.join(".")))
            }
        }
    }
}
