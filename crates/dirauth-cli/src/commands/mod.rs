//! CLI command implementations

pub mod authenticate;
pub mod change_password;
pub mod check_config;
pub mod lookup;
pub mod status;

use crate::OutputFormat;
use anyhow::Result;
use colored::Colorize;
use dirauth_auth::{AsyncAuthenticationEngine, AuthenticationEngine, LdapSessionFactory};
use dirauth_core::config::DirauthConfig;
use dirauth_core::types::AuthenticationSummary;
use std::sync::Arc;

/// Context passed to all commands
pub struct CommandContext {
    pub config: DirauthConfig,
    pub output_format: OutputFormat,
}

impl CommandContext {
    pub fn new(config: DirauthConfig, output_format: OutputFormat) -> Self {
        Self {
            config,
            output_format,
        }
    }

    /// Check if output should be JSON
    pub fn is_json(&self) -> bool {
        matches!(self.output_format, OutputFormat::Json)
    }

    pub fn session_factory(&self) -> LdapSessionFactory {
        LdapSessionFactory::new(self.config.connection.clone())
    }

    /// Engine over a live directory connection
    pub fn engine(&self) -> Result<AsyncAuthenticationEngine> {
        let engine = AuthenticationEngine::from_config(Arc::new(self.session_factory()), &self.config)?;
        Ok(AsyncAuthenticationEngine::new(Arc::new(engine)))
    }
}

/// Print a user summary as text or JSON
pub fn print_summary(ctx: &CommandContext, summary: &AuthenticationSummary) -> Result<()> {
    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("{}", summary.username.bold());
    println!("  {:<12} {}", "DN:".cyan(), summary.dn);
    if let Some(first_name) = &summary.first_name {
        println!("  {:<12} {}", "First name:".cyan(), first_name);
    }
    if let Some(last_name) = &summary.last_name {
        println!("  {:<12} {}", "Last name:".cyan(), last_name);
    }
    if let Some(email) = &summary.email {
        println!("  {:<12} {}", "Email:".cyan(), email);
    }

    let status = summary.account_status;
    println!(
        "  {:<12} enabled={} non_locked={} non_expired={} credentials_non_expired={}",
        "Account:".cyan(),
        status.enabled,
        status.account_non_locked,
        status.account_non_expired,
        status.credentials_non_expired
    );

    println!("  {}", "Roles:".cyan());
    if summary.roles.is_empty() {
        println!("    (none)");
    }
    for role in &summary.roles {
        println!("    {}", role);
    }

    Ok(())
}
