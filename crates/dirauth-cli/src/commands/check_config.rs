//! check-config command - validate the effective configuration

use super::CommandContext;
use anyhow::Result;
use colored::Colorize;
use dirauth_core::config::DirauthConfig;
use dirauth_core::utils::non_blank;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ConfigReport {
    server_url: String,
    start_tls: bool,
    service_account: Option<String>,
    user_base_dn: String,
    user_filter: Option<String>,
    bind_with_authentication: bool,
    group_fetch_strategy: String,
    email_lookup: String,
    remember_me: bool,
}

impl ConfigReport {
    fn new(config: &DirauthConfig) -> Self {
        let auth = &config.authentication;
        Self {
            server_url: config.connection.server_url.clone(),
            start_tls: config.connection.start_tls,
            service_account: non_blank(Some(config.connection.bind_dn.as_str())).map(String::from),
            user_base_dn: auth.user_base_dn.clone(),
            user_filter: auth.user_find_one_filter(),
            bind_with_authentication: auth.bind_with_authentication(),
            group_fetch_strategy: format!("{:?}", auth.group_fetch_strategy),
            email_lookup: format!("{:?}", auth.email_lookup),
            remember_me: config.remember_me.key().is_ok(),
        }
    }
}

pub fn execute(ctx: &CommandContext) -> Result<()> {
    ctx.config.validate()?;
    ctx.engine()?;
    let report = ConfigReport::new(&ctx.config);

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Configuration OK".green().bold());
    println!("  {:<26} {}", "Server URL:".cyan(), report.server_url);
    println!("  {:<26} {}", "STARTTLS:".cyan(), report.start_tls);
    println!(
        "  {:<26} {}",
        "Service account:".cyan(),
        report.service_account.as_deref().unwrap_or("(anonymous)")
    );
    println!("  {:<26} {}", "User base DN:".cyan(), report.user_base_dn);
    println!(
        "  {:<26} {}",
        "User filter:".cyan(),
        report.user_filter.as_deref().unwrap_or("(none)")
    );
    println!(
        "  {:<26} {}",
        "Credential check:".cyan(),
        if report.bind_with_authentication {
            "bind"
        } else {
            "compare"
        }
    );
    println!("  {:<26} {}", "Group strategy:".cyan(), report.group_fetch_strategy);
    println!("  {:<26} {}", "Email lookup:".cyan(), report.email_lookup);
    println!("  {:<26} {}", "Remember-me:".cyan(), report.remember_me);

    Ok(())
}
