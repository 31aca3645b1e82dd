//! status command - query the directory root DSE

use super::CommandContext;
use anyhow::{Context, Result};
use colored::Colorize;
use dirauth_core::Error;

pub async fn execute(ctx: &CommandContext) -> Result<()> {
    let factory = ctx.session_factory();
    let info = tokio::task::spawn_blocking(move || factory.probe())
        .await
        .context("Directory probe task failed")?
        .map_err(Error::Directory)?;

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Directory Server".bold());
    println!("  {:<18} {}", "URL:".cyan(), info.server_url);
    println!(
        "  {:<18} {}",
        "Vendor:".cyan(),
        info.vendor.as_deref().unwrap_or("unknown")
    );
    println!(
        "  {:<18} {}",
        "Version:".cyan(),
        info.version.as_deref().unwrap_or("unknown")
    );
    println!(
        "  {:<18} {}",
        "LDAP versions:".cyan(),
        info.supported_ldap_version.join(", ")
    );
    println!("  {}", "Naming contexts:".cyan());
    for context in &info.naming_contexts {
        println!("    {}", context);
    }

    Ok(())
}
