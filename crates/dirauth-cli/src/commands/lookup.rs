//! lookup command - load a user without checking a password

use super::{print_summary, CommandContext};
use anyhow::Result;
use colored::Colorize;
use dirauth_core::types::AuthenticationSummary;
use serde::Serialize;

#[derive(Serialize)]
struct LookupResult {
    #[serde(flatten)]
    summary: AuthenticationSummary,
    remember_me_token: String,
}

pub async fn execute(ctx: &CommandContext, username: &str) -> Result<()> {
    let engine = ctx.engine()?;
    let result = engine.load_user(username).await?;

    if ctx.is_json() {
        let output = LookupResult {
            summary: result.summary(),
            remember_me_token: result.remember_me_token().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_summary(ctx, &result.summary())?;
    println!("  {:<12} {}", "Token:".cyan(), result.remember_me_token());
    Ok(())
}
