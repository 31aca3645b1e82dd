//! change-password command

use super::CommandContext;
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct ChangePasswordResult<'a> {
    username: &'a str,
    changed: bool,
}

pub async fn execute(
    ctx: &CommandContext,
    username: &str,
    old_password: &str,
    new_password: &str,
) -> Result<()> {
    let engine = ctx.engine()?;
    engine.change_password(username, old_password, new_password).await?;

    if ctx.is_json() {
        let result = ChangePasswordResult {
            username,
            changed: true,
        };
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{} for {}", "Password changed".green().bold(), username);
    }

    Ok(())
}
