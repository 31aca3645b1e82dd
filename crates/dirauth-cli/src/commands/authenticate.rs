//! authenticate command - try a login and show the granted roles

use super::{print_summary, CommandContext};
use anyhow::Result;
use colored::Colorize;

pub async fn execute(ctx: &CommandContext, username: &str, password: &str) -> Result<()> {
    let engine = ctx.engine()?;
    let result = engine.authenticate(username, password).await?;

    if !ctx.is_json() {
        println!("{} {}", "Authenticated".green().bold(), result.username());
    }
    print_summary(ctx, &result.summary())
}
