//! dirauth - directory-backed authentication
//!
//! Operator tool to try logins, change passwords and check the directory
//! configuration of a dirauth deployment.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use commands::CommandContext;
use dirauth_core::config::DirauthConfig;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dirauth")]
#[command(version = dirauth_core::VERSION)]
#[command(about = "Directory-backed authentication", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DIRAUTH_CONFIG")]
    config: Option<String>,

    /// Directory URL, overrides the configuration
    #[arg(long, global = true, env = "DIRAUTH_LDAP_URL")]
    url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "DIRAUTH_LOG_LEVEL")]
    log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    output: OutputFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate a user and show the resulting roles
    Authenticate {
        /// Username, email address or DN
        username: String,

        #[arg(short, long, env = "DIRAUTH_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Change the password of a user
    ChangePassword {
        username: String,

        #[arg(long, env = "DIRAUTH_OLD_PASSWORD", hide_env_values = true)]
        old_password: String,

        #[arg(long, env = "DIRAUTH_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },

    /// Look a user up without a password
    Lookup { username: String },

    /// Query the directory root DSE
    Status,

    /// Load and validate the configuration
    CheckConfig,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let (code, exit) = match e.downcast_ref::<dirauth_core::Error>() {
                Some(err) => (err.code(), err.exit_code()),
                None => ("ERROR", 1),
            };
            eprintln!("error[{}]: {:#}", code, e);
            ExitCode::from(u8::try_from(exit).unwrap_or(1))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Version = cli.command {
        println!("dirauth {}", dirauth_core::VERSION);
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => DirauthConfig::from_file(path)?,
        None => DirauthConfig::from_env(),
    };
    if let Some(url) = cli.url {
        config.connection.server_url = url;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_logging(&config.logging.level, &config.logging.format);

    let ctx = CommandContext::new(config, cli.output);

    match cli.command {
        Commands::Authenticate { username, password } => {
            commands::authenticate::execute(&ctx, &username, &password).await
        }
        Commands::ChangePassword {
            username,
            old_password,
            new_password,
        } => commands::change_password::execute(&ctx, &username, &old_password, &new_password).await,
        Commands::Lookup { username } => commands::lookup::execute(&ctx, &username).await,
        Commands::Status => commands::status::execute(&ctx).await,
        Commands::CheckConfig => commands::check_config::execute(&ctx),
        Commands::Version => Ok(()),
    }
}

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
