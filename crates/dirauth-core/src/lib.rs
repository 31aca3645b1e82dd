//! dirauth Core Library
//!
//! Configuration, error taxonomy and directory data types shared by the
//! dirauth authentication engine and its tooling.

pub mod config;
pub mod error;
pub mod types;
pub mod utils;

pub use config::{AuthenticationProperties, ConnectionConfig, DirauthConfig};
pub use error::{DirectoryError, Error, Result};

/// dirauth version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder replaced by the (filter-escaped) username in search filters
pub const USERNAME_PLACEHOLDER: &str = "{username}";

/// Placeholder replaced by the username in the group member format
pub const GROUP_MEMBER_USERNAME_PLACEHOLDER: &str = "${username}";

/// Default role prefix
pub const DEFAULT_ROLE_PREFIX: &str = "ROLE_";

/// Default remember-me cookie validity (two weeks)
pub const DEFAULT_REMEMBER_ME_VALIDITY_SECS: u64 = 14 * 24 * 60 * 60;
