//! Cryptography utilities for dirauth

pub mod hash;
pub mod password;

pub use hash::*;
pub use password::*;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}
