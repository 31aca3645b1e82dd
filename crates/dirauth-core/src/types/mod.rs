//! Core types for dirauth

mod account;
mod authentication;
mod entry;

pub use account::*;
pub use authentication::*;
pub use entry::*;
