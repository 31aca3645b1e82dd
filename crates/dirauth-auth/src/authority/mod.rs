//! Role resolution
//!
//! [`AuthorityResolver`] reads raw group names for a user from the
//! directory, [`AuthorityNormalizer`] turns them into role identifiers.

mod normalizer;
mod resolver;

pub use normalizer::AuthorityNormalizer;
pub use resolver::AuthorityResolver;
