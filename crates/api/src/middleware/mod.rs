//! Authentication extractors.
//!
//! - [`auth::AuthUser`] -- Requires a valid JWT Bearer token.
//! - [`auth::OptionalAuthUser`] -- Resolves the caller when a token is present.

pub mod auth;
