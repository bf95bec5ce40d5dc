//! Authentication for API callers
//!
//! The front-ends sign users in with Supabase and forward the session's
//! access token as `Authorization: Bearer <jwt>`. Tokens are verified
//! statelessly against the project's JWT secret.

pub mod jwt;

pub use jwt::{AuthConfig, AuthError, Claims, TokenVerifier};

#[cfg(test)]
pub(crate) use jwt::test_tokens;
