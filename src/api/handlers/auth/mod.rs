//! Authentication and credential lifecycle.
//!
//! Credentials are Argon2id-hashed at rest, sessions are stateless HS256
//! tokens, and logout works through a persisted jti revocation ledger that
//! the session gate consults on every protected request.

pub mod login;
pub mod logout;
pub mod password;
pub(crate) mod principal;
pub mod recovery;
pub mod register;
pub mod revocation;
pub mod state;
pub(crate) mod storage;
pub mod token;
pub mod types;

pub use state::AuthConfig;
