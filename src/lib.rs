//! # Larder (Personal Pantry Inventory API)
//!
//! `larder` is a token-authenticated pantry inventory service. Users register
//! with a password and a security answer, log in for an HS256 bearer token,
//! and manage a per-user collection of perishable item records.
//!
//! ## Credentials & Sessions
//!
//! - Passwords and security answers are stored as Argon2id hashes, never
//!   plaintext.
//! - Session tokens are stateless JWTs; logout records the token's `jti` in a
//!   persisted revocation ledger that the session gate consults on every
//!   protected request. Revocation is permanent.
//! - Password recovery is a security-question flow; there is no email
//!   delivery and no token refresh.
//!
//! ## Validation
//!
//! Every write path runs through one generic pipeline: duplicate-key
//! rejection, declared-shape checks, blank-value rejection, strict primitive
//! typing, then per-field semantic rules. Ambiguous or partially valid input
//! is never accepted.

pub mod api;
pub mod cli;
pub mod validation;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn git_commit_hash_is_hex_or_unknown() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
