//! Auth configuration shared by the token issuer and the auth handlers.

use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 60 * 60;

// Every account carries the same recovery question.
const SECURITY_QUESTION: &str = "What is your favourite childhood book";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_secret: SecretString,
    token_ttl_seconds: i64,
    security_question: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(token_secret: SecretString) -> Self {
        Self {
            token_secret,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            security_question: SECURITY_QUESTION.to_string(),
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }

    #[must_use]
    pub fn security_question(&self) -> &str {
        &self.security_question
    }

    pub(crate) fn token_secret(&self) -> &[u8] {
        self.token_secret.expose_secret().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let config = AuthConfig::new(SecretString::from("secret".to_string()));
        assert_eq!(config.token_ttl_seconds(), DEFAULT_TOKEN_TTL_SECONDS);
        assert_eq!(
            config.security_question(),
            "What is your favourite childhood book"
        );
        assert_eq!(config.token_secret(), b"secret");

        let config = config.with_token_ttl_seconds(120);
        assert_eq!(config.token_ttl_seconds(), 120);
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let config = AuthConfig::new(SecretString::from("hunter2".to_string()));
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
    }
}
