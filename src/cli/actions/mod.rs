use secrecy::SecretString;

pub mod server;

/// Action parsed from the command line.
#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        secret: SecretString,
        token_ttl_seconds: i64,
    },
}
