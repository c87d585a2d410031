use crate::api;
use crate::api::auth::AuthConfig;
use crate::cli::actions::Action;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            secret,
            token_ttl_seconds,
        } => {
            let auth_config = AuthConfig::new(secret).with_token_ttl_seconds(token_ttl_seconds);

            api::new(port, dsn, auth_config).await?;
        }
    }

    Ok(())
}
