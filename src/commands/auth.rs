//! Handlers for `mmt auth`.
//!
//! The token is issued by the record store's own sign-in flow; these commands only keep it where
//! every other command will find it.

use crate::commands::Out;
use crate::error::{tagged, ErrorType};
use crate::session;
use crate::{Config, Result};
use anyhow::anyhow;

/// Handles `mmt auth --token <TOKEN>`.
pub async fn auth(config: &Config, token: &str) -> Result<Out<()>> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(tagged(
            ErrorType::Validation,
            anyhow!("The token must not be empty"),
        ));
    }
    session::save_token(config, trimmed).await?;
    Ok(format!("Saved the token to {}", config.token_path().display()).into())
}

/// Handles `mmt auth --clear`. Clearing when no token is saved is not an error.
pub async fn auth_clear(config: &Config) -> Result<Out<()>> {
    session::remove_token(config).await?;
    Ok("Removed the saved token".into())
}
