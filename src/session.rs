//! The per-session context: who is signed in and which currency they see.

use crate::api::Client;
use crate::format::Currency;
use crate::{utils, Config, Result};
use anyhow::Context;
use tracing::{debug, warn};

/// The authentication token and the display currency of one session.
///
/// Both are read once, in `Session::start`, and then passed explicitly to whatever needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    currency: Currency,
}

impl Session {
    pub fn new(token: Option<String>, currency: Currency) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()),
            currency,
        }
    }

    /// Reads the token saved by `mmt auth` and, when there is one, asks the store for the
    /// user's currency. A failed settings request falls back to dollars.
    pub async fn start(config: &Config, client: &Client) -> Result<Self> {
        let token = read_token(config).await?;
        let mut session = Session::new(token, Currency::default());
        let Some(token) = session.token().map(str::to_string) else {
            debug!("No token found, the session is signed out");
            return Ok(session);
        };
        match client.currency(&token).await {
            Ok(currency) => session.set_currency(currency),
            Err(e) => warn!("Showing amounts in {}: {e:#}", Currency::default()),
        }
        Ok(session)
    }

    /// `None` when signed out.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn set_currency(&mut self, currency: Currency) {
        self.currency = currency;
    }
}

/// The saved token, trimmed. A missing or blank file means no token.
pub async fn read_token(config: &Config) -> Result<Option<String>> {
    let contents = utils::read_optional(&config.token_path()).await?;
    Ok(contents
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Saves `token` where `Session::start` will find it.
pub async fn save_token(config: &Config, token: &str) -> Result<()> {
    let path = config.token_path();
    if let Some(parent) = path.parent() {
        utils::make_dir(parent).await?;
    }
    utils::write(&path, token.trim())
        .await
        .context("Unable to save the token")
}

pub async fn remove_token(config: &Config) -> Result<()> {
    utils::remove(&config.token_path()).await
}
