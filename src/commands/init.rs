use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its secrets subdirectory and an initial `config.json` file using
/// `api_url` along with default settings.
///
/// # Arguments
/// - `mmt_home` - The directory that will be the root of the home directory, e.g. `$HOME/mmt`
/// - `api_url` - The base URL of the record store. `None` selects `http://localhost:8000/`.
///
/// # Errors
/// - Returns an error if the URL is invalid or any file operations fail.
pub async fn init(mmt_home: &Path, api_url: Option<&str>) -> Result<Out<()>> {
    let config = Config::create(mmt_home, api_url)
        .await
        .context("Unable to create the mmt home directory and config")?;
    Ok(format!(
        "Successfully created the mmt home directory at {}, using the record store at {}",
        config.root().display(),
        config.api_url()
    )
    .into())
}
