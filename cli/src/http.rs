use std::time::Duration;

use anyhow::{Context, Result};

/// Shared reqwest client for the nutrition providers.
pub(crate) fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(format!(
            "diabeat-cli/{} (glucose companion)",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .context("Failed to build HTTP client")
}
