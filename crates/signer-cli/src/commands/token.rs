//! Token management commands.
//!
//! `signer token create` - Issue a bearer token granting a list of claims.

use anyhow::Context;
use signer_core::TokenConfig;
use signer_token::TokenService;

/// Issue a token with the configured signing key.
///
/// `valid` and `issuer` fall back to the configured defaults.
pub fn create(
    config: &TokenConfig,
    subject: &str,
    claims: &[String],
    valid: Option<u64>,
    issuer: Option<&str>,
) -> anyhow::Result<String> {
    let service = TokenService::from_config(config).context("Failed to load token signing key")?;

    let validity = valid.unwrap_or(config.default_validity_secs);
    let issuer = issuer.unwrap_or(&config.issuer);

    service
        .issue_token(claims, validity, issuer, subject)
        .context("Failed to create token")
}
