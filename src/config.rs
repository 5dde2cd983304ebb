//! Provider configuration and API token discovery.

use serde::Deserialize;
use tracing::debug;

/// Environment variable consulted when no token is set in configuration.
pub const API_TOKEN_ENV: &str = "TURSO_API_TOKEN";

/// Practitioner-supplied provider configuration.
///
/// Deserialized from the raw configuration value passed to `configure`.
/// Unknown keys are ignored so hosts can carry extra metadata alongside.
#[derive(Clone, Default, Deserialize)]
pub struct ProviderConfig {
    /// Name of the Turso organization to manage.
    #[serde(default)]
    pub organization: Option<String>,
    /// Turso platform API token. Falls back to `TURSO_API_TOKEN` and then
    /// to the local `turso` CLI session when unset.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Override for the admin API base URL. Intended for self-hosted
    /// deployments and tests.
    #[serde(default)]
    pub base_url: Option<String>,
}

// Manual Debug so the token can never leak through debug logging.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("organization", &self.organization)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve the API token to use, in precedence order: the explicit
    /// `api_token` attribute, the `TURSO_API_TOKEN` environment variable,
    /// then the token held by a logged-in `turso` CLI.
    ///
    /// Returns `None` when no source yields a non-empty token.
    pub async fn resolve_api_token(&self) -> Option<String> {
        if let Some(token) = non_empty(self.api_token.as_deref()) {
            debug!("using api token from provider configuration");
            return Some(token);
        }

        if let Some(token) = std::env::var(API_TOKEN_ENV)
            .ok()
            .and_then(|v| non_empty(Some(&v)))
        {
            debug!("using api token from {} environment variable", API_TOKEN_ENV);
            return Some(token);
        }

        if let Some(token) = token_from_cli().await {
            debug!("using api token from turso cli session");
            return Some(token);
        }

        None
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Ask a locally installed `turso` CLI for its session token.
async fn token_from_cli() -> Option<String> {
    let output = tokio::process::Command::new("turso")
        .args(["auth", "token"])
        .output()
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let token = String::from_utf8(output.stdout).ok()?;
    non_empty(Some(&token))
}
