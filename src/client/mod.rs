//! Typed client for the Turso platform admin API.
//!
//! All calls are scoped to a single organization and authenticated with a
//! Bearer token. Successful responses are decoded from the API's envelope
//! objects; failures map onto [`ApiError`] without retries.

mod databases;
mod groups;

pub use databases::{
    CreateDatabaseRequest, Database, DatabaseConfig, DatabaseDetails, DatabaseInstance,
    DatabaseSeed, InstanceType, SeedType,
};
pub use groups::{CreateGroupRequest, Group};

use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Deserialize;

use crate::error::{ApiError, ProviderError};

/// Default base URL of the Turso platform API.
pub const DEFAULT_BASE_URL: &str = "https://api.turso.tech/v1";

/// Settings for constructing a [`Client`].
#[derive(Clone, Default)]
pub struct ClientConfig {
    /// Organization slug all requests are scoped to.
    pub organization: String,
    /// Platform API token used as the Bearer credential.
    pub api_token: String,
    /// Base URL override. Defaults to [`DEFAULT_BASE_URL`].
    pub base_url: Option<String>,
    /// Pre-built HTTP client to use instead of the default one.
    pub http: Option<reqwest::Client>,
}

/// Client for the Turso admin API, scoped to one organization.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    organization: String,
    api_token: String,
}

// Manual Debug so the token can never leak through debug logging.
impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

impl Client {
    /// Build a client from the given configuration.
    ///
    /// Fails when the organization or token is empty, or when the underlying
    /// HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Self, ProviderError> {
        let organization = config.organization.trim().to_string();
        if organization.is_empty() {
            return Err(ProviderError::Configuration(
                "organization name is required".to_string(),
            ));
        }

        let api_token = config.api_token.trim().to_string();
        if api_token.is_empty() {
            return Err(ProviderError::Configuration(
                "api_token is required".to_string(),
            ));
        }

        let http = match config.http {
            Some(http) => http,
            None => reqwest::Client::builder().build().map_err(|err| {
                ProviderError::Configuration(format!("failed to build http client: {err}"))
            })?,
        };

        let base_url = config
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http,
            base_url,
            organization,
            api_token,
        })
    }

    /// The organization this client is scoped to.
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/organizations/{}/{}",
            self.base_url, self.organization, path
        );
        self.http.request(method, url).bearer_auth(&self.api_token)
    }

    async fn handle<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Status {
                status,
                message: error_message(status, &body),
            });
        }
        serde_json::from_str(&body).map_err(ApiError::Decode)
    }

    async fn handle_empty(&self, response: reqwest::Response) -> Result<(), ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(ApiError::Status {
                status,
                message: error_message(status, &body),
            });
        }
        Ok(())
    }

    /// Mint a token at the given auth endpoint. Shared by database and
    /// group token creation; the returned JWT is never logged.
    async fn mint_token(
        &self,
        path: &str,
        expiration: Duration,
        authorization: Authorization,
    ) -> Result<String, ApiError> {
        let response = self
            .request(Method::POST, path)
            .query(&[
                ("expiration", expiration_param(expiration).as_str()),
                ("authorization", authorization.as_str()),
            ])
            .send()
            .await?;
        let body: TokenResponse = self.handle(response).await?;
        Ok(body.jwt)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    jwt: String,
}

/// Access level requested when minting a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authorization {
    /// Read and write access.
    #[default]
    FullAccess,
    /// Read-only access.
    ReadOnly,
}

impl Authorization {
    /// The wire form of this access level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullAccess => "full-access",
            Self::ReadOnly => "read-only",
        }
    }
}

impl std::str::FromStr for Authorization {
    type Err = ProviderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "full-access" => Ok(Self::FullAccess),
            "read-only" => Ok(Self::ReadOnly),
            other => Err(ProviderError::Validation(format!(
                "authorization must be \"full-access\" or \"read-only\", got {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for Authorization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render a token lifetime for the API query string. Zero means the token
/// never expires; anything else is truncated to whole seconds.
fn expiration_param(expiration: Duration) -> String {
    if expiration.is_zero() {
        "never".to_string()
    } else {
        format!("{}s", expiration.as_secs())
    }
}

/// Parse a human-readable token lifetime such as `"2h"` or `"30d"`.
/// `None` and `"never"` both mean the token never expires.
pub(crate) fn parse_expiration(expiration: Option<&str>) -> Result<Duration, ProviderError> {
    match expiration {
        None => Ok(Duration::ZERO),
        Some(raw) if raw.eq_ignore_ascii_case("never") => Ok(Duration::ZERO),
        Some(raw) => humantime::parse_duration(raw)
            .map_err(|err| ProviderError::Validation(format!("invalid expiration {raw:?}: {err}"))),
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: String,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if !parsed.error.is_empty() {
            return parsed.error;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
pub(crate) fn test_client(server: &wiremock::MockServer) -> Client {
    Client::new(ClientConfig {
        organization: "test-org".to_string(),
        api_token: "test-token".to_string(),
        base_url: Some(server.uri()),
        http: None,
    })
    .unwrap()
}
