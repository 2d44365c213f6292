//! HTTP client for the netdata v1 API.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::FetchError;

/// URL scheme used for every request of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(FetchError::InvalidConfig(format!(
                "unsupported protocol '{}' (expected http or https)",
                other
            ))),
        }
    }
}

/// Basic auth username/password pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Client for one or more netdata hosts.
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct NetdataClient {
    client: Client,
    protocol: Protocol,
    credentials: Option<Credentials>,
}

impl NetdataClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> NetdataClientBuilder {
        NetdataClientBuilder::default()
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Base URL of the v1 API on `host`.
    pub fn api_url(&self, host: &str, path: &str) -> String {
        format!("{}://{}/api/v1/{}", self.protocol.as_str(), host, path)
    }

    /// List the charts available on `host`, sorted by name, optionally
    /// keeping only those starting with `starts_with`.
    pub async fn chart_list(
        &self,
        host: &str,
        starts_with: Option<&str>,
    ) -> Result<Vec<String>, FetchError> {
        let url = self.api_url(host, "charts");
        let catalog: ChartCatalog = self.get_json(&url, self.credentials.as_ref()).await?;

        let charts: Vec<String> = catalog
            .charts
            .into_keys()
            .filter(|name| starts_with.map_or(true, |prefix| name.starts_with(prefix)))
            .collect();

        debug!(host, charts = charts.len(), "listed charts");
        Ok(charts)
    }

    /// GET `url` and decode the JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
    ) -> Result<T, FetchError> {
        let mut request = self.client.get(url);
        if let Some(creds) = credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(FetchError::Auth("Invalid credentials".to_string()));
        }

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

/// Builder for NetdataClient.
#[derive(Debug, Default)]
pub struct NetdataClientBuilder {
    protocol: Option<Protocol>,
    username: Option<String>,
    password: Option<String>,
    timeout: Option<Duration>,
}

impl NetdataClientBuilder {
    /// Set the URL scheme (default: http).
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Set the username and password for basic authentication.
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the username and password only if both are present.
    pub fn maybe_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        if let (Some(username), Some(password)) = (username, password) {
            self.username = Some(username);
            self.password = Some(password);
        }
        self
    }

    /// Set a per-request timeout. Unset by default; batch fetches are also
    /// bounded by the supervisor's deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<NetdataClient, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::InvalidConfig(format!("failed to build HTTP client: {}", e)))?;

        let credentials = match (self.username, self.password) {
            (Some(username), Some(password)) => Some(Credentials { username, password }),
            _ => None,
        };

        Ok(NetdataClient {
            client,
            protocol: self.protocol.unwrap_or_default(),
            credentials,
        })
    }
}

/// `/api/v1/charts` response. Only the chart names are used.
#[derive(Debug, Deserialize)]
struct ChartCatalog {
    charts: BTreeMap<String, serde_json::Value>,
}
