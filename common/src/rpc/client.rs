use std::{
    env,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use log::{debug, trace};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::{NodeRpc, RpcError, RpcRequest, RpcResponse};
use crate::config::{
    DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RPC_ENDPOINT,
    RPC_TIMEOUT_ENV, RPC_URL_ENV,
};

/// Connection settings for a node JSON-RPC endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub connection_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RPC_ENDPOINT.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connection_timeout_secs: DEFAULT_CONNECTION_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `DEVNET_RPC_URL` and `DEVNET_RPC_TIMEOUT_SECS` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = env::var(RPC_URL_ENV) {
            config.endpoint = endpoint;
        }

        if let Some(timeout) = env::var(RPC_TIMEOUT_ENV)
            .ok()
            .and_then(|value| value.parse().ok())
        {
            config.request_timeout_secs = timeout;
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_secs)
    }
}

/// JSON-RPC 2.0 client over HTTP
pub struct HttpJsonRpcClient {
    client: Client,
    endpoint: Url,
    next_id: AtomicU64,
}

impl HttpJsonRpcClient {
    /// Client for `endpoint` with default timeouts
    pub fn new(endpoint: &str) -> Result<Self, RpcError> {
        Self::with_config(ClientConfig::new(endpoint))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, RpcError> {
        let endpoint = parse_endpoint(&config.endpoint)?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connection_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

// Accept `host:port` as a shorthand for `http://host:port`
fn parse_endpoint(endpoint: &str) -> Result<Url, RpcError> {
    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };
    Ok(url)
}

#[async_trait]
impl NodeRpc for HttpJsonRpcClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(id, method, params);
        if log::log_enabled!(log::Level::Trace) {
            trace!("JSON-RPC request #{} to {}: {}", id, self.endpoint, method);
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Http {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string(),
            });
        }

        let body = response.bytes().await?;
        let response: RpcResponse = serde_json::from_slice(&body)?;
        if let Some(error) = response.error {
            if log::log_enabled!(log::Level::Debug) {
                debug!("{} failed with code {}: {}", method, error.code, error.message);
            }
            return Err(error.into());
        }

        response
            .result
            .ok_or_else(|| RpcError::MissingResult(method.to_string()))
    }
}
