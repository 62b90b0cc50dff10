//! Layers fetched from a static HTTP host.

use std::time::Duration;

use async_trait::async_trait;
use haulway_core::{FeatureCollection, FeatureSource, Layer, LayerLoadError};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use crate::parse_layer;
use crate::routing::DEFAULT_USER_AGENT;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error type for [`HttpFeatureSource`] construction failures.
#[derive(Debug, Error)]
pub enum SourceBuildError {
    /// The base URL could not be parsed.
    #[error("invalid layer base URL {url:?}: {source}")]
    InvalidUrl {
        /// URL as configured.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Configuration for [`HttpFeatureSource`].
#[derive(Debug, Clone)]
pub struct HttpFeatureSourceConfig {
    /// Directory URL the layer artefacts are published under.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl HttpFeatureSourceConfig {
    /// Create a new configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Fetches layer artefacts relative to a base URL.
#[derive(Debug)]
pub struct HttpFeatureSource {
    client: Client,
    base: Url,
}

impl HttpFeatureSource {
    /// Create a source with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceBuildError> {
        Self::with_config(HttpFeatureSourceConfig::new(base_url))
    }

    /// Create a source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client fails to
    /// build.
    pub fn with_config(config: HttpFeatureSourceConfig) -> Result<Self, SourceBuildError> {
        let mut base =
            Url::parse(&config.base_url).map_err(|source| SourceBuildError::InvalidUrl {
                url: config.base_url.clone(),
                source,
            })?;
        if !base.path().ends_with('/') {
            let directory = format!("{}/", base.path());
            base.set_path(&directory);
        }
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(SourceBuildError::HttpClient)?;
        Ok(Self { client, base })
    }

    /// URL of the artefact backing `layer`.
    pub fn layer_url(&self, layer: Layer) -> Result<Url, url::ParseError> {
        self.base.join(layer.file_name())
    }

    async fn fetch(&self, layer: Layer, url: &Url) -> Result<String, LayerLoadError> {
        let unreachable = |err: reqwest::Error| LayerLoadError::Unreachable {
            layer,
            location: url.to_string(),
            message: err.to_string(),
        };
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(unreachable)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(LayerLoadError::NotFound {
                layer,
                tried: vec![url.to_string()],
            });
        }
        response
            .error_for_status()
            .map_err(unreachable)?
            .text()
            .await
            .map_err(unreachable)
    }
}

#[async_trait]
impl FeatureSource for HttpFeatureSource {
    async fn load(&self, layer: Layer) -> Result<FeatureCollection, LayerLoadError> {
        let url = self
            .layer_url(layer)
            .map_err(|err| LayerLoadError::Unreachable {
                layer,
                location: self.base.to_string(),
                message: err.to_string(),
            })?;
        let body = self.fetch(layer, &url).await?;
        parse_layer(&body, layer).map_err(|err| LayerLoadError::Malformed {
            layer,
            location: url.to_string(),
            message: err.to_string(),
        })
    }
}
