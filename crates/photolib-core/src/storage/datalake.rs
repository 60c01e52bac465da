//! Azure Data Lake Storage Gen2 gateway using the REST path API.
//!
//! Upload is the three-step create / append / flush sequence; metadata is
//! written with `setProperties`. Every request is retried on transient
//! transport failures.

use super::retry::{with_retry, RetryPolicy};
use super::{key_segments, StorageGateway};
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use std::collections::HashMap;
use std::io::SeekFrom;
use std::time::Duration;
use tokio::io::AsyncSeekExt;

/// REST API version sent with every request.
const API_VERSION: &str = "2021-06-08";

/// Environment variable holding an OAuth bearer token for the account.
pub const ENV_BEARER_TOKEN: &str = "AZURE_STORAGE_TOKEN";

/// Environment variable holding a shared access signature query string.
pub const ENV_SAS_TOKEN: &str = "AZURE_STORAGE_SAS_TOKEN";

/// How requests are authorized.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// SAS parameters appended to every request URL
    Sas(String),
    /// No credentials (public containers, emulators behind a proxy)
    Anonymous,
}

impl Credential {
    /// Discover credentials from the environment. A bearer token wins over a
    /// SAS token; with neither present requests go out unauthenticated.
    pub fn from_env<F>(env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = env(ENV_BEARER_TOKEN).filter(|t| !t.trim().is_empty()) {
            return Self::Bearer(token.trim().to_string());
        }
        if let Some(sas) = env(ENV_SAS_TOKEN).filter(|t| !t.trim().is_empty()) {
            return Self::Sas(sas.trim().trim_start_matches('?').to_string());
        }
        tracing::warn!(
            "Neither {ENV_BEARER_TOKEN} nor {ENV_SAS_TOKEN} is set, storage requests are unauthenticated"
        );
        Self::Anonymous
    }
}

// Keep secrets out of debug logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => write!(f, "Bearer(***)"),
            Self::Sas(_) => write!(f, "Sas(***)"),
            Self::Anonymous => write!(f, "Anonymous"),
        }
    }
}

/// Data Lake Gen2 filesystem client.
pub struct DataLakeGateway {
    endpoint: Url,
    filesystem: String,
    credential: Credential,
    retry: RetryPolicy,
    client: reqwest::Client,
}

impl DataLakeGateway {
    /// Create a gateway for the configured account endpoint and filesystem.
    pub fn new(config: &StorageConfig, credential: Credential) -> StorageResult<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| StorageError::Config(format!("invalid endpoint: {e}")))?;
        if endpoint.cannot_be_a_base() {
            return Err(StorageError::Config(format!(
                "endpoint {endpoint} cannot carry a path"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| StorageError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            endpoint,
            filesystem: config.container.clone(),
            credential,
            retry: RetryPolicy {
                attempts: config.retry_attempts,
                base_delay_ms: config.retry_delay_ms,
            },
            client,
        })
    }

    /// Full URL of the object at `key`, with operation query parameters.
    fn object_url(&self, key: &str, query: &[(&str, &str)]) -> StorageResult<Url> {
        let segments = key_segments(key)?;
        let mut url = self.endpoint.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| StorageError::InvalidKey(key.to_string()))?;
            path.pop_if_empty().push(&self.filesystem).extend(segments);
        }
        if let Credential::Sas(sas) = &self.credential {
            url.set_query(Some(sas));
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Start a request with version, date and auth headers applied.
    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let date = chrono::Utc::now()
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string();
        let builder = self
            .client
            .request(method, url.clone())
            .header("x-ms-version", API_VERSION)
            .header("x-ms-date", date);
        match &self.credential {
            Credential::Bearer(token) => builder.bearer_auth(token),
            _ => builder,
        }
    }

    /// Send a bodiless request and require a success status.
    async fn send_empty(
        &self,
        method: Method,
        url: &Url,
        headers: &[(&str, &str)],
    ) -> StorageResult<Response> {
        with_retry(self.retry, url.path(), |_| {
            let mut builder = self.request(method.clone(), url).header(CONTENT_LENGTH, 0);
            for (name, value) in headers {
                builder = builder.header(*name, *value);
            }
            async move { check_status(url, send(url, builder).await?).await }
        })
        .await
    }

    fn log_request_target(&self) -> String {
        format!("{}/{}", self.endpoint.as_str().trim_end_matches('/'), self.filesystem)
    }
}

async fn send(url: &Url, builder: RequestBuilder) -> StorageResult<Response> {
    builder.send().await.map_err(|e| StorageError::Request {
        url: redact(url),
        message: e.to_string(),
    })
}

/// Turn a non-success response into a `StorageError::Status`.
async fn check_status(url: &Url, response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let code = response
        .headers()
        .get("x-ms-error-code")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.text().await.unwrap_or_default();
    let message = match code {
        Some(code) if body.is_empty() => code,
        Some(code) => format!("{code}: {body}"),
        None => body,
    };
    Err(StorageError::Status {
        url: redact(url),
        status: status.as_u16(),
        message,
    })
}

/// URL without its query string, so SAS signatures never reach the logs.
fn redact(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Encode metadata as the `x-ms-properties` header value.
///
/// Pairs are `name=base64(value)`, comma separated, sorted by name.
pub fn encode_properties(metadata: &HashMap<String, String>) -> String {
    let mut pairs: Vec<_> = metadata.iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(name, value)| {
            format!(
                "{name}={}",
                base64::engine::general_purpose::STANDARD.encode(value.as_bytes())
            )
        })
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl StorageGateway for DataLakeGateway {
    fn name(&self) -> &str {
        "datalake"
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let url = self.object_url(key, &[])?;
        with_retry(self.retry, key, |_| {
            let builder = self.request(Method::HEAD, &url);
            let url = &url;
            async move {
                let response = send(url, builder).await?;
                if response.status() == StatusCode::NOT_FOUND {
                    return Ok(false);
                }
                check_status(url, response).await.map(|_| true)
            }
        })
        .await
    }

    async fn upload(&self, key: &str, file: &mut tokio::fs::File, len: u64) -> StorageResult<()> {
        tracing::trace!("Uploading {key} ({len} bytes) to {}", self.log_request_target());

        let create = self.object_url(key, &[("resource", "file")])?;
        self.send_empty(Method::PUT, &create, &[]).await?;

        if len > 0 {
            let append = self.object_url(key, &[("action", "append"), ("position", "0")])?;
            let file = &*file;
            with_retry(self.retry, key, |_| {
                let append = &append;
                async move {
                    // Each attempt streams from a fresh handle rewound to the start.
                    let mut body = file.try_clone().await?;
                    body.seek(SeekFrom::Start(0)).await?;
                    let builder = self
                        .request(Method::PATCH, append)
                        .header(CONTENT_LENGTH, len)
                        .body(reqwest::Body::from(body));
                    check_status(append, send(append, builder).await?).await
                }
            })
            .await?;
        }

        let position = len.to_string();
        let flush = self.object_url(key, &[("action", "flush"), ("position", &position)])?;
        self.send_empty(Method::PATCH, &flush, &[]).await?;
        Ok(())
    }

    async fn set_metadata(
        &self,
        key: &str,
        metadata: &HashMap<String, String>,
    ) -> StorageResult<()> {
        let url = self.object_url(key, &[("action", "setProperties")])?;
        let properties = encode_properties(metadata);
        self.send_empty(Method::PATCH, &url, &[("x-ms-properties", &properties)])
            .await?;
        Ok(())
    }
}
