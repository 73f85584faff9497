//! # 📡 THE ELASTICSEARCH ENGINE
//!
//! 🎬 INT. DEMO ENVIRONMENT. 9:02 AM.
//!
//! The stakeholder demo starts at 9:30. The cluster is green. The cluster is
//! also empty. Somebody says "can we just put some movies in it?" and that,
//! friends, is why this module exists.
//!
//! 🚀 Four HTTP calls and a handshake:
//! - `GET /` to say hello (and find out early if the password is wrong)
//! - `HEAD /{index}` to ask whether the index is already there
//! - `PUT /{index}` with the mapping, when it is not
//! - `POST /_bulk` with NDJSON, and `GET /{index}/_count` afterwards
//!
//! Nothing here retries. Every failure becomes a [`SeedError`] with enough
//! detail to write a reasonable postmortem. 🦆

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, trace};

use crate::engines::{BulkResponse, CreateIndexOutcome, SearchEngine};
use crate::errors::SeedError;

// 🔧 config lives next to the thing it configures. no scavenger hunts at 2am.
//
// Defaults match the docker-compose deployment this tool was born in:
// `https://es01:9200`, user `elastic`, CA at `/certs/ca/ca.crt`.
#[derive(Deserialize, Clone)]
pub struct ElasticsearchConfig {
    /// 📡 Full base URL. When set, `scheme`/`host`/`port` are ignored.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// 🔒 Username for basic auth. `None` means no basic auth at all.
    #[serde(default = "default_username")]
    pub username: Option<String>,
    /// 🔒 "password" is not a password. It is a confession. It is also the default.
    #[serde(default = "default_password")]
    pub password: Option<String>,
    /// 🔒 API key auth. Wins over basic auth when both are present.
    #[serde(default)]
    pub api_key: Option<String>,
    /// 📜 PEM bundle trusted for `https` URLs. Ignored for plain `http`.
    #[serde(default = "default_ca_cert_path")]
    pub ca_cert_path: Option<PathBuf>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_host() -> String {
    "es01".to_string()
}

fn default_port() -> u16 {
    9200
}

fn default_username() -> Option<String> {
    Some("elastic".to_string())
}

fn default_password() -> Option<String> {
    Some("password".to_string())
}

fn default_ca_cert_path() -> Option<PathBuf> {
    Some(PathBuf::from("/certs/ca/ca.crt"))
}

// 🔧 10 seconds to shake hands, 30 to chew through a bulk request
fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            url: None,
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
            username: default_username(),
            password: default_password(),
            api_key: None,
            ca_cert_path: default_ca_cert_path(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// 🎭 manual Debug so secrets stay out of `{:#?}` log lines
impl std::fmt::Debug for ElasticsearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchConfig")
            .field("base_url", &self.base_url())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("ca_cert_path", &self.ca_cert_path)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl ElasticsearchConfig {
    /// 📡 The base URL, without a trailing slash. One slash of difference,
    /// infinite suffering of difference.
    pub fn base_url(&self) -> String {
        match &self.url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}://{}:{}", self.scheme, self.host, self.port),
        }
    }
}

/// 📡 A live, pinged, authenticated handle to one Elasticsearch cluster.
#[derive(Debug)]
pub(crate) struct ElasticsearchEngine {
    // -- reused across requests, connection pool and all
    client: reqwest::Client,
    config: ElasticsearchConfig,
    base_url: String,
}

impl ElasticsearchEngine {
    /// 🚀 Build the HTTP client, trust the CA (for https), and ping the root.
    ///
    /// If the cluster is not there, or does not like our credentials, we find
    /// out here rather than halfway through a bulk request.
    pub(crate) async fn connect(config: &ElasticsearchConfig) -> Result<Self, SeedError> {
        let base_url = config.base_url();
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs));

        if base_url.starts_with("https://") {
            if let Some(ca_cert_path) = &config.ca_cert_path {
                let pem = tokio::fs::read(ca_cert_path).await.map_err(|e| {
                    SeedError::connectivity(format!(
                        "💀 Could not read CA certificate '{}': {e}. The TLS handshake needs something to trust.",
                        ca_cert_path.display()
                    ))
                })?;
                let certificate = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                    SeedError::connectivity(format!(
                        "💀 CA certificate '{}' is not valid PEM: {e}",
                        ca_cert_path.display()
                    ))
                })?;
                builder = builder.add_root_certificate(certificate);
                debug!("🔒 Trusting CA bundle at {}", ca_cert_path.display());
            }
        }

        let client = builder.build().map_err(|e| {
            SeedError::connectivity(format!(
                "💀 The HTTP client refused to be born. The TLS stack wept: {e}"
            ))
        })?;

        let engine = Self {
            client,
            config: config.clone(),
            base_url,
        };
        engine.ping().await?;
        info!("📡 Connected to Elasticsearch at {}", engine.base_url);
        Ok(engine)
    }

    // -- "Hello? Is this thing on?"
    async fn ping(&self) -> Result<(), SeedError> {
        let response = self
            .authorize(self.client.get(&self.base_url))
            .send()
            .await
            .map_err(|e| {
                SeedError::connectivity(format!(
                    "💀 Cluster at {} did not answer the ping: {e}",
                    self.base_url
                ))
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SeedError::connectivity(format!(
                "💀 Cluster at {} answered the ping with {status}: {body}",
                self.base_url
            )));
        }
        trace!("✅ Ping answered with {status}");
        Ok(())
    }

    /// 🔒 Auth priority: API key wins over basic auth. This is not a democracy.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if let Some(api_key) = &self.config.api_key {
            request.header("Authorization", format!("ApiKey {api_key}"))
        } else if let Some(username) = &self.config.username {
            request.basic_auth(username, self.config.password.as_ref())
        } else {
            request
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

// 📦 the slice of an error body we care about: {"error":{"type":..,"reason":..}}
fn error_type_and_reason(body: &str) -> (Option<String>, String) {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));
    let error_type = error
        .and_then(|e| e.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let reason = error
        .and_then(|e| e.get("reason"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string());
    (error_type, reason)
}

async fn status_and_body(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status, body)
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

#[derive(Debug, Deserialize)]
struct BulkApiResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItemResult>>,
}

#[derive(Debug, Deserialize)]
struct BulkItemResult {
    #[serde(default)]
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

impl BulkItemResult {
    fn failed(&self) -> bool {
        self.error.is_some() || self.status >= 300
    }
}

#[derive(Debug, Deserialize)]
struct CountApiResponse {
    count: u64,
}

#[async_trait]
impl SearchEngine for ElasticsearchEngine {
    async fn index_exists(&self, index: &str) -> Result<bool, SeedError> {
        let response = self
            .authorize(self.client.head(self.url(index)))
            .send()
            .await
            .map_err(|e| {
                SeedError::connectivity(format!(
                    "💀 Knocked on index '{index}' to see if anyone was home. Got ghosted: {e}"
                ))
            })?;
        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(SeedError::connectivity(format!(
                "💀 Existence check for '{index}' came back {status}. Cannot tell if it lives."
            ))),
        }
    }

    async fn create_index(
        &self,
        index: &str,
        mapping: &Value,
    ) -> Result<CreateIndexOutcome, SeedError> {
        let response = self
            .authorize(self.client.put(self.url(index)))
            .header("Content-Type", "application/json")
            .body(mapping.to_string())
            .send()
            .await
            .map_err(|e| {
                SeedError::connectivity(format!(
                    "💀 The create-index request for '{index}' never made it: {e}"
                ))
            })?;

        let (status, body) = status_and_body(response).await;
        if status.is_success() {
            debug!("🏗️ Index '{index}' created with status {status}");
            return Ok(CreateIndexOutcome::Created);
        }
        if is_auth_failure(status) {
            return Err(SeedError::connectivity(format!(
                "💀 Not allowed to create '{index}' ({status}): {body}"
            )));
        }
        let (error_type, reason) = error_type_and_reason(&body);
        if error_type.as_deref() == Some("resource_already_exists_exception") {
            debug!("🏁 Index '{index}' appeared between our check and our create. Fine by us.");
            return Ok(CreateIndexOutcome::AlreadyExists);
        }
        let detail = match error_type {
            Some(error_type) => format!("{status}: {error_type}: {reason}"),
            None => format!("{status}: {reason}"),
        };
        Err(SeedError::schema_rejected(index, detail))
    }

    async fn bulk(&self, payload: String) -> Result<BulkResponse, SeedError> {
        debug!("📡 Sending {} bytes to /_bulk", payload.len());
        let response = self
            .authorize(self.client.post(self.url("_bulk")))
            // ⚠️ x-ndjson, not json. The cluster has opinions.
            .header("Content-Type", "application/x-ndjson")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                SeedError::bulk_insert(format!(
                    "💀 The bulk request never made it to Elasticsearch: {e}"
                ))
            })?;

        let (status, body) = status_and_body(response).await;
        if !status.is_success() {
            return Err(SeedError::bulk_insert(format!(
                "💀 Elasticsearch looked at our documents and said '{status}': {body}"
            )));
        }

        let parsed: BulkApiResponse = serde_json::from_str(&body).map_err(|e| {
            SeedError::bulk_insert(format!("💀 Bulk response was not the JSON we expected: {e}"))
        })?;
        let mut summary = BulkResponse::default();
        for result in parsed.items.iter().flat_map(|item| item.values()) {
            summary.items += 1;
            if result.failed() {
                summary.failed += 1;
                if summary.first_error.is_none() {
                    summary.first_error = Some(match &result.error {
                        Some(error) => error.to_string(),
                        None => format!("item status {}", result.status),
                    });
                }
            }
        }
        trace!(
            "🚀 Bulk landed: errors={} items={} failed={}",
            parsed.errors, summary.items, summary.failed
        );
        Ok(summary)
    }

    async fn count(&self, index: &str) -> Result<u64, SeedError> {
        let response = self
            .authorize(self.client.get(self.url(&format!("{index}/_count"))))
            .send()
            .await
            .map_err(|e| {
                SeedError::verification(format!("💀 Count query for '{index}' never made it: {e}"))
            })?;
        let (status, body) = status_and_body(response).await;
        if !status.is_success() {
            return Err(SeedError::verification(format!(
                "💀 Count query for '{index}' came back {status}: {body}"
            )));
        }
        let parsed: CountApiResponse = serde_json::from_str(&body).map_err(|e| {
            SeedError::verification(format!("💀 Count response for '{index}' had no count: {e}"))
        })?;
        Ok(parsed.count)
    }
}
