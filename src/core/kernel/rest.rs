use crate::core::audit::{redact_headers, AuditEntry, AuditSink};
use crate::core::errors::ExchangeError;
use crate::core::kernel::signer::{encode_query, QueryParams, SignedPayload, Signer, API_KEY_HEADER};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{instrument, trace, warn};

/// One outbound call: method, path, ordered parameters, and whether it must be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub params: QueryParams,
    pub requires_auth: bool,
}

impl RequestSpec {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Vec::new(),
            requires_auth: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Mark the request as private: it gets a timestamp, a signature and the API key header.
    #[must_use]
    pub fn signed(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    /// Append a parameter. Parameters are sent in the order they are added.
    #[must_use]
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn param_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }
}

/// A request ready for the wire. `url` already carries the final query string.
#[derive(Clone)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub signature: Option<SignedPayload>,
}

impl PreparedRequest {
    pub fn timestamp_millis(&self) -> Option<u64> {
        self.signature.as_ref().map(|s| s.timestamp)
    }

    pub fn signature_hex(&self) -> Option<&str> {
        self.signature.as_ref().map(|s| s.signature.as_str())
    }

    /// Everything after the `?`, empty when there are no parameters
    pub fn query_string(&self) -> &str {
        self.url.split_once('?').map_or("", |(_, query)| query)
    }
}

impl fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &redact_headers(&self.headers, &[API_KEY_HEADER]))
            .finish_non_exhaustive()
    }
}

/// REST client trait: the single "signed execute" primitive every endpoint goes through
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Send `spec` and decode a 2xx JSON body into `T`.
    ///
    /// Errors:
    /// * `MissingCredentials` - a private call without usable credentials; nothing is sent
    /// * `Transport` - DNS, TLS, connect, timeout or body read failure
    /// * `RemoteRejected` - non-2xx status, body passed through untouched
    /// * `MalformedResponse` - 2xx body that does not decode into `T`
    async fn execute<T: DeserializeOwned + Send>(&self, spec: RequestSpec)
        -> Result<T, ExchangeError>;

    /// Make a GET request with strongly-typed response
    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        endpoint: &str,
        query_params: QueryParams,
        authenticated: bool,
    ) -> Result<T, ExchangeError> {
        let mut spec = RequestSpec::get(endpoint);
        spec.params = query_params;
        spec.requires_auth = authenticated;
        self.execute(spec).await
    }
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            timeout_seconds: 30,
            user_agent: concat!("mbx-trade/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            audit: None,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Record every completed round trip to `sink`
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(sink);
        self
    }

    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| ExchangeError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
            audit: self.audit,
        })
    }
}

/// Implementation of `RestClient` using reqwest
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    audit: Option<Arc<dyn AuditSink>>,
}

impl fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .field("has_audit_sink", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    /// Get the current timestamp in milliseconds
    fn get_timestamp() -> Result<u64, ExchangeError> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .map_err(|e| ExchangeError::Other(format!("Failed to get timestamp: {}", e)))
    }

    /// Join the base URL and an endpoint path with exactly one `/`
    fn build_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    /// Build the wire request, stamping it with the current time.
    pub fn prepare(&self, spec: &RequestSpec) -> Result<PreparedRequest, ExchangeError> {
        let timestamp = if spec.requires_auth {
            Self::get_timestamp()?
        } else {
            0
        };
        self.prepare_at(spec, timestamp)
    }

    /// Build the wire request with an explicit timestamp. `timestamp` is
    /// ignored for public requests.
    pub fn prepare_at(
        &self,
        spec: &RequestSpec,
        timestamp: u64,
    ) -> Result<PreparedRequest, ExchangeError> {
        let mut headers = vec![("Accept".to_string(), "application/json".to_string())];
        let base = self.build_url(&spec.path);

        if !spec.requires_auth {
            let query = encode_query(&spec.params);
            let url = if query.is_empty() {
                base
            } else {
                format!("{}?{}", base, query)
            };
            return Ok(PreparedRequest {
                method: spec.method.clone(),
                url,
                headers,
                signature: None,
            });
        }

        let signer = self
            .signer
            .as_ref()
            .ok_or(ExchangeError::MissingCredentials)?;
        let payload = signer.sign_request(&spec.params, timestamp)?;

        headers.extend(payload.headers.iter().cloned());
        let url = format!("{}?{}", base, payload.query_string);

        Ok(PreparedRequest {
            method: spec.method.clone(),
            url,
            headers,
            signature: Some(payload),
        })
    }

    /// Send a prepared request and return the raw status and body
    async fn send(&self, prepared: &PreparedRequest) -> Result<(u16, String), ExchangeError> {
        let mut request = self.client.request(prepared.method.clone(), &prepared.url);
        for (name, value) in &prepared.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let query_time = Utc::now();
        let response = request
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            ExchangeError::Transport(format!("Failed to read response body: {}", e))
        })?;
        let response_time = Utc::now();

        trace!(status, "Response body: {}", body);

        if let Some(sink) = &self.audit {
            let entry = AuditEntry {
                url: prepared.url.clone(),
                request_headers: redact_headers(&prepared.headers, &[API_KEY_HEADER]),
                response_status: status,
                response_body: body.clone(),
                query_time,
                response_time,
            };
            if let Err(e) = sink.record(entry) {
                warn!(error = %e, url = %prepared.url, "Failed to record audit entry");
            }
        }

        Ok((status, body))
    }

    fn decode<T: DeserializeOwned>(status: u16, body: String) -> Result<T, ExchangeError> {
        if !(200..300).contains(&status) {
            return Err(ExchangeError::RemoteRejected { status, body });
        }
        serde_json::from_str(&body).map_err(|e| ExchangeError::MalformedResponse {
            message: e.to_string(),
            body,
        })
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(
        skip(self, spec),
        fields(
            exchange = %self.config.exchange_name,
            method = %spec.method,
            endpoint = %spec.path,
            authenticated = spec.requires_auth,
            param_count = spec.params.len()
        )
    )]
    async fn execute<T: DeserializeOwned + Send>(
        &self,
        spec: RequestSpec,
    ) -> Result<T, ExchangeError> {
        // Timestamp is taken here, immediately before sending.
        let prepared = self.prepare(&spec)?;
        let (status, body) = self.send(&prepared).await?;
        Self::decode(status, body)
    }
}
