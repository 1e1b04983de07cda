use super::Endpoint;
use crate::config::PortalConfig;
use crate::error::{EblocError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE, ORIGIN, REFERER, USER_AGENT};
use std::time::Duration;

const ACCEPT_JSON: &str = "application/json, text/javascript, */*; q=0.01";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// One form-encoded POST to a portal endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRequest {
    pub endpoint: Endpoint,
    pub form: Vec<(&'static str, String)>,
}

impl PortalRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            form: Vec::new(),
        }
    }

    /// Append a form field
    pub fn field(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.form.push((name, value.into()));
        self
    }
}

/// Raw HTTP outcome, before any JSON handling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalResponse {
    pub status: u16,
    pub body: String,
}

/// HTTP capability injected into the portal client.
///
/// Implementations must tolerate concurrent calls; the client never mutates
/// the transport nor manages its lifecycle.
#[async_trait]
pub trait PortalTransport: Send + Sync {
    async fn post_form(&self, cookie: &str, request: &PortalRequest) -> Result<PortalResponse>;
}

/// `reqwest`-backed transport that speaks to the portal like its own web UI
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    base_url: String,
    user_agent: String,
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport with its own connection pool
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| EblocError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(
            config.base_url.clone(),
            config.user_agent.clone(),
            http,
        ))
    }

    /// Reuse an HTTP client owned by the host process
    pub fn with_client(base_url: String, user_agent: String, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent,
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

#[async_trait]
impl PortalTransport for ReqwestTransport {
    async fn post_form(&self, cookie: &str, request: &PortalRequest) -> Result<PortalResponse> {
        let endpoint = request.endpoint;
        let resp = self
            .http
            .post(self.url_for(endpoint))
            .header(USER_AGENT, self.user_agent.as_str())
            .header(ACCEPT, ACCEPT_JSON)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ORIGIN, self.base_url.as_str())
            .header(REFERER, format!("{}/index.php", self.base_url))
            .header("X-Requested-With", "XMLHttpRequest")
            .header(COOKIE, cookie)
            .form(&request.form)
            .send()
            .await
            .map_err(|e| EblocError::auth_with_cause(format!("Request to {} failed", endpoint), e))?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| {
            EblocError::auth_with_cause(format!("Reading {} response failed", endpoint), e)
        })?;
        Ok(PortalResponse { status, body })
    }
}
