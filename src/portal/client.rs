use super::normalize::{self, BODY_LOG_LIMIT};
use super::session::SessionCredentials;
use super::transport::{PortalRequest, PortalTransport};
use super::types::{AccountInfo, MeterRow, PaymentRow, ReadingMonths};
use super::{ALL_UNITS, Endpoint};
use crate::error::{EblocError, Result};
use crate::history::MonthKey;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use serde_json::Value;
use std::sync::Arc;

/// `pIdAp` sent to HomeApInfo when the cookie names no apartment
const NO_UNIT: &str = "0";

/// Portal API client bound to one session cookie.
///
/// Cheap to clone; clones share the injected transport.
#[derive(Clone)]
pub struct PortalClient {
    transport: Arc<dyn PortalTransport>,
    session: SessionCredentials,
    logger: StructuredLogger,
}

impl std::fmt::Debug for PortalClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalClient")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl PortalClient {
    pub fn new(transport: Arc<dyn PortalTransport>, cookie: &str) -> Self {
        let session = SessionCredentials::parse(cookie);
        let mut context = LogContext::new("portal");
        if let Some(id) = session.account_id() {
            context = context.with_account_id(id.to_string());
        }
        Self {
            transport,
            session,
            logger: get_logger_with_context(context),
        }
    }

    pub fn session(&self) -> &SessionCredentials {
        &self.session
    }

    /// Setup-time probe: the cookie must name an association and the portal
    /// must accept it
    pub async fn discover(&self) -> Result<()> {
        let account = self.session.require_account_id()?;
        let request = PortalRequest::new(Endpoint::HomeAp).field("pIdAsoc", account);
        self.send(&request).await?;
        self.logger.info("Portal session accepted");
        Ok(())
    }

    /// Current account and billing summary
    pub async fn get_account_info(&self) -> Result<AccountInfo> {
        let account = self.session.require_account_id()?;
        let request = PortalRequest::new(Endpoint::HomeApInfo)
            .field("pIdAsoc", account)
            .field("pIdAp", self.session.unit_id().unwrap_or(NO_UNIT));
        normalize::account_info(self.fetch_json(&request).await?)
    }

    /// Payment rows, newest month first. `months == 0` returns every row.
    pub async fn get_payment_history(&self, months: usize) -> Result<Vec<PaymentRow>> {
        let account = self.session.require_account_id()?;
        let request = PortalRequest::new(Endpoint::PlatiChitante)
            .field("pIdAsoc", account)
            .field("pIdAp", self.session.unit_id().unwrap_or(ALL_UNITS));
        normalize::payment_rows(self.fetch_json(&request).await?, months)
    }

    pub async fn get_available_reading_months(&self) -> Result<ReadingMonths> {
        let account = self.session.require_account_id()?;
        let request = PortalRequest::new(Endpoint::IndexLuni).field("pIdAsoc", account);
        normalize::reading_months(self.fetch_json(&request).await?)
    }

    /// Raw per-meter rows for `month`; pass [`ALL_UNITS`] for every unit
    pub async fn get_meter_readings(&self, month: &MonthKey, unit_id: &str) -> Result<Vec<MeterRow>> {
        let account = self.session.require_account_id()?;
        let request = PortalRequest::new(Endpoint::IndexContoare)
            .field("pIdAsoc", account)
            .field("pLuna", month.to_string())
            .field("pIdAp", unit_id);
        normalize::meter_rows(self.fetch_json(&request).await?)
    }

    /// POST and return the body of a 200 response that is not the login form
    async fn send(&self, request: &PortalRequest) -> Result<String> {
        let endpoint = request.endpoint;
        self.logger.trace(&format!("POST {}", endpoint.path()));
        let resp = self
            .transport
            .post_form(self.session.cookie(), request)
            .await?;

        if resp.status != 200 {
            self.log_body(endpoint, &resp.body);
            return Err(EblocError::auth(format!(
                "{} returned HTTP {}",
                endpoint, resp.status
            )));
        }
        if normalize::looks_like_login_page(&resp.body) {
            self.log_body(endpoint, &resp.body);
            return Err(EblocError::auth(format!(
                "{} answered with the login page; cookie expired or invalid",
                endpoint
            )));
        }
        Ok(resp.body)
    }

    async fn fetch_json(&self, request: &PortalRequest) -> Result<Value> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            self.log_body(request.endpoint, &body);
            EblocError::auth_with_cause(format!("Invalid JSON from {}", request.endpoint), e)
        })
    }

    fn log_body(&self, endpoint: Endpoint, body: &str) {
        self.logger.debug(&format!(
            "{} raw body: {}",
            endpoint,
            normalize::truncate_body(body, BODY_LOG_LIMIT)
        ));
    }
}
