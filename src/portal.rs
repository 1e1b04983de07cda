//! e-Bloc.ro portal integration
//!
//! The portal exposes undocumented AJAX endpoints that answer form-encoded
//! POSTs with loosely shaped JSON. This module is split into:
//!
//! - `session`: identifiers carried by the session cookie
//! - `transport`: the injected HTTP capability (`PortalTransport`)
//! - `normalize`: raw JSON to canonical shapes, rejecting unknown shapes
//! - `types`: the canonical shapes
//! - `client`: the endpoint operations

pub mod client;
pub mod normalize;
pub mod session;
pub mod transport;
pub mod types;

pub use client::PortalClient;
pub use session::SessionCredentials;
pub use transport::{PortalRequest, PortalResponse, PortalTransport, ReqwestTransport};
pub use types::{AccountInfo, MeterRow, PaymentRow, ReadingMonths};

/// Production portal location
pub const DEFAULT_BASE_URL: &str = "https://www.e-bloc.ro";

/// `pIdAp` value that selects every unit under the association
pub const ALL_UNITS: &str = "-1";

/// Fixed portal endpoints used by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Lightweight probe used to validate the cookie
    HomeAp,
    /// Account and billing summary
    HomeApInfo,
    /// Payments and receipts
    PlatiChitante,
    /// Months with meter data available
    IndexLuni,
    /// Per-meter readings for one month
    IndexContoare,
}

impl Endpoint {
    /// Path relative to the portal base URL
    pub fn path(&self) -> &'static str {
        match self {
            Self::HomeAp => "/ajax/AjaxGetHomeAp.php",
            Self::HomeApInfo => "/ajax/AjaxGetHomeApInfo.php",
            Self::PlatiChitante => "/ajax/AjaxGetPlatiChitante.php",
            Self::IndexLuni => "/ajax/AjaxGetIndexLuni.php",
            Self::IndexContoare => "/ajax/AjaxGetIndexContoare.php",
        }
    }

    /// Short name used in logs and error messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::HomeAp => "HomeAp",
            Self::HomeApInfo => "HomeApInfo",
            Self::PlatiChitante => "PlatiChitante",
            Self::IndexLuni => "IndexLuni",
            Self::IndexContoare => "IndexContoare",
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
