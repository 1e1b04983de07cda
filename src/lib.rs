//! # ebloc-bridge - e-Bloc.ro billing portal poller
//!
//! Polls the e-Bloc.ro residential billing portal with a browser session
//! cookie, normalizes its loosely shaped JSON and republishes one consistent
//! snapshot per refresh cycle for home-automation consumers.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration, environment overrides and validation
//! - `logging`: Structured logging and tracing
//! - `portal`: Session parsing, HTTP transport, response normalization and the API client
//! - `history`: Month keys and meter-index reconciliation
//! - `coordinator`: Refresh cycles, snapshot publication and the timer loop
//! - `sensors`: Sensor-style views over a snapshot
//! - `web`: Read-only HTTP API (feature `web`)

pub mod config;
pub mod coordinator;
pub mod error;
pub mod history;
pub mod logging;
pub mod portal;
pub mod sensors;
#[cfg(feature = "web")]
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{Snapshot, UpdateCoordinator};
pub use error::{EblocError, Result};
