#![allow(dead_code)]

use async_trait::async_trait;
use ebloc_bridge::coordinator::{CoordinatorSettings, UpdateCoordinator};
use ebloc_bridge::error::{EblocError, Result};
use ebloc_bridge::portal::{Endpoint, PortalClient, PortalRequest, PortalResponse, PortalTransport};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const COOKIE: &str = "PHPSESSID=abc; asoc-cur=4521; home-ap-cur=4521_17";

#[derive(Clone, Debug)]
pub enum Reply {
    Body(String),
    Status(u16, String),
    Hang,
}

pub fn body(s: &str) -> Reply {
    Reply::Body(s.to_string())
}

/// Scripted portal keyed by endpoint and, for meter readings, by `pLuna`
#[derive(Default)]
pub struct FakePortal {
    replies: Mutex<HashMap<(Endpoint, Option<String>), Reply>>,
    calls: Mutex<Vec<PortalRequest>>,
}

impl FakePortal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, endpoint: Endpoint, reply: Reply) {
        self.replies.lock().unwrap().insert((endpoint, None), reply);
    }

    pub fn set_month(&self, month: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert((Endpoint::IndexContoare, Some(month.to_string())), reply);
    }

    pub fn months_requested(&self) -> Vec<String> {
        let mut months: Vec<String> = self
            .calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.endpoint == Endpoint::IndexContoare)
            .filter_map(|r| {
                r.form
                    .iter()
                    .find(|(k, _)| *k == "pLuna")
                    .map(|(_, v)| v.clone())
            })
            .collect();
        months.sort();
        months
    }
}

#[async_trait]
impl PortalTransport for FakePortal {
    async fn post_form(&self, cookie: &str, request: &PortalRequest) -> Result<PortalResponse> {
        assert_eq!(cookie, COOKIE);
        self.calls.lock().unwrap().push(request.clone());
        let month = (request.endpoint == Endpoint::IndexContoare)
            .then(|| {
                request
                    .form
                    .iter()
                    .find(|(k, _)| *k == "pLuna")
                    .map(|(_, v)| v.clone())
            })
            .flatten();
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&(request.endpoint, month.clone()))
            .cloned();
        match reply {
            Some(Reply::Body(b)) => Ok(PortalResponse { status: 200, body: b }),
            Some(Reply::Status(status, b)) => Ok(PortalResponse { status, body: b }),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(EblocError::timeout("fake portal hung"))
            }
            None if month.is_some() => Ok(PortalResponse {
                status: 200,
                body: "[]".to_string(),
            }),
            None => Err(EblocError::auth(format!("no script for {}", request.endpoint))),
        }
    }
}

/// Portal with an account on 2025-06 and three months of readings
pub fn standard_portal() -> Arc<FakePortal> {
    let portal = FakePortal::new();
    portal.set(
        Endpoint::HomeApInfo,
        body(r#"{"1":{"cod_client":"C-77","ap":"17","datorie":"123,45","luna_afisata":"2025-06"}}"#),
    );
    portal.set_month("2025-06", body(r#"{"1":{"index_nou":"0"}}"#));
    portal.set_month(
        "2025-05",
        body(r#"{"1":{"index_nou":"150","data":"2025-05-21"},"2":{"index_nou":"abc"}}"#),
    );
    portal.set_month("2025-04", body(r#"{"1":{"index_nou":140}}"#));
    portal.set(
        Endpoint::PlatiChitante,
        body(
            r#"{"0":{"luna":"2025-04","suma":"20000"},"1":{"luna":"2025-06","suma":"25050"},"meta":"x","2":{"luna":"2025-05","suma":"21000"}}"#,
        ),
    );
    portal
}

pub fn coordinator(portal: Arc<FakePortal>, history_months: usize, month_timeout: Duration) -> UpdateCoordinator {
    let client = PortalClient::new(portal, COOKIE);
    UpdateCoordinator::new(
        client,
        CoordinatorSettings {
            refresh_interval: Duration::from_secs(3600),
            history_months,
            month_timeout,
        },
    )
}
