use ebloc_bridge::config::PortalConfig;
use ebloc_bridge::history::MonthKey;
use ebloc_bridge::portal::{ALL_UNITS, PortalClient, ReqwestTransport};
use mockito::{Matcher, Server};
use std::sync::Arc;

const COOKIE: &str = "asoc-cur=4521; home-ap-cur=4521_17";

fn client_for(server: &Server, cookie: &str) -> PortalClient {
    let config = PortalConfig {
        base_url: server.url(),
        request_timeout_secs: 5,
        ..PortalConfig::default()
    };
    let transport = ReqwestTransport::new(&config).unwrap();
    PortalClient::new(Arc::new(transport), cookie)
}

#[tokio::test]
async fn account_info_unwraps_numbered_envelope() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/ajax/AjaxGetHomeApInfo.php")
        .match_header("x-requested-with", "XMLHttpRequest")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("pIdAsoc".into(), "4521".into()),
            Matcher::UrlEncoded("pIdAp".into(), "17".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(r#"{"1":{"cod_client":"C-77","datorie":"12,50","luna_afisata":"2025-06"}}"#)
        .create_async()
        .await;

    let client = client_for(&server, COOKIE);
    let info = client.get_account_info().await.unwrap();
    assert_eq!(info.text("cod_client").as_deref(), Some("C-77"));
    assert_eq!(info.displayed_month().unwrap(), MonthKey::new(2025, 6));
    mock.assert_async().await;
}

#[tokio::test]
async fn payment_history_is_sorted_and_truncated() {
    let mut server = Server::new_async().await;
    let mut rows = serde_json::Map::new();
    for i in 0..20u32 {
        let (year, month) = (2024 + i / 12, i % 12 + 1);
        rows.insert(
            i.to_string(),
            serde_json::json!({"luna": format!("{year:04}-{month:02}"), "suma": "1500"}),
        );
    }
    rows.insert("total".to_string(), serde_json::json!(20));
    let mock = server
        .mock("POST", "/ajax/AjaxGetPlatiChitante.php")
        .match_body(Matcher::UrlEncoded("pIdAp".into(), "17".into()))
        .with_status(200)
        .with_body(serde_json::Value::Object(rows).to_string())
        .create_async()
        .await;

    let client = client_for(&server, COOKIE);
    let rows = client.get_payment_history(6).await.unwrap();
    let months: Vec<&str> = rows.iter().map(|r| r.month.as_str()).collect();
    assert_eq!(
        months,
        vec!["2025-08", "2025-07", "2025-06", "2025-05", "2025-04", "2025-03"]
    );
    assert!(rows.iter().all(|r| r.amount_cents == Some(1500)));
    mock.assert_async().await;
}

#[tokio::test]
async fn meter_readings_for_all_units() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/ajax/AjaxGetIndexContoare.php")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("pLuna".into(), "2025-05".into()),
            Matcher::UrlEncoded("pIdAp".into(), "-1".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"1":{"index_nou":" 150 ","data":"2025-05-21"},"2":{"index_nou":""},"3":"x"}"#)
        .create_async()
        .await;

    let client = client_for(&server, COOKIE);
    let month = MonthKey::new(2025, 5).unwrap();
    let rows = client.get_meter_readings(&month, ALL_UNITS).await.unwrap();
    assert_eq!(rows.len(), 2);
    let mut values: Vec<Option<i64>> = rows.iter().map(|r| r.new_index).collect();
    values.sort();
    assert_eq!(values, vec![None, Some(150)]);
    mock.assert_async().await;
}

#[tokio::test]
async fn reading_months_accepts_empty_array() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/ajax/AjaxGetIndexLuni.php")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = client_for(&server, COOKIE);
    let months = client.get_available_reading_months().await.unwrap();
    assert!(months.months().is_empty());
}

#[tokio::test]
async fn login_redirect_and_bad_json_are_auth_errors() {
    let mut server = Server::new_async().await;
    let _login = server
        .mock("POST", "/ajax/AjaxGetHomeApInfo.php")
        .with_status(200)
        .with_body("<html><form action=login.php><input name=Password></form></html>")
        .create_async()
        .await;
    let _bad = server
        .mock("POST", "/ajax/AjaxGetPlatiChitante.php")
        .with_status(200)
        .with_body("Fatal error: something broke")
        .create_async()
        .await;

    let client = client_for(&server, COOKIE);
    let login = client.get_account_info().await.unwrap_err();
    let bad = client.get_payment_history(0).await.unwrap_err();
    assert!(login.is_auth());
    assert!(bad.is_auth());
    assert!(!bad.to_string().contains("Fatal error"));
}

#[tokio::test]
async fn discover_probes_home_endpoint() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/ajax/AjaxGetHomeAp.php")
        .match_header("cookie", COOKIE)
        .match_body(Matcher::UrlEncoded("pIdAsoc".into(), "4521".into()))
        .with_status(200)
        .with_body(r#"{"1":{"id_asoc":"4521"}}"#)
        .expect(1)
        .create_async()
        .await;

    client_for(&server, COOKIE).discover().await.unwrap();
    mock.assert_async().await;

    let err = client_for(&server, "PHPSESSID=only").discover().await.unwrap_err();
    assert!(err.is_auth());
}
