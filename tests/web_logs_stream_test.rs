use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::routing::get;
use http_body_util::BodyExt as _;
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test]
async fn logs_stream_emits_named_log_events() {
    // Logging must be initialized so the broadcast layer is installed
    let _ = ebloc_bridge::logging::init_logging(&ebloc_bridge::config::LoggingConfig::default());
    ebloc_bridge::logging::set_web_log_level(tracing::Level::INFO);

    let router = axum::Router::new().route("/api/logs/stream", get(ebloc_bridge::web::logs_stream));
    let response = router
        .oneshot(Request::builder().uri("/api/logs/stream").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let ct = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");
    assert!(ct.contains("text/event-stream"));

    tokio::spawn(async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let logger = ebloc_bridge::logging::get_logger("coordinator");
        logger.debug("refresh_debug_line_hidden");
        logger.info("refresh_info_line_456");
    });

    let mut body = response.into_body();
    let mut buf = String::new();
    let found = tokio::time::timeout(Duration::from_secs(2), async {
        while let Some(Ok(frame)) = body.frame().await {
            if let Some(data) = frame.data_ref() {
                buf.push_str(&String::from_utf8_lossy(data));
                if buf.contains("refresh_info_line_456") {
                    return true;
                }
            }
        }
        false
    })
    .await;

    assert_eq!(found, Ok(true), "timed out waiting for SSE log event: {}", buf);
    assert!(buf.contains("event: log"), "SSE should include named 'log' event: {}", buf);
    assert!(buf.contains("component=coordinator"));
    assert!(!buf.contains("refresh_debug_line_hidden"));
}
