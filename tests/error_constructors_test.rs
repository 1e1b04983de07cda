use ebloc_bridge::error::EblocError;
use std::error::Error as _;

#[test]
fn error_constructors_group_1() {
    assert!(matches!(EblocError::config("x"), EblocError::Config { .. }));
    assert!(matches!(EblocError::io("x"), EblocError::Io { .. }));
    assert!(matches!(EblocError::web("x"), EblocError::Web { .. }));
    assert!(matches!(
        EblocError::validation("f", "m"),
        EblocError::Validation { .. }
    ));
    assert!(matches!(EblocError::timeout("x"), EblocError::Timeout { .. }));
}

#[test]
fn auth_errors_carry_optional_cause() {
    let plain = EblocError::auth("login page");
    assert!(plain.is_auth());
    assert!(plain.source().is_none());

    let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
    let wrapped = EblocError::auth_with_cause("Request to HomeApInfo failed", io);
    assert!(wrapped.is_auth());
    assert_eq!(wrapped.source().map(|s| s.to_string()).as_deref(), Some("reset"));
}

#[test]
fn update_failed_wraps_and_reports_auth() {
    let failed = EblocError::update_failed(EblocError::auth("expired cookie"));
    assert!(matches!(failed, EblocError::UpdateFailed { .. }));
    assert!(failed.is_auth());
    assert_eq!(
        format!("{}", failed),
        "Update failed: Authentication error: expired cookie"
    );

    let not_auth = EblocError::update_failed(EblocError::timeout("slow"));
    assert!(!not_auth.is_auth());
}

#[test]
fn display_messages() {
    let e = EblocError::validation("field", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));
}
