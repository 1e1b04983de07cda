// The web level is process-global, so every assertion on it lives in one test

#[test]
fn web_level_controls_stream_filtering() {
    use ebloc_bridge::logging::{
        get_web_log_level, set_web_log_level, set_web_log_level_str, should_emit_to_web,
    };
    use tracing::Level;

    // Runtime level WARN: INFO lines are filtered out, ERROR passes
    set_web_log_level(Level::WARN);
    assert!(!should_emit_to_web(" INFO message"));
    assert!(should_emit_to_web(" ERROR something"));
    assert!(should_emit_to_web("line without level"));

    set_web_log_level_str("debug").unwrap();
    assert_eq!(get_web_log_level(), Level::DEBUG);
    assert!(should_emit_to_web(" INFO message"));

    assert!(set_web_log_level_str("loud").is_err());
    assert_eq!(get_web_log_level(), Level::DEBUG);
}
