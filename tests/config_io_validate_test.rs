use ebloc_bridge::config::Config;
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.portal.cookie = "asoc-cur=4521; home-ap-cur=4521_17".to_string();
    cfg.history_months = 24;
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.portal.cookie, cfg.portal.cookie);
    assert_eq!(loaded.history_months, 24);
    assert_eq!(loaded.logging.file, cfg.logging.file);
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();

    cfg.portal.base_url = "www.e-bloc.ro".to_string();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.portal.request_timeout_secs = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.scan_interval_min = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.month_timeout_secs = 0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.web.port = 0;
    assert!(cfg.validate().is_err());
    cfg.web.enabled = false;
    assert!(cfg.validate().is_ok());
}

#[test]
fn history_depth_bounds() {
    let mut cfg = Config::default();
    for (months, ok) in [(0, false), (1, true), (120, true), (121, false)] {
        cfg.history_months = months;
        assert_eq!(cfg.validate().is_ok(), ok, "history_months={months}");
    }
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn missing_file_is_io_error() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(tmp_dir.path().join("absent.yaml")).unwrap_err();
    assert!(format!("{}", err).contains("I/O error"));
}
