#![no_main]
use ebloc_bridge::portal::normalize;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let body = String::from_utf8_lossy(data);
    let _ = normalize::looks_like_login_page(&body);
    let _ = normalize::truncate_body(&body, normalize::BODY_LOG_LIMIT);

    let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) else {
        return;
    };

    // Every shape must either normalize or be rejected, never panic
    let _ = normalize::account_info(value.clone()).map(|info| info.displayed_month());
    let _ = normalize::payment_rows(value.clone(), 6);
    let _ = normalize::meter_rows(value.clone()).map(|rows| ebloc_bridge::history::reconcile_month(&rows));
    let _ = normalize::reading_months(value).map(|m| m.months());
});
