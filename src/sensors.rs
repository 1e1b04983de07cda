//! Presentation adapters
//!
//! Read-only views over a [`Snapshot`] shaped as home-automation sensor
//! states. Labels follow the portal's Romanian wording.

use crate::coordinator::Snapshot;
use serde::Serialize;
use serde_json::{Map, Value, json};

pub const ATTRIBUTION: &str = "Date furnizate de e-Bloc.ro";
pub const RELEASES_URL: &str = "https://github.com/boogytotyo/ebloc_ro/releases";

pub const ACCOUNT_SENSOR: &str = "ebloc_date_utilizator";
pub const BALANCE_SENSOR: &str = "ebloc_factura_restanta";
pub const METER_INDEX_SENSOR: &str = "ebloc_index_contor";
pub const PAYMENTS_SENSOR: &str = "ebloc_istoric_facturi";

pub const SENSOR_IDS: [&str; 4] = [
    ACCOUNT_SENSOR,
    BALANCE_SENSOR,
    METER_INDEX_SENSOR,
    PAYMENTS_SENSOR,
];

/// State plus attributes of one sensor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorState {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub state: Value,
    pub attributes: Map<String, Value>,
    pub attribution: &'static str,
}

impl SensorState {
    fn new(id: &'static str, name: &'static str, icon: &'static str) -> Self {
        Self {
            id,
            name,
            icon,
            state: Value::Null,
            attributes: Map::new(),
            attribution: ATTRIBUTION,
        }
    }
}

/// Every sensor, in a stable order
pub fn all_sensors(snapshot: &Snapshot) -> Vec<SensorState> {
    vec![
        account_sensor(snapshot),
        balance_sensor(snapshot),
        meter_index_sensor(snapshot),
        payments_sensor(snapshot),
    ]
}

pub fn sensor_by_id(snapshot: &Snapshot, id: &str) -> Option<SensorState> {
    match id {
        ACCOUNT_SENSOR => Some(account_sensor(snapshot)),
        BALANCE_SENSOR => Some(balance_sensor(snapshot)),
        METER_INDEX_SENSOR => Some(meter_index_sensor(snapshot)),
        PAYMENTS_SENSOR => Some(payments_sensor(snapshot)),
        _ => None,
    }
}

/// Client code as state; account details as attributes (blank ones omitted)
pub fn account_sensor(snapshot: &Snapshot) -> SensorState {
    let home = &snapshot.home;
    let mut sensor = SensorState::new(ACCOUNT_SENSOR, "eBloc Date Utilizator", "mdi:account");
    sensor.state = home.text("cod_client").map(Value::String).unwrap_or(Value::Null);

    let readings_sent = matches!(
        home.text("contoare_citite").as_deref(),
        Some("1") | Some("true") | Some("True")
    );
    let attrs = [
        ("Cod client", home.text("cod_client")),
        ("Apartament", home.text("ap")),
        ("Persoane declarate", home.text("nr_pers_afisat")),
        (
            "Restanță de plată",
            Some(format_lei(&home.text("datorie").unwrap_or_else(|| "0".to_string()))),
        ),
        ("Ultima zi de plată", home.text("ultima_zi_plata")),
        (
            "Contor trimis",
            Some(if readings_sent { "Da" } else { "Nu" }.to_string()),
        ),
        ("Începere citire contoare", home.text("citire_contoare_start")),
        ("Încheiere citire contoare", home.text("citire_contoare_end")),
        ("Luna afișată", home.text("luna_afisata")),
    ];
    for (label, value) in attrs {
        if let Some(v) = value {
            sensor.attributes.insert(label.to_string(), Value::String(v));
        }
    }
    sensor
}

/// Outstanding balance in lei, rounded to bani; unparseable balances read 0
pub fn balance_sensor(snapshot: &Snapshot) -> SensorState {
    let home = &snapshot.home;
    let mut sensor = SensorState::new(BALANCE_SENSOR, "eBloc Factura Restanta", "mdi:file-document-alert");
    let balance = home
        .text("datorie")
        .as_deref()
        .map_or(Some(0.0), parse_lei)
        .map(round2)
        .unwrap_or(0.0);
    sensor.state = json!(balance);
    for (label, key) in [
        ("Luna afișată", "luna_afisata"),
        ("Ultima zi de plată", "ultima_zi_plata"),
        ("Nivel restanță", "nivel_restanta"),
    ] {
        let value = home.text(key).map(Value::String).unwrap_or(Value::Null);
        sensor.attributes.insert(label.to_string(), value);
    }
    sensor
}

/// Latest nonzero index as state; the whole history (null for unknown months)
/// as attributes
pub fn meter_index_sensor(snapshot: &Snapshot) -> SensorState {
    let mut sensor = SensorState::new(METER_INDEX_SENSOR, "eBloc Index Contor", "mdi:counter");
    sensor.state = snapshot
        .latest_index
        .map(|l| json!(l.value))
        .unwrap_or(Value::Null);
    for (month, value) in &snapshot.index_history {
        sensor.attributes.insert(month.to_string(), json!(value));
    }
    sensor
}

/// Newest payment amount as state; every month's amount as attributes
pub fn payments_sensor(snapshot: &Snapshot) -> SensorState {
    let mut sensor = SensorState::new(PAYMENTS_SENSOR, "eBloc Istoric Facturi", "mdi:history");
    sensor.state = snapshot
        .plati
        .first()
        .and_then(|row| row.amount_lei())
        .map(|lei| json!(round2(lei)))
        .unwrap_or(Value::Null);
    for row in &snapshot.plati {
        let label = if row.month.is_empty() { "n/a" } else { row.month.as_str() };
        let lei = row.amount_lei().unwrap_or(0.0);
        // Later rows of the same month overwrite earlier ones
        sensor
            .attributes
            .insert(label.to_string(), Value::String(format!("{:.2} RON", lei)));
    }
    sensor
}

/// Decimal with either a comma or a dot separator
pub fn parse_lei(text: &str) -> Option<f64> {
    text.trim().replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `12,5` -> `12.50 RON`; text that is not a number is returned unchanged
pub fn format_lei(text: &str) -> String {
    match parse_lei(text) {
        Some(v) => format!("{:.2} RON", v),
        None => text.to_string(),
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Version entity; the portal integration has no remote release feed, so the
/// latest version is the installed one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateInfo {
    pub name: &'static str,
    pub installed_version: &'static str,
    pub latest_version: &'static str,
    pub release_url: &'static str,
    pub update_available: bool,
}

pub fn update_info() -> UpdateInfo {
    let version = env!("APP_VERSION");
    UpdateInfo {
        name: "eBloc RO Update",
        installed_version: version,
        latest_version: version,
        release_url: RELEASES_URL,
        update_available: false,
    }
}
