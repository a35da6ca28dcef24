//! Snapshot projection mappers
//!
//! One mapper per dashboard domain, each turning a raw realtime-store
//! snapshot (an untyped JSON tree, possibly absent) into a flat ordered
//! sequence of typed view records. Mappers never fail on missing optional
//! fields; only a snapshot that is present but not a key/value tree is an
//! error, and callers degrade that to an empty table.
//!
//! # Domains
//!
//! - `component_1` — login sessions, keyed by username
//! - `component_2` — behavioral entries, keyed by username
//! - `component_3/Patient_health` — device vitals, keyed by device id with
//!   a `<id>_vitals` sibling key convention
//! - `component_4` — risk-assessment report (fixed question keys + steps)

use crate::snapshot::{
    as_object, bool_or_false, coerce_bool, kind_of, string_or_empty, SnapshotError,
};
use crate::status::Status;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sub-path under `component_3` holding the device vitals tree.
pub const DEVICE_HEALTH_KEY: &str = "Patient_health";

/// Naming convention marking a vitals sub-record: `<id>_vitals`.
pub const VITALS_SUFFIX: &str = "_vitals";

/// The five fixed risk-report question keys, in display order.
pub const RISK_QUESTION_KEYS: [&str; 5] = [
    "How_would_the_actor_do_it__What_would_they_do_",
    "How_would_the_information_asset_s_security_requirements_be_breached_",
    "What_is_the_actor_s_reason_for_it_",
    "What_would_be_the_resulting_effect_on_the_information_asset_",
    "Who_would_exploit_the_area_of_concern_or_threat_",
];

/// Answer key inside `steps` that carries the overall risk evaluation.
const RISK_EVALUATION_KEY: &str = "risk_evaluation";

// ===== Sessions =====

/// One login session row (`component_1/<username>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub name: String,
    pub status: bool,
    pub login_time: String,
    pub logout_time: String,
}

impl SessionRecord {
    pub fn status_label(&self) -> Status {
        Status::from_flag(self.status)
    }
}

/// Project a `component_1` snapshot into session records.
///
/// Missing `status` defaults to false; missing time fields default to the
/// empty string. An absent snapshot maps to an empty list.
pub fn map_sessions(snapshot: &Value) -> Result<Vec<SessionRecord>, SnapshotError> {
    let Some(map) = as_object(snapshot, "component_1")? else {
        return Ok(Vec::new());
    };

    Ok(map
        .iter()
        .map(|(name, info)| SessionRecord {
            name: name.clone(),
            status: bool_or_false(info, "status"),
            login_time: string_or_empty(info, "loginTime"),
            logout_time: string_or_empty(info, "logoutTime"),
        })
        .collect())
}

// ===== Behavioral =====

/// One behavioral-analysis row (`component_2/<username>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehavioralRecord {
    pub name: String,
    pub ip_address: bool,
    pub request: bool,
}

impl BehavioralRecord {
    /// Derived IP status label.
    pub fn ip(&self) -> Status {
        Status::from_flag(self.ip_address)
    }

    /// Derived request-amount status label.
    pub fn request(&self) -> Status {
        Status::from_flag(self.request)
    }
}

/// Project a `component_2` snapshot into behavioral records.
pub fn map_behavior(snapshot: &Value) -> Result<Vec<BehavioralRecord>, SnapshotError> {
    let Some(map) = as_object(snapshot, "component_2")? else {
        return Ok(Vec::new());
    };

    Ok(map
        .iter()
        .map(|(name, info)| BehavioralRecord {
            name: name.clone(),
            ip_address: bool_or_false(info, "ip_address"),
            request: bool_or_false(info, "request"),
        })
        .collect())
}

// ===== Device vitals =====

/// Vitals sub-record attached to a device id. Every field is optional;
/// the upstream collector omits whatever it has not measured yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Vitals {
    pub body_temperature: Option<f64>,
    pub heart_rate: Option<f64>,
    pub spo2: Option<f64>,
    pub health_status: Option<bool>,
    pub hr_prediction: Option<String>,
    pub svc_prediction: Option<String>,
}

/// One device-vitals row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceVitalsRecord {
    pub id: String,
    pub health: bool,
    pub vitals: Option<Vitals>,
}

impl DeviceVitalsRecord {
    pub fn health_label(&self) -> Status {
        Status::from_flag(self.health)
    }
}

/// Project a `component_3` snapshot into device-vitals records.
///
/// Enumerates keys under `Patient_health`, excluding any key carrying the
/// `_vitals` suffix convention; for each retained id the `<id>_vitals`
/// sibling is attached when present. `health` is a truthiness coercion of
/// the raw value.
pub fn map_device_vitals(snapshot: &Value) -> Result<Vec<DeviceVitalsRecord>, SnapshotError> {
    let Some(root) = as_object(snapshot, "component_3")? else {
        return Ok(Vec::new());
    };

    let tree = root.get(DEVICE_HEALTH_KEY).unwrap_or(&Value::Null);
    let Some(map) = as_object(tree, "component_3/Patient_health")? else {
        return Ok(Vec::new());
    };

    Ok(map
        .iter()
        .filter(|(key, _)| !key.contains(VITALS_SUFFIX))
        .map(|(id, raw)| {
            let vitals = map
                .get(&format!("{id}{VITALS_SUFFIX}"))
                .cloned()
                .and_then(|v| serde_json::from_value::<Vitals>(v).ok());

            DeviceVitalsRecord {
                id: id.clone(),
                health: coerce_bool(raw),
                vitals,
            }
        })
        .collect())
}

// ===== Risk report =====

/// One question/answer entry of the risk report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskEntry {
    pub query: String,
    /// Free-form answer; the analyzer emits strings or numbers here.
    pub answer: Value,
}

impl RiskEntry {
    /// Answer rendered as plain text (strings without quotes).
    pub fn answer_text(&self) -> String {
        match &self.answer {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// The assembled risk-assessment report (`component_4`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RiskReport {
    pub malicious: bool,
    pub entries: Vec<RiskEntry>,
    pub summary: String,
    pub risk_evaluation: String,
}

/// Project a `component_4` snapshot into a risk report.
///
/// The five fixed question keys come first, in declared order, skipping
/// any that are absent; then one entry per `steps` child in store key
/// order. Store key order is not guaranteed stable across backends, so
/// consumers should not rely on a particular step order.
pub fn map_risk_report(snapshot: &Value) -> Result<RiskReport, SnapshotError> {
    let Some(map) = as_object(snapshot, "component_4")? else {
        return Ok(RiskReport::default());
    };

    let mut entries = Vec::new();

    for key in RISK_QUESTION_KEYS {
        if let Some(node) = map.get(key) {
            entries.push(entry_from(node, key));
        }
    }

    let steps = map.get("steps").unwrap_or(&Value::Null);
    let steps = match steps {
        Value::Null => None,
        Value::Object(m) => Some(m),
        other => {
            return Err(SnapshotError::Malformed {
                path: "component_4/steps".to_string(),
                found: kind_of(other),
            })
        }
    };

    let mut risk_evaluation = "N/A".to_string();
    if let Some(steps) = steps {
        if let Some(answer) = steps.get(RISK_EVALUATION_KEY).and_then(|s| s.get("answer")) {
            risk_evaluation = match answer {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
        }
        for (key, node) in steps {
            entries.push(entry_from(node, key));
        }
    }

    Ok(RiskReport {
        malicious: bool_or_false(snapshot, "malicious"),
        entries,
        summary: string_or_empty(snapshot, "summary"),
        risk_evaluation,
    })
}

fn entry_from(node: &Value, fallback_query: &str) -> RiskEntry {
    let query = node
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or(fallback_query)
        .to_string();

    RiskEntry {
        query,
        answer: node.get("answer").cloned().unwrap_or(Value::Null),
    }
}
