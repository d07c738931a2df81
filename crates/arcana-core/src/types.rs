//! Shared types used across all Arcana engines and services

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// Privacy levels
// ---------------------------------------------------------------------------

/// Privacy classification attached to every reading.
///
/// `Biometric` triggers the strictest retention rules: a hard 30-day cap and
/// a ban on persisting raw image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    Minimal,
    Standard,
    Enhanced,
    Biometric,
}

impl Default for PrivacyLevel {
    fn default() -> Self {
        PrivacyLevel::Standard
    }
}

impl PrivacyLevel {
    /// Maximum retention in days for this category, if capped.
    pub fn retention_cap_days(&self, biometric_cap: u32) -> Option<u32> {
        match self {
            PrivacyLevel::Biometric => Some(biometric_cap),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Request envelope
// ---------------------------------------------------------------------------

/// Fields common to every engine input, regardless of engine.
///
/// The validation layer splits a raw request object into this envelope and
/// the engine-specific payload. Fields absent from both the envelope and the
/// engine's declared schema are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Request timestamp; defaults to now. Excluded from cache keys.
    #[serde(default = "default_now")]
    pub timestamp: DateTime<Utc>,
    /// Reading identifier for persistence; assigned at assembly if absent.
    #[serde(default)]
    pub reading_id: Option<String>,
    /// Explicit cache key; derived from the input if absent.
    #[serde(default)]
    pub cache_key: Option<String>,
    #[serde(default)]
    pub admin_api_key: Option<String>,
    #[serde(default = "default_true")]
    pub store_reading: bool,
    #[serde(default = "default_true")]
    pub cache_result: bool,
    #[serde(default = "default_retention")]
    pub retention_days: Option<u32>,
    #[serde(default)]
    pub data_processing_consent: bool,
    #[serde(default)]
    pub privacy_level: PrivacyLevel,
}

fn default_now() -> DateTime<Utc> {
    Utc::now()
}

fn default_true() -> bool {
    true
}

fn default_retention() -> Option<u32> {
    Some(365)
}

impl Default for RequestEnvelope {
    fn default() -> Self {
        Self {
            user_id: None,
            session_id: None,
            timestamp: Utc::now(),
            reading_id: None,
            cache_key: None,
            admin_api_key: None,
            store_reading: true,
            cache_result: true,
            retention_days: Some(365),
            data_processing_consent: false,
            privacy_level: PrivacyLevel::Standard,
        }
    }
}

/// Names of the envelope fields, used when splitting a raw request object.
pub const ENVELOPE_FIELDS: &[&str] = &[
    "user_id",
    "session_id",
    "timestamp",
    "reading_id",
    "cache_key",
    "admin_api_key",
    "store_reading",
    "cache_result",
    "retention_days",
    "data_processing_consent",
    "privacy_level",
];

/// Fields excluded from cache-key derivation. Two inputs that differ only in
/// these fields must share a cache key.
pub const CACHE_KEY_EXCLUDED_FIELDS: &[&str] =
    &["cache_key", "reading_id", "timestamp", "admin_api_key"];

// ---------------------------------------------------------------------------
// Validated input
// ---------------------------------------------------------------------------

/// An engine input that has passed envelope splitting and schema validation.
///
/// Inputs are immutable after validation; engines receive a shared reference
/// and deserialise their typed input struct from `payload`.
#[derive(Debug, Clone)]
pub struct ValidatedInput {
    pub envelope: RequestEnvelope,
    pub payload: Map<String, Value>,
}

impl ValidatedInput {
    pub fn new(envelope: RequestEnvelope, payload: Map<String, Value>) -> Self {
        Self { envelope, payload }
    }

    /// The payload as a JSON value, for typed deserialisation.
    pub fn payload_value(&self) -> Value {
        Value::Object(self.payload.clone())
    }

    /// Derive the KV cache key for this input: `calc:<engine>:<hash12>`.
    ///
    /// The hash covers the envelope fields (minus the excluded set) merged
    /// with the payload, serialised as canonical JSON: keys sorted, no
    /// whitespace. An explicitly supplied `cache_key` wins.
    pub fn cache_key(&self, engine_name: &str) -> String {
        if let Some(ref key) = self.envelope.cache_key {
            return key.clone();
        }

        let mut merged: BTreeMap<String, Value> = BTreeMap::new();
        if let Value::Object(env) = serde_json::to_value(&self.envelope).unwrap_or(Value::Null) {
            for (k, v) in env {
                if !CACHE_KEY_EXCLUDED_FIELDS.contains(&k.as_str()) {
                    merged.insert(k, v);
                }
            }
        }
        for (k, v) in &self.payload {
            merged.insert(k.clone(), v.clone());
        }

        let canonical = serde_json::to_string(&merged).unwrap_or_default();
        let digest = format!("{:x}", md5::compute(canonical.as_bytes()));
        format!("calc:{}:{}", engine_name, &digest[..12])
    }

    /// Derive the user-scoped key: `user:<user_id>:<engine>:<data_type>:<reading_id>`.
    pub fn user_key(&self, engine_name: &str, data_type: &str, reading_id: &str) -> Option<String> {
        self.envelope.user_id.as_ref().map(|uid| {
            format!("user:{}:{}:{}:{}", uid, engine_name, data_type, reading_id)
        })
    }
}

// ---------------------------------------------------------------------------
// Birth data
// ---------------------------------------------------------------------------

/// Birth data shared by the chart-based engines.
///
/// The local date/time is preserved alongside an IANA timezone; conversion
/// to UTC happens only at the astronomy boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BirthData {
    pub birth_date: NaiveDate,
    /// Local time of birth, "HH:MM" or "HH:MM:SS".
    #[serde(default, with = "opt_hhmm")]
    pub birth_time: Option<NaiveTime>,
    /// (latitude, longitude) in decimal degrees.
    #[serde(default)]
    pub birth_location: Option<(f64, f64)>,
    /// IANA timezone identifier, e.g. "Asia/Kolkata".
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl BirthData {
    /// Range-check coordinates and parse the timezone identifier.
    pub fn validate(&self) -> Result<(), EngineError> {
        if let Some((lat, lon)) = self.birth_location {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(EngineError::invalid_input(
                    "birth_location",
                    format!("latitude {} must be between -90 and 90", lat),
                ));
            }
            if !(-180.0..=180.0).contains(&lon) {
                return Err(EngineError::invalid_input(
                    "birth_location",
                    format!("longitude {} must be between -180 and 180", lon),
                ));
            }
        }
        chrono_tz::Tz::from_str(&self.timezone).map_err(|_| {
            EngineError::invalid_input("timezone", format!("unknown IANA timezone '{}'", self.timezone))
        })?;
        Ok(())
    }

    /// Require an exact birth time, for engines that cannot work without one.
    pub fn require_time(&self) -> Result<NaiveTime, EngineError> {
        self.birth_time.ok_or_else(|| {
            EngineError::invalid_input("birth_time", "this engine requires an exact birth time")
        })
    }

    /// Require birth coordinates.
    pub fn require_location(&self) -> Result<(f64, f64), EngineError> {
        self.birth_location.ok_or_else(|| {
            EngineError::invalid_input("birth_location", "this engine requires birth coordinates")
        })
    }

    /// Local birth moment converted to UTC via the IANA timezone.
    pub fn to_utc(&self) -> Result<DateTime<Utc>, EngineError> {
        let tz = chrono_tz::Tz::from_str(&self.timezone).map_err(|_| {
            EngineError::invalid_input("timezone", format!("unknown IANA timezone '{}'", self.timezone))
        })?;
        let time = self
            .birth_time
            .unwrap_or_else(|| NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        let naive = self.birth_date.and_time(time);
        let local = tz
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| EngineError::invalid_input("birth_time", "nonexistent local time"))?;
        Ok(local.with_timezone(&Utc))
    }
}

/// Serde helper accepting "HH:MM" as well as "HH:MM:SS".
pub mod opt_hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(s) => NaiveTime::parse_from_str(&s, "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(&s, "%H:%M:%S"))
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Engine output
// ---------------------------------------------------------------------------

/// Human-readable interpretation: either rendered text or structured data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormattedOutput {
    Text(String),
    Structured(Value),
}

impl FormattedOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormattedOutput::Text(s) => Some(s),
            FormattedOutput::Structured(_) => None,
        }
    }
}

/// Output assembled from one engine run, before the storage envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOutput {
    pub engine_name: String,
    /// Wall time between validation-complete and output-assembly-complete.
    pub calculation_time_seconds: f64,
    /// Confidence in the result, 0.0-1.0. Engines default to 1.0.
    pub confidence_score: f64,
    pub timestamp: DateTime<Utc>,
    pub raw_data: Value,
    pub formatted_output: FormattedOutput,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_signature: Option<String>,
    pub reality_patches: Vec<String>,
    pub archetypal_themes: Vec<String>,
}

/// Storage-aware envelope around an [`EngineOutput`].
///
/// Outputs are immutable after assembly; an update creates a new reading
/// with a fresh `reading_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredReading {
    #[serde(flatten)]
    pub output: EngineOutput,
    pub reading_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub storage_metadata: Map<String, Value>,
    /// KV keys actually written (or enqueued for write) for this result.
    pub kv_cache_keys: Vec<String>,
    pub d1_table_refs: Vec<String>,
    pub privacy_level: PrivacyLevel,
}

impl StoredReading {
    /// Name of the per-engine persistence table.
    pub fn table_name(engine_name: &str) -> String {
        format!("engine_{}_readings", engine_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input_with(payload: Value) -> ValidatedInput {
        let map = match payload {
            Value::Object(m) => m,
            _ => panic!("payload must be an object"),
        };
        ValidatedInput::new(RequestEnvelope::default(), map)
    }

    #[test]
    fn cache_key_is_deterministic() {
        let input = input_with(json!({"full_name": "A", "birth_date": "2000-01-01"}));
        assert_eq!(input.cache_key("numerology"), input.cache_key("numerology"));
    }

    #[test]
    fn cache_key_ignores_excluded_fields() {
        let mut a = input_with(json!({"full_name": "A", "birth_date": "2000-01-01"}));
        let mut b = a.clone();
        a.envelope.reading_id = Some("abc".into());
        b.envelope.reading_id = Some("xyz".into());
        b.envelope.timestamp = a.envelope.timestamp + chrono::Duration::hours(3);

        let key_a = a.cache_key("numerology");
        let key_b = b.cache_key("numerology");
        assert_eq!(key_a, key_b);
        assert!(key_a.starts_with("calc:numerology:"));
        assert_eq!(key_a.len(), "calc:numerology:".len() + 12);
    }

    #[test]
    fn cache_key_changes_with_payload() {
        let a = input_with(json!({"full_name": "A"}));
        let b = input_with(json!({"full_name": "B"}));
        assert_ne!(a.cache_key("numerology"), b.cache_key("numerology"));
    }

    #[test]
    fn explicit_cache_key_wins() {
        let mut input = input_with(json!({"x": 1}));
        input.envelope.cache_key = Some("calc:custom:deadbeef0123".into());
        assert_eq!(input.cache_key("tarot"), "calc:custom:deadbeef0123");
    }

    #[test]
    fn user_key_format() {
        let mut input = input_with(json!({}));
        input.envelope.user_id = Some("u1".into());
        assert_eq!(
            input.user_key("tarot", "reading", "r9").as_deref(),
            Some("user:u1:tarot:reading:r9")
        );
        input.envelope.user_id = None;
        assert!(input.user_key("tarot", "reading", "r9").is_none());
    }

    #[test]
    fn birth_data_validates_ranges() {
        let mut bd = BirthData {
            birth_date: NaiveDate::from_ymd_opt(1991, 8, 13).unwrap(),
            birth_time: None,
            birth_location: Some((12.9716, 77.5946)),
            timezone: "Asia/Kolkata".into(),
        };
        assert!(bd.validate().is_ok());

        bd.birth_location = Some((91.0, 0.0));
        assert!(bd.validate().is_err());

        bd.birth_location = Some((0.0, 181.0));
        assert!(bd.validate().is_err());

        bd.birth_location = Some((0.0, 0.0));
        bd.timezone = "Not/AZone".into();
        assert!(bd.validate().is_err());
    }

    #[test]
    fn birth_time_parses_hhmm() {
        let bd: BirthData = serde_json::from_value(json!({
            "birth_date": "1991-08-13",
            "birth_time": "13:31",
            "birth_location": [12.9716, 77.5946],
            "timezone": "Asia/Kolkata"
        }))
        .unwrap();
        assert_eq!(bd.birth_time, NaiveTime::from_hms_opt(13, 31, 0));
    }

    #[test]
    fn birth_to_utc_applies_timezone() {
        let bd: BirthData = serde_json::from_value(json!({
            "birth_date": "1991-08-13",
            "birth_time": "13:31",
            "timezone": "Asia/Kolkata"
        }))
        .unwrap();
        let utc = bd.to_utc().unwrap();
        // IST is UTC+05:30
        assert_eq!(utc.format("%H:%M").to_string(), "08:01");
    }

    #[test]
    fn privacy_level_serialises_lowercase() {
        assert_eq!(
            serde_json::to_string(&PrivacyLevel::Biometric).unwrap(),
            "\"biometric\""
        );
        let level: PrivacyLevel = serde_json::from_str("\"enhanced\"").unwrap();
        assert_eq!(level, PrivacyLevel::Enhanced);
    }
}
