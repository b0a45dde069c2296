//! Stored documents and the person record model
//!
//! The store moves [`Document`]s: untyped JSON objects that are copied
//! byte-for-byte in meaning, unknown and malformed fields included.
//! [`PersonRecord`] is the typed, coercing view used when a document is read
//! for output. Every descriptive field is optional so partially populated
//! documents still load; defaults are substituted only where a record is
//! rendered.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A raw stored document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier. Lives in the row, not in the document.
    #[serde(skip)]
    pub id: Option<String>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { id: None, fields }
    }

    /// Encode a typed record as a document
    pub fn from_record(record: &PersonRecord) -> serde_json::Result<Self> {
        let fields: Map<String, Value> = serde_json::from_value(serde_json::to_value(record)?)?;
        Ok(Self {
            id: record.id.clone(),
            fields,
        })
    }

    /// Decode into the coercing typed view
    pub fn to_record(&self) -> serde_json::Result<PersonRecord> {
        let mut record: PersonRecord = serde_json::from_value(Value::Object(self.fields.clone()))?;
        record.id = self.id.clone();
        Ok(record)
    }

    /// Matching key as stored in the phone column
    pub fn phone(&self) -> String {
        self.fields
            .get("phone")
            .cloned()
            .and_then(value_to_string)
            .unwrap_or_default()
    }

    /// Investigation tag as stored in the invest_id column
    pub fn invest_id(&self) -> Option<String> {
        self.fields.get("invest_id").cloned().and_then(value_to_string)
    }

    /// Set the investigation tag, leaving every other field as it was
    pub fn tag(&mut self, invest_id: &str) {
        self.fields
            .insert("invest_id".to_string(), Value::String(invest_id.to_string()));
    }
}

/// A contact document keyed by phone number
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Store-assigned identifier. Lives in the row, not in the document.
    #[serde(skip)]
    pub id: Option<String>,

    /// Matching key
    #[serde(default, deserialize_with = "coerce_phone")]
    pub phone: String,

    #[serde(default, deserialize_with = "coerce_string", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(default, deserialize_with = "coerce_string", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(default, deserialize_with = "coerce_age", skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,

    #[serde(default, deserialize_with = "coerce_string", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "coerce_string", skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    /// Investigation tag; present only on destination copies
    #[serde(default, deserialize_with = "coerce_string", skip_serializing_if = "Option::is_none")]
    pub invest_id: Option<String>,

    /// Any other document fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PersonRecord {
    /// Create a record holding only a phone number
    pub fn new(phone: impl Into<String>) -> Self {
        Self {
            phone: phone.into(),
            ..Default::default()
        }
    }
}

/// Render scalar JSON values as text; anything else is treated as absent
fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn coerce_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn coerce_phone<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// Integers, integral floats and integer strings become an age
fn coerce_age<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let age = match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    Ok(age)
}
