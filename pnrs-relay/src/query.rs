//! Read back the records of one investigation

use pnrs_common::{Collection, Error, PersonRecord, Result};
use serde::{Deserialize, Serialize};

/// Output shape of one investigation record.
///
/// Missing strings render as `""` and a missing age as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvestigationRecord {
    /// Store-assigned identifier of the destination record
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i64>,
    pub email: String,
    pub gender: String,
    pub phone: String,
    pub invest_id: String,
}

impl From<PersonRecord> for InvestigationRecord {
    fn from(record: PersonRecord) -> Self {
        Self {
            id: record.id.unwrap_or_default(),
            first_name: record.first_name.unwrap_or_default(),
            last_name: record.last_name.unwrap_or_default(),
            age: record.age,
            email: record.email.unwrap_or_default(),
            gender: record.gender.unwrap_or_default(),
            phone: record.phone,
            invest_id: record.invest_id.unwrap_or_default(),
        }
    }
}

/// All destination records tagged with `invest_id`.
///
/// Returns [`Error::NotFound`] rather than an empty list when nothing matches.
pub async fn get_by_investigation(
    destination: &Collection,
    invest_id: &str,
) -> Result<Vec<InvestigationRecord>> {
    let documents = destination.find_by_investigation_id(invest_id).await?;

    if documents.is_empty() {
        return Err(Error::NotFound(format!(
            "No records for investigation '{}'",
            invest_id
        )));
    }

    documents
        .iter()
        .map(|doc| -> Result<InvestigationRecord> { Ok(doc.to_record()?.into()) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_map_to_defaults() {
        let record = PersonRecord {
            id: Some("abc".to_string()),
            invest_id: Some("INV-1".to_string()),
            ..PersonRecord::new("+1 555 0100")
        };

        let out = InvestigationRecord::from(record);

        assert_eq!(out.id, "abc");
        assert_eq!(out.phone, "+1 555 0100");
        assert_eq!(out.invest_id, "INV-1");
        assert_eq!(out.first_name, "");
        assert_eq!(out.email, "");
        assert_eq!(out.age, None);
    }

    #[test]
    fn test_missing_age_serializes_as_null() {
        let out = InvestigationRecord::default();
        let json = serde_json::to_value(&out).unwrap();
        assert!(json["age"].is_null());
    }
}
