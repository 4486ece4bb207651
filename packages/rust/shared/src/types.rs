//! Catalog record types.

use serde::Serialize;
use serde_json::{Map, Value};

/// Output field holding the discovered publication URL.
pub const PUBLICATION_URL_FIELD: &str = "publication_url";

/// Output field holding the resolved DOI.
pub const DOI_FIELD: &str = "doi";

/// One entry of the seed catalog: an open-ended JSON object.
///
/// Fields are opaque to pubtrace apart from the documentation URL field,
/// and keep their original order when written back out.
pub type CatalogRecord = Map<String, Value>;

// ---------------------------------------------------------------------------
// EnrichedRecord
// ---------------------------------------------------------------------------

/// A catalog record plus the `publication_url` and `doi` fields.
///
/// Both fields are always present once a record is assembled; a lookup that
/// found nothing is stored as JSON `null`, never omitted. The record is
/// immutable after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EnrichedRecord(CatalogRecord);

impl EnrichedRecord {
    /// Assemble an enriched record from the original fields.
    ///
    /// Existing `publication_url`/`doi` keys on the input are overwritten in
    /// place; new keys are appended after the original fields.
    pub fn new(mut record: CatalogRecord, publication_url: Option<String>, doi: Option<String>) -> Self {
        record.insert(PUBLICATION_URL_FIELD.to_string(), optional_string(publication_url));
        record.insert(DOI_FIELD.to_string(), optional_string(doi));
        Self(record)
    }

    /// A record for which nothing was discovered.
    pub fn unenriched(record: CatalogRecord) -> Self {
        Self::new(record, None, None)
    }

    /// The discovered publication URL, if any.
    pub fn publication_url(&self) -> Option<&str> {
        self.0.get(PUBLICATION_URL_FIELD).and_then(Value::as_str)
    }

    /// The resolved DOI, if any.
    pub fn doi(&self) -> Option<&str> {
        self.0.get(DOI_FIELD).and_then(Value::as_str)
    }

    /// All fields, including the two enrichment fields.
    pub fn fields(&self) -> &CatalogRecord {
        &self.0
    }

    /// Consume the record and return its fields.
    pub fn into_fields(self) -> CatalogRecord {
        self.0
    }
}

fn optional_string(value: Option<String>) -> Value {
    value.map_or(Value::Null, Value::String)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> CatalogRecord {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn unenriched_has_explicit_nulls() {
        let rec = EnrichedRecord::unenriched(record(json!({"title": "Rivers"})));
        let out = serde_json::to_value(&rec).unwrap();
        assert_eq!(
            out,
            json!({"title": "Rivers", "publication_url": null, "doi": null})
        );
        assert!(rec.publication_url().is_none());
        assert!(rec.doi().is_none());
    }

    #[test]
    fn new_keeps_field_order_and_appends() {
        let rec = EnrichedRecord::new(
            record(json!({"title": "Rivers", "id": "r-1", "docs": "https://d.example/r"})),
            Some("https://example.org/paper".into()),
            Some("10.1234/abcd".into()),
        );
        let keys: Vec<&str> = rec.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, ["title", "id", "docs", "publication_url", "doi"]);
        assert_eq!(rec.publication_url(), Some("https://example.org/paper"));
        assert_eq!(rec.doi(), Some("10.1234/abcd"));
    }

    #[test]
    fn existing_enrichment_keys_are_replaced_in_place() {
        let rec = EnrichedRecord::new(
            record(json!({"doi": "stale", "title": "Rivers"})),
            None,
            None,
        );
        let keys: Vec<&str> = rec.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, ["doi", "title", "publication_url"]);
        assert_eq!(rec.fields()["doi"], Value::Null);
    }

    #[test]
    fn serializes_unicode_unescaped() {
        let rec = EnrichedRecord::unenriched(record(json!({"title": "Données São Paulo"})));
        let text = serde_json::to_string(&rec).unwrap();
        assert!(text.contains("Données São Paulo"));
    }
}
