use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::RecordId;

/// A partial update: top-level field name to new value.
pub type Fields = serde_json::Map<String, Value>;

/// A document that can be kept in a [`RecordStore`](crate::RecordStore).
///
/// Records serialize to a JSON object. The `id` field is owned by the store
/// and cannot be changed by an update.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the collection the record lives in.
    const COLLECTION: &'static str;

    /// Top-level fields backed by a unique index.
    const UNIQUE_FIELDS: &'static [&'static str];

    /// Returns the record's id.
    fn id(&self) -> RecordId;
}

/// Reads a top-level field of a serialized record as a comparable string.
///
/// Missing and `null` fields yield `None` and never take part in a unique
/// index.
pub fn field_value(document: &Value, field: &str) -> Option<String> {
    match document.get(field)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_value_string() {
        let doc = json!({"code": "T77050903"});
        assert_eq!(field_value(&doc, "code").as_deref(), Some("T77050903"));
    }

    #[test]
    fn test_field_value_missing_or_null() {
        let doc = json!({"code": null});
        assert_eq!(field_value(&doc, "code"), None);
        assert_eq!(field_value(&doc, "phone"), None);
    }

    #[test]
    fn test_field_value_non_string() {
        let doc = json!({"count": 3});
        assert_eq!(field_value(&doc, "count").as_deref(), Some("3"));
    }
}
