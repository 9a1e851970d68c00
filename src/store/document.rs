//! Document mutation helpers shared by the store implementations

use super::{ProfileRecord, StoreError, UPDATED_AT_FIELD};
use crate::session::UserId;
use chrono::Utc;
use serde_json::{Map, Value};

pub(crate) type Document = Map<String, Value>;

/// Decode a stored document into a profile record
pub(crate) fn to_record(user_id: &UserId, doc: Option<&Document>) -> Result<ProfileRecord, StoreError> {
    let mut record: ProfileRecord = match doc {
        Some(doc) => serde_json::from_value(Value::Object(doc.clone()))?,
        None => ProfileRecord::default(),
    };
    if record.uid.is_empty() {
        record.uid = user_id.to_string();
    }
    Ok(record)
}

pub(crate) fn set_field(doc: &mut Document, field: &str, value: Value, merge: bool) {
    if !merge {
        doc.clear();
    }
    doc.insert(field.to_string(), value);
}

pub(crate) fn add_to_array(doc: &mut Document, field: &str, value: Value) {
    match doc.get_mut(field) {
        Some(Value::Array(items)) => {
            if !items.contains(&value) {
                items.push(value);
            }
        }
        _ => {
            doc.insert(field.to_string(), Value::Array(vec![value]));
        }
    }
}

pub(crate) fn remove_from_array(doc: &mut Document, field: &str, value: &Value) {
    if let Some(Value::Array(items)) = doc.get_mut(field) {
        items.retain(|item| item != value);
    }
}

pub(crate) fn stamp(doc: &mut Document) {
    doc.insert(
        UPDATED_AT_FIELD.to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
}
