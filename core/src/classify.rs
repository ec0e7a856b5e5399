//! Detection of error envelopes inside otherwise valid responses.
//!
//! The service reports failures as `{"message": ..., "error": ...}` objects,
//! sometimes with a 2xx status. A body is an error only when it is a JSON
//! object that decodes into that shape and at least one of the two fields is
//! non-empty. Arrays, scalars and objects that do not fit the shape are
//! resource payloads.

use serde::Deserialize;
use serde_json::Value;

use crate::error::BusinessError;

/// Classifies a raw response body.
pub fn classify(body: &[u8]) -> Option<BusinessError> {
    let value: Value = serde_json::from_slice(body).ok()?;
    classify_value(&value)
}

/// Classifies an already parsed response body.
pub fn classify_value(value: &Value) -> Option<BusinessError> {
    if !value.is_object() {
        return None;
    }
    let err = BusinessError::deserialize(value).ok()?;
    (!err.is_empty()).then_some(err)
}
