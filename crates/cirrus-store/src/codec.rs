//! Text encoding for list-valued columns.
//!
//! Order and exact values are preserved: `f64` goes through serde_json's
//! round-trip float parser.

use cirrus_core::StoreError;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::StoreResult;

pub fn encode_list<T: Serialize>(values: &[T]) -> StoreResult<String> {
    serde_json::to_string(values)
        .map_err(|e| StoreError::persistence(format!("Failed to encode list: {}", e)))
}

/// `None` (SQL NULL) and a literal `null` both decode to an empty list.
pub fn decode_list<T: DeserializeOwned>(raw: Option<&str>) -> StoreResult<Vec<T>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    serde_json::from_str::<Option<Vec<T>>>(raw)
        .map(Option::unwrap_or_default)
        .map_err(|e| StoreError::parse(format!("Failed to decode list: {}", e)))
}
