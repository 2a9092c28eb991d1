//! JSON encoding of the persisted planet list.
//!
//! The stored value is a JSON array of `{id, title, image}` objects. Decoding
//! is tolerant per element: a malformed entry is dropped with a warning
//! instead of discarding the whole list. Only a value that is not a JSON
//! array at all is reported as a parse error.

use std::collections::HashSet;

use serde_json::Value;
use tracing::warn;

use crate::{CoreError, PlanetRecord};

/// Result of decoding a stored list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    pub records: Vec<PlanetRecord>,
    /// Number of elements dropped as invalid or duplicate.
    pub skipped: usize,
}

pub fn encode_list(records: &[PlanetRecord]) -> Result<String, CoreError> {
    serde_json::to_string(records).map_err(|e| CoreError::StorageWrite(format!("encode: {e}")))
}

pub fn decode_list(raw: &str) -> Result<Decoded, CoreError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| CoreError::StorageParse(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(CoreError::StorageParse("top-level value is not an array".into()));
    };

    let mut seen = HashSet::new();
    let mut decoded = Decoded::default();
    for (index, item) in items.into_iter().enumerate() {
        let record = match serde_json::from_value::<PlanetRecord>(item) {
            Ok(r) => r,
            Err(e) => {
                warn!(index, error = %e, "skipping invalid planet entry");
                decoded.skipped += 1;
                continue;
            }
        };
        if !seen.insert(record.id.clone()) {
            warn!(index, id = %record.id, "skipping planet entry with duplicate id");
            decoded.skipped += 1;
            continue;
        }
        decoded.records.push(record);
    }
    Ok(decoded)
}
