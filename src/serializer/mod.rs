//! Conversion of provider records into JSON-safe values.
//!
//! The identity provider hands back typed records (users, sessions, identities)
//! holding timestamps and nested records. Before they go on the wire they are
//! flattened into plain JSON: mappings and sequences are rebuilt element by
//! element, timestamps become ISO-8601 strings, and records are replaced by
//! the mapping of their fields. Scalars pass through unchanged.
//!
//! Records are trait objects, so a record can in principle reach itself. The
//! walk keeps the records on the current path and fails with
//! [`SerializeError::CyclicStructure`] instead of recursing forever; anything
//! nested deeper than [`MAX_DEPTH`] fails with [`SerializeError::DepthExceeded`].

mod error;
mod value;

pub use error::SerializeError;
pub use value::{FieldExposing, Number, Timestamp, Value};

use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

/// Maximum nesting accepted by [`serialize`].
pub const MAX_DEPTH: usize = 512;

/// Convert `value` into a JSON-safe value.
///
/// # Errors
/// Returns an error if a record is reachable from itself, the input nests
/// deeper than [`MAX_DEPTH`], or a float is NaN or infinite.
pub fn serialize(value: &Value) -> Result<JsonValue, SerializeError> {
    Walker::default().visit(value, 0)
}

#[derive(Default)]
struct Walker {
    // addresses of the records currently being expanded
    path: Vec<*const ()>,
}

impl Walker {
    fn visit(&mut self, value: &Value, depth: usize) -> Result<JsonValue, SerializeError> {
        if depth > MAX_DEPTH {
            return Err(SerializeError::DepthExceeded { limit: MAX_DEPTH });
        }

        match value {
            Value::Mapping(entries) => self.visit_mapping(entries, depth),
            Value::Sequence(items) => items
                .iter()
                .map(|item| self.visit(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(JsonValue::Array),
            Value::Timestamp(ts) => Ok(JsonValue::String(ts.to_iso8601())),
            Value::Record(record) => self.visit_record(record, depth),
            Value::Null => Ok(JsonValue::Null),
            Value::Bool(b) => Ok(JsonValue::Bool(*b)),
            Value::Number(n) => n
                .to_json()
                .map(JsonValue::Number)
                .ok_or(SerializeError::NonFiniteNumber),
            Value::String(s) => Ok(JsonValue::String(s.clone())),
        }
    }

    fn visit_mapping(
        &mut self,
        entries: &[(String, Value)],
        depth: usize,
    ) -> Result<JsonValue, SerializeError> {
        let mut map = Map::with_capacity(entries.len());
        for (key, value) in entries {
            map.insert(key.clone(), self.visit(value, depth + 1)?);
        }
        Ok(JsonValue::Object(map))
    }

    fn visit_record(
        &mut self,
        record: &Arc<dyn FieldExposing>,
        depth: usize,
    ) -> Result<JsonValue, SerializeError> {
        let address = Arc::as_ptr(record).cast::<()>();
        if self.path.contains(&address) {
            return Err(SerializeError::CyclicStructure {
                type_name: record.type_name(),
            });
        }

        self.path.push(address);
        let result = self.visit_mapping(&record.fields(), depth);
        self.path.pop();

        result
    }
}
