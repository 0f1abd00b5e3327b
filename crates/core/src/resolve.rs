//! Field resolution.
//!
//! Turns an enumerated [`FieldSet`] into a flat, ordered map of field name to
//! plain JSON value. Every deferred field is evaluated exactly once per pass;
//! the first failure aborts the pass with no partial result, so a caller
//! never sees a half-resolved request.

use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    context::WorkflowContext,
    error::WorkflowError,
    request::{FieldEntry, FieldSet},
};

/// Resolves every field in the set against the context.
///
/// Output iteration order matches declaration order, which keeps the later
/// partitioning into path parameters and body deterministic.
pub fn resolve_fields(
    fields: &FieldSet<'_>,
    context: &WorkflowContext,
) -> Result<IndexMap<String, Value>, WorkflowError> {
    let mut resolved = IndexMap::with_capacity(fields.len());
    for (name, entry) in fields.iter() {
        let value = match entry {
            FieldEntry::Deferred(field) => field.resolve_json(name, context)?,
            FieldEntry::Plain(value) => value.clone(),
            FieldEntry::Absent => Value::Null,
        };
        resolved.insert(name.to_string(), value);
    }
    Ok(resolved)
}
