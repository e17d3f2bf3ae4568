//! JSON codec for update batches and operations.
//!
//! The wire shape is the one pushed by the transport:
//!
//! ```json
//! {
//!   "updates": [
//!     {
//!       "rooms": ["r"],
//!       "model": {"a": 1},
//!       "operations": [
//!         {"op": "edit", "concern": "items", "query": {"id": 2}, "model": {"v": "z"}}
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `model`, `operations`, and `query` are optional on the wire; defaults are
//! empty. Unknown `op` names decode to [`OpKind::Custom`] — whether they are
//! applicable is only known at apply time, against the handler registry.

use serde_json::{Map, Value};

use crate::model_patch::types::{OpKind, Operation, PatchError, Update, UpdateBatch};

// ── Decoding ──────────────────────────────────────────────────────────────

/// Decode a transport payload into an [`UpdateBatch`].
///
/// A payload without an `updates` field decodes to an empty batch.
pub fn update_batch_from_json(data: &Value) -> Result<UpdateBatch, PatchError> {
    let Some(updates) = data.get("updates") else {
        return Ok(UpdateBatch::default());
    };
    let updates = updates
        .as_array()
        .ok_or_else(|| invalid("updates must be an array"))?;
    Ok(UpdateBatch {
        updates: updates.iter().map(update_from_json).collect::<Result<_, _>>()?,
    })
}

/// Decode a single update.
pub fn update_from_json(data: &Value) -> Result<Update, PatchError> {
    let rooms = data
        .get("rooms")
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("update must list rooms"))?;
    let rooms = rooms
        .iter()
        .map(|room| {
            room.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid("room must be a string"))
        })
        .collect::<Result<_, _>>()?;
    Ok(Update {
        rooms,
        model: object_field(data, "model")?,
        operations: operations_field(data)?,
    })
}

/// Decode a single operation.
pub fn operation_from_json(data: &Value) -> Result<Operation, PatchError> {
    let name = data
        .get("op")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("operation must name an op"))?;
    let concern = match data.get("concern") {
        None => String::new(),
        Some(value) => value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| invalid("concern must be a string"))?,
    };
    Ok(Operation {
        kind: OpKind::from_name(name),
        concern,
        model: data.get("model").cloned().unwrap_or(Value::Null),
        query: object_field(data, "query")?,
        operations: operations_field(data)?,
        context: None,
    })
}

fn object_field(data: &Value, field: &str) -> Result<Map<String, Value>, PatchError> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(_) => Err(invalid(&format!("{field} must be an object"))),
    }
}

fn operations_field(data: &Value) -> Result<Vec<Operation>, PatchError> {
    match data.get("operations") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(ops)) => ops.iter().map(operation_from_json).collect(),
        Some(_) => Err(invalid("operations must be an array")),
    }
}

fn invalid(reason: &str) -> PatchError {
    PatchError::InvalidUpdate(reason.to_string())
}

// ── Encoding ──────────────────────────────────────────────────────────────

/// Encode an [`UpdateBatch`] to the wire shape.
pub fn update_batch_to_json(batch: &UpdateBatch) -> Value {
    let updates: Vec<Value> = batch.updates.iter().map(update_to_json).collect();
    let mut out = Map::new();
    out.insert("updates".to_string(), Value::Array(updates));
    Value::Object(out)
}

/// Encode a single update; empty fields are omitted.
pub fn update_to_json(update: &Update) -> Value {
    let mut out = Map::new();
    out.insert(
        "rooms".to_string(),
        Value::Array(update.rooms.iter().cloned().map(Value::String).collect()),
    );
    if !update.model.is_empty() {
        out.insert("model".to_string(), Value::Object(update.model.clone()));
    }
    if !update.operations.is_empty() {
        out.insert(
            "operations".to_string(),
            Value::Array(update.operations.iter().map(operation_to_json).collect()),
        );
    }
    Value::Object(out)
}

/// Encode a single operation; empty fields and apply-time `context` are
/// omitted.
pub fn operation_to_json(operation: &Operation) -> Value {
    let mut out = Map::new();
    out.insert(
        "op".to_string(),
        Value::String(operation.kind.name().to_string()),
    );
    if !operation.concern.is_empty() {
        out.insert(
            "concern".to_string(),
            Value::String(operation.concern.clone()),
        );
    }
    if !operation.model.is_null() {
        out.insert("model".to_string(), operation.model.clone());
    }
    if !operation.query.is_empty() {
        out.insert("query".to_string(), Value::Object(operation.query.clone()));
    }
    if !operation.operations.is_empty() {
        out.insert(
            "operations".to_string(),
            Value::Array(operation.operations.iter().map(operation_to_json).collect()),
        );
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_batch() {
        let data = json!({
            "updates": [{
                "rooms": ["news"],
                "model": {"unread": 3},
                "operations": [
                    {"op": "push", "concern": "items", "model": {"id": 1}},
                    {"op": "edit", "concern": "items", "query": {"id": 1}, "model": {"seen": true}}
                ]
            }]
        });
        let batch = update_batch_from_json(&data).unwrap();
        assert_eq!(batch.updates.len(), 1);
        let update = &batch.updates[0];
        assert_eq!(update.rooms, vec!["news"]);
        assert_eq!(update.model.get("unread"), Some(&json!(3)));
        assert_eq!(update.operations.len(), 2);
        assert_eq!(update.operations[0].kind, OpKind::Push);
        assert_eq!(update.operations[1].kind, OpKind::Edit);
        assert_eq!(update.operations[1].query.get("id"), Some(&json!(1)));
    }

    #[test]
    fn missing_updates_decodes_to_empty_batch() {
        let batch = update_batch_from_json(&json!({})).unwrap();
        assert!(batch.updates.is_empty());
    }

    #[test]
    fn optional_fields_default() {
        let update = update_from_json(&json!({"rooms": []})).unwrap();
        assert!(update.rooms.is_empty());
        assert!(update.model.is_empty());
        assert!(update.operations.is_empty());

        let op = operation_from_json(&json!({"op": "push"})).unwrap();
        assert_eq!(op.concern, "");
        assert_eq!(op.model, Value::Null);
        assert!(op.query.is_empty());
    }

    #[test]
    fn unknown_op_name_decodes_to_custom() {
        let op = operation_from_json(&json!({"op": "frobnicate"})).unwrap();
        assert_eq!(op.kind, OpKind::Custom("frobnicate".to_string()));
    }

    #[test]
    fn missing_rooms_is_invalid() {
        let err = update_from_json(&json!({"model": {}})).unwrap_err();
        assert!(matches!(err, PatchError::InvalidUpdate(_)));
    }

    #[test]
    fn bad_shapes_are_invalid() {
        assert!(update_batch_from_json(&json!({"updates": 1})).is_err());
        assert!(update_from_json(&json!({"rooms": [1]})).is_err());
        assert!(operation_from_json(&json!({"op": "push", "query": []})).is_err());
        assert!(operation_from_json(&json!({"concern": "x"})).is_err());
    }

    #[test]
    fn encode_decode_identity() {
        let data = json!({
            "updates": [{
                "rooms": ["a", "b"],
                "model": {"x": 1},
                "operations": [
                    {"op": "remove", "concern": "items", "query": {"id": 2}},
                    {"op": "edit", "concern": "items", "query": {"id": 3},
                     "operations": [{"op": "push", "concern": "tags", "model": "t"}]}
                ]
            }]
        });
        let batch = update_batch_from_json(&data).unwrap();
        assert_eq!(update_batch_to_json(&batch), data);
    }
}
