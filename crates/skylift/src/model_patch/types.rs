//! Core types for the model patch module.

use serde_json::{Map, Value};
use thiserror::Error;

/// Identifier of a logical channel that scopes update delivery.
pub type RoomId = String;

// ── Error ─────────────────────────────────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum PatchError {
    /// An operation named a handler that is not registered.
    #[error("UNKNOWN_OPERATION: {0}")]
    UnknownOperation(String),
    /// A handler tried to replace the view-model root.
    #[error("ROOT_REPLACEMENT")]
    RootReplacement,
    /// An inbound update batch did not have the expected shape.
    #[error("INVALID_UPDATE: {0}")]
    InvalidUpdate(String),
}

// ── Operation kind ────────────────────────────────────────────────────────

/// Tag of a patch operation.
///
/// The four built-in kinds are handled directly by the
/// [`Patcher`](super::apply::Patcher); `Custom` kinds (and overrides of the
/// built-in names) go through the registered handler map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpKind {
    /// Append `model` to the target array.
    Push,
    /// Prepend `model` to the target array.
    Unshift,
    /// Splice out the first array element matching `query`.
    Remove,
    /// Merge `model` and nested `operations` onto the first array element
    /// matching `query`.
    Edit,
    /// A host-registered operation.
    Custom(String),
}

impl OpKind {
    /// The wire name of this operation.
    pub fn name(&self) -> &str {
        match self {
            OpKind::Push => "push",
            OpKind::Unshift => "unshift",
            OpKind::Remove => "remove",
            OpKind::Edit => "edit",
            OpKind::Custom(name) => name,
        }
    }

    /// Parse a wire name. Unrecognized names become `Custom`; whether they
    /// are applicable is decided at apply time against the handler registry.
    pub fn from_name(name: &str) -> OpKind {
        match name {
            "push" => OpKind::Push,
            "unshift" => OpKind::Unshift,
            "remove" => OpKind::Remove,
            "edit" => OpKind::Edit,
            other => OpKind::Custom(other.to_string()),
        }
    }
}

// ── Operation ─────────────────────────────────────────────────────────────

/// A single patch action applied to a concern-resolved target.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub kind: OpKind,
    /// Dot-separated path locating the target within the view-model.
    pub concern: String,
    /// Operation payload: the element to insert for `push`/`unshift`, the
    /// fields to merge for `edit`, or whatever a custom handler expects.
    pub model: Value,
    /// Field/value pairs an array element must all equal (primitive equality
    /// only) for `remove`/`edit` to select it.
    pub query: Map<String, Value>,
    /// Nested operations applied onto the matched element by `edit`.
    pub operations: Vec<Operation>,
    /// The matched element, recorded while the operation is applied. Not
    /// part of the wire format.
    pub context: Option<Value>,
}

impl Operation {
    /// An operation with the given kind and concern, and empty payloads.
    pub fn new(kind: OpKind, concern: impl Into<String>) -> Operation {
        Operation {
            kind,
            concern: concern.into(),
            model: Value::Null,
            query: Map::new(),
            operations: Vec::new(),
            context: None,
        }
    }

    pub fn with_model(mut self, model: Value) -> Operation {
        self.model = model;
        self
    }

    pub fn with_query(mut self, query: Map<String, Value>) -> Operation {
        self.query = query;
        self
    }

    pub fn with_operations(mut self, operations: Vec<Operation>) -> Operation {
        self.operations = operations;
        self
    }
}

// ── Update ────────────────────────────────────────────────────────────────

/// A room-scoped incremental update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Update {
    /// Rooms this update targets.
    pub rooms: Vec<RoomId>,
    /// Fields shallow-merged onto the view-model root before operations run.
    pub model: Map<String, Value>,
    /// Patch operations, applied in order.
    pub operations: Vec<Operation>,
}

/// A batch of updates as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateBatch {
    pub updates: Vec<Update>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn op_kind_name_roundtrip() {
        for name in ["push", "unshift", "remove", "edit"] {
            assert_eq!(OpKind::from_name(name).name(), name);
        }
        let custom = OpKind::from_name("frobnicate");
        assert_eq!(custom, OpKind::Custom("frobnicate".to_string()));
        assert_eq!(custom.name(), "frobnicate");
    }

    #[test]
    fn operation_builder() {
        let op = Operation::new(OpKind::Push, "list.items").with_model(json!({"id": 1}));
        assert_eq!(op.kind, OpKind::Push);
        assert_eq!(op.concern, "list.items");
        assert_eq!(op.model, json!({"id": 1}));
        assert!(op.query.is_empty());
        assert!(op.context.is_none());
    }
}
