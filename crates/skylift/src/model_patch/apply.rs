//! Patch application: field merges plus concern-resolved operations.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use skylift_concern::{self as concern, Resolved};

use super::types::{OpKind, Operation, PatchError, Update};

/// A registered operation handler.
///
/// Receives the concern-resolved target (`None` when resolution stopped at a
/// missing step) and the operation being applied. A handler either mutates
/// the target in place and returns `Ok(None)`, or returns `Ok(Some(value))`
/// to replace the value at the target slot.
pub type OperationHandler =
    Box<dyn Fn(Option<&mut Value>, &mut Operation) -> Result<Option<Value>, PatchError>>;

/// Applies updates to view-model documents.
///
/// The four built-in operation kinds are dispatched directly; host code can
/// extend the set with [`register`](Patcher::register), which also overrides
/// a built-in when registered under its name.
#[derive(Default)]
pub struct Patcher {
    handlers: IndexMap<String, OperationHandler>,
}

impl Patcher {
    pub fn new() -> Patcher {
        Patcher::default()
    }

    /// Register (or override) the handler for `name`, effective for
    /// subsequent patch applications.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Option<&mut Value>, &mut Operation) -> Result<Option<Value>, PatchError> + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    /// Shallow-merge `update.model` onto the view-model root (later keys
    /// overwrite), then apply `update.operations` in listed order.
    ///
    /// Operations already applied when an error occurs are not rolled back;
    /// the error aborts the remainder of this call only.
    pub fn apply_changes(
        &self,
        view_model: &mut Value,
        update: &mut Update,
    ) -> Result<(), PatchError> {
        merge_fields(view_model, &update.model);
        self.apply_operations(view_model, &mut update.operations)
    }

    /// Apply a sequence of operations in order.
    pub fn apply_operations(
        &self,
        view_model: &mut Value,
        operations: &mut [Operation],
    ) -> Result<(), PatchError> {
        for operation in operations.iter_mut() {
            self.apply_operation(view_model, operation)?;
        }
        Ok(())
    }

    fn apply_operation(
        &self,
        view_model: &mut Value,
        operation: &mut Operation,
    ) -> Result<(), PatchError> {
        let resolved = concern::resolve(view_model, &operation.concern);
        let slot = resolved.target_path();

        // Registered handlers win, including over built-in names.
        if let Some(handler) = self.handlers.get(operation.kind.name()) {
            let replacement = {
                let target = if resolved.is_root() {
                    Some(&mut *view_model)
                } else {
                    concern::get_mut(view_model, &slot)
                };
                handler(target, operation)?
            };
            return match replacement {
                Some(value) => write_back(view_model, &resolved, value),
                None => Ok(()),
            };
        }

        let kind = operation.kind.clone();
        let target = if resolved.is_root() {
            Some(view_model)
        } else {
            concern::get_mut(view_model, &slot)
        };
        match kind {
            OpKind::Push => {
                if let Some(Value::Array(arr)) = target {
                    arr.push(operation.model.clone());
                }
                Ok(())
            }
            OpKind::Unshift => {
                if let Some(Value::Array(arr)) = target {
                    arr.insert(0, operation.model.clone());
                }
                Ok(())
            }
            OpKind::Remove | OpKind::Edit => {
                let Some(Value::Array(arr)) = target else {
                    return Ok(());
                };
                let Some(index) = find_match(arr, &operation.query) else {
                    return Ok(());
                };
                if kind == OpKind::Remove {
                    operation.context = Some(arr.remove(index));
                } else {
                    let element = &mut arr[index];
                    if let Value::Object(fields) = &operation.model {
                        merge_fields(element, fields);
                    }
                    // Nested operations are taken out so the recursion can
                    // borrow them independently of the matched element.
                    let mut nested = std::mem::take(&mut operation.operations);
                    let result = self.apply_operations(element, &mut nested);
                    operation.operations = nested;
                    operation.context = Some(element.clone());
                    result?;
                }
                Ok(())
            }
            OpKind::Custom(name) => Err(PatchError::UnknownOperation(name)),
        }
    }
}

/// Shallow-merge `fields` onto an object value; later keys overwrite. A
/// non-object destination is left untouched.
pub fn merge_fields(dst: &mut Value, fields: &Map<String, Value>) {
    if let Value::Object(map) = dst {
        for (key, value) in fields {
            map.insert(key.clone(), value.clone());
        }
    }
}

/// First array element whose fields equal every key of `query`.
///
/// Equality is primitive-only: a composite query value (object or array)
/// never matches. An empty query matches the first element.
fn find_match(arr: &[Value], query: &Map<String, Value>) -> Option<usize> {
    arr.iter().position(|item| {
        query.iter().all(|(key, expected)| {
            !matches!(expected, Value::Object(_) | Value::Array(_))
                && item.get(key.as_str()) == Some(expected)
        })
    })
}

/// Write a handler's replacement value into the anchor slot, or fail when
/// the target was the view-model root.
fn write_back(
    view_model: &mut Value,
    resolved: &Resolved,
    value: Value,
) -> Result<(), PatchError> {
    let Some((parent_path, key)) = &resolved.anchor else {
        return Err(PatchError::RootReplacement);
    };
    if let Some(parent) = concern::get_mut(view_model, parent_path) {
        match parent {
            Value::Object(map) => {
                map.insert(key.clone(), value);
            }
            Value::Array(arr) => {
                if let Ok(index) = key.parse::<usize>() {
                    if index < arr.len() {
                        arr[index] = value;
                    } else if index == arr.len() {
                        arr.push(value);
                    }
                }
            }
            // Scalar parents cannot hold the replacement; dropped.
            _ => {}
        }
    }
    Ok(())
}
