//! Structured patches for view-model documents.
//!
//! An [`Update`] carries root fields to shallow-merge plus an ordered list of
//! [`Operation`]s. Each operation names a target through a dot-separated
//! *concern* path and is dispatched by [`OpKind`]:
//!
//! - `push` / `unshift` — append / prepend to the target array,
//! - `remove` / `edit` — locate an array element by `query` and splice or
//!   merge into it,
//! - custom — any handler registered on the [`Patcher`].
//!
//! Application mutates the view-model in place; errors abort the remaining
//! operations of the call without rolling back the ones already applied.

pub mod apply;
pub mod codec;
pub mod types;

pub use apply::{merge_fields, OperationHandler, Patcher};
pub use types::{OpKind, Operation, PatchError, RoomId, Update, UpdateBatch};
