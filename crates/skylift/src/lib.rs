//! skylift — room-scoped view-model synchronization.
//!
//! Client-held view models (JSON documents) are kept in sync with
//! server-driven, room-scoped incremental updates. Subscriptions bind a
//! (container, view-model) [`Scope`] to a room; room join/leave intents are
//! coalesced and flushed through a host transport hook; inbound update
//! batches are routed by room to every matching reactor and applied as
//! structured patches (field merges plus array insert/remove/edit located by
//! concern path and query).
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use serde_json::json;
//! use skylift::{Config, Dispatcher, Scope};
//!
//! let mut dispatcher = Dispatcher::new(Config::new(|intent, rooms| {
//!     // hand the coalesced room list to the transport
//!     let _ = (intent, rooms);
//! }));
//!
//! let scope = Scope::new("inbox", Rc::new(RefCell::new(json!({"items": []}))));
//! dispatcher.subscribe(&scope, "news", |update| {
//!     let _ = update; // re-render from the mutated view model
//! });
//! dispatcher.flush();
//!
//! dispatcher
//!     .dispatch_json(&json!({
//!         "updates": [{
//!             "rooms": ["news"],
//!             "operations": [{"op": "push", "concern": "items", "model": {"id": 1}}]
//!         }]
//!     }))
//!     .unwrap();
//! assert_eq!(*scope.view_model().borrow(), json!({"items": [{"id": 1}]}));
//! ```

pub mod dispatch;
pub mod model_patch;
pub mod room_queue;

pub use dispatch::{
    ApplyFn, Config, Dispatcher, JoiningFn, ReactionFn, Reactor, ReactorId, RevolveFn, ScheduleFn,
    Scope, SubscribeOptions,
};
pub use model_patch::{
    merge_fields, OpKind, Operation, OperationHandler, PatchError, Patcher, RoomId, Update,
    UpdateBatch,
};
pub use room_queue::{Intent, RoomQueue};
