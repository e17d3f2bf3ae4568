//! Reactor registry and room-scoped update dispatch.
//!
//! A [`Dispatcher`] owns all synchronization state for one application
//! context: the registered reactors, the join/leave [`RoomQueue`], the
//! [`Patcher`] with its operation registry, and the host hooks. Nothing is
//! ambient; hosts construct a dispatcher and pass it around explicitly.
//!
//! The dispatcher is single-threaded by design: view models are
//! `Rc<RefCell<Value>>`, caller-owned and mutated in place during dispatch.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use crate::model_patch::codec::json::update_batch_from_json;
use crate::model_patch::{PatchError, Patcher, RoomId, Update, UpdateBatch};
use crate::room_queue::{Intent, RoomQueue};

/// Reaction callback, invoked with the applied update after each dispatch to
/// a reactor.
pub type ReactionFn = Box<dyn FnMut(&Update)>;

/// Per-reactor override of the patch-application entry point.
pub type ApplyFn = Box<dyn FnMut(&mut Value, &mut Update) -> Result<(), PatchError>>;

/// Transport hook performing the actual join/leave of a coalesced room list.
pub type RevolveFn = Box<dyn FnMut(Intent, &[RoomId])>;

/// Side-channel hook invoked synchronously with every new reactor.
pub type JoiningFn = Box<dyn FnMut(&Reactor)>;

/// Scheduling hook: fired whenever pending room intents change, so the host
/// can arrange a [`Dispatcher::flush`] at its next scheduling opportunity.
/// Re-fired on every enqueue; the host's scheduler coalesces.
pub type ScheduleFn = Box<dyn FnMut()>;

/// Host configuration for a [`Dispatcher`].
///
/// `revolve` is required; `joining` and `schedule` default to no-ops.
pub struct Config {
    revolve: RevolveFn,
    joining: Option<JoiningFn>,
    schedule: Option<ScheduleFn>,
}

impl Config {
    pub fn new(revolve: impl FnMut(Intent, &[RoomId]) + 'static) -> Config {
        Config {
            revolve: Box::new(revolve),
            joining: None,
            schedule: None,
        }
    }

    pub fn joining(mut self, hook: impl FnMut(&Reactor) + 'static) -> Config {
        self.joining = Some(Box::new(hook));
        self
    }

    pub fn schedule(mut self, hook: impl FnMut() + 'static) -> Config {
        self.schedule = Some(Box::new(hook));
        self
    }
}

/// Handle identifying a registered reactor, used for teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReactorId(u64);

/// A (container, view-model) pair that subscriptions bind to.
#[derive(Clone)]
pub struct Scope {
    container: String,
    view_model: Rc<RefCell<Value>>,
}

impl Scope {
    pub fn new(container: impl Into<String>, view_model: Rc<RefCell<Value>>) -> Scope {
        Scope {
            container: container.into(),
            view_model,
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn view_model(&self) -> &Rc<RefCell<Value>> {
        &self.view_model
    }
}

/// A registered (view-model, room, reaction) subscription.
pub struct Reactor {
    id: ReactorId,
    container: String,
    view_model: Rc<RefCell<Value>>,
    room: RoomId,
    apply: Option<ApplyFn>,
    reaction: ReactionFn,
}

impl Reactor {
    pub fn id(&self) -> ReactorId {
        self.id
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn view_model(&self) -> &Rc<RefCell<Value>> {
        &self.view_model
    }
}

/// Options accepted by [`Dispatcher::subscribe_with`].
#[derive(Default)]
pub struct SubscribeOptions {
    /// Replaces the shared [`Patcher`] entry point for this reactor.
    pub apply_changes: Option<ApplyFn>,
}

/// Owns reactors, room queue, operation registry, and host hooks for one
/// application context.
pub struct Dispatcher {
    reactors: Vec<Reactor>,
    queue: RoomQueue,
    patcher: Patcher,
    revolve: RevolveFn,
    joining: Option<JoiningFn>,
    schedule: Option<ScheduleFn>,
    next_id: u64,
}

impl Dispatcher {
    pub fn new(config: Config) -> Dispatcher {
        Dispatcher {
            reactors: Vec::new(),
            queue: RoomQueue::new(),
            patcher: Patcher::new(),
            revolve: config.revolve,
            joining: config.joining,
            schedule: config.schedule,
            next_id: 0,
        }
    }

    /// Register (or override) a patch operation handler, effective for
    /// subsequent dispatches.
    pub fn register_operation<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(
                Option<&mut Value>,
                &mut crate::model_patch::Operation,
            ) -> Result<Option<Value>, PatchError>
            + 'static,
    {
        self.patcher.register(name, handler);
    }

    /// Direct patch entry point, usable outside the subscription flow.
    pub fn apply_changes(
        &self,
        view_model: &mut Value,
        update: &mut Update,
    ) -> Result<(), PatchError> {
        self.patcher.apply_changes(view_model, update)
    }

    /// Subscribe `scope` to `room` with the default patch entry point.
    pub fn subscribe(
        &mut self,
        scope: &Scope,
        room: impl Into<RoomId>,
        reaction: impl FnMut(&Update) + 'static,
    ) -> ReactorId {
        self.subscribe_with(scope, room, SubscribeOptions::default(), reaction)
    }

    /// Subscribe with per-reactor options. Registers the reactor, enqueues a
    /// join for the room, and invokes the `joining` hook synchronously with
    /// the new reactor.
    pub fn subscribe_with(
        &mut self,
        scope: &Scope,
        room: impl Into<RoomId>,
        options: SubscribeOptions,
        reaction: impl FnMut(&Update) + 'static,
    ) -> ReactorId {
        let room = room.into();
        let id = ReactorId(self.next_id);
        self.next_id += 1;
        debug!(room = %room, "subscribing reactor");
        self.reactors.push(Reactor {
            id,
            container: scope.container.clone(),
            view_model: Rc::clone(&scope.view_model),
            room: room.clone(),
            apply: options.apply_changes,
            reaction: Box::new(reaction),
        });
        self.enqueue(Intent::Join, &room);
        if let (Some(joining), Some(reactor)) = (self.joining.as_mut(), self.reactors.last()) {
            joining(reactor);
        }
        id
    }

    /// Remove a reactor. A leave is enqueued only when no other active
    /// reactor still targets the room. Returns `false` for a stale id.
    pub fn unsubscribe(&mut self, id: ReactorId) -> bool {
        let Some(position) = self.reactors.iter().position(|r| r.id == id) else {
            return false;
        };
        let reactor = self.reactors.remove(position);
        debug!(room = %reactor.room, "unsubscribing reactor");
        if !self.reactors.iter().any(|r| r.room == reactor.room) {
            self.enqueue(Intent::Leave, &reactor.room);
        }
        true
    }

    /// Inbound entry point for a server-pushed batch.
    ///
    /// For each update in batch order, for each targeted room in listed
    /// order, every matching reactor (in registration order) has the update
    /// applied to its view-model and its reaction invoked, strictly in
    /// sequence. Each reactor sees its own copy of the update, so apply-time
    /// captures like `Operation::context` are isolated per reactor.
    ///
    /// A patch error propagates immediately; reactors later in the order are
    /// not dispatched for that call.
    pub fn dispatch(&mut self, batch: &UpdateBatch) -> Result<(), PatchError> {
        debug!(updates = batch.updates.len(), "dispatching update batch");
        let Self {
            reactors, patcher, ..
        } = self;
        for update in &batch.updates {
            for room in &update.rooms {
                for reactor in reactors.iter_mut().filter(|r| &r.room == room) {
                    let mut applied = update.clone();
                    {
                        let mut vm = reactor.view_model.borrow_mut();
                        match reactor.apply.as_mut() {
                            Some(apply) => apply(&mut vm, &mut applied)?,
                            None => patcher.apply_changes(&mut vm, &mut applied)?,
                        }
                    }
                    (reactor.reaction)(&applied);
                }
            }
        }
        Ok(())
    }

    /// Decode a raw transport payload and dispatch it.
    pub fn dispatch_json(&mut self, data: &Value) -> Result<(), PatchError> {
        let batch = update_batch_from_json(data)?;
        self.dispatch(&batch)
    }

    /// Flush pending room intents through the `revolve` hook. Hosts call
    /// this from their scheduler, after all enqueues of the current tick.
    pub fn flush(&mut self) {
        let Self { queue, revolve, .. } = self;
        queue.flush(|intent, rooms| revolve(intent, rooms));
    }

    /// Whether room intents are waiting for a [`flush`](Dispatcher::flush).
    pub fn needs_flush(&self) -> bool {
        self.queue.needs_flush()
    }

    /// Queue introspection, mainly for hosts that render connection state.
    pub fn is_joined(&self, room: &str) -> bool {
        self.queue.is_joined(room)
    }

    fn enqueue(&mut self, intent: Intent, room: &str) {
        self.queue.enqueue(intent, room);
        if let Some(schedule) = self.schedule.as_mut() {
            schedule();
        }
    }
}
