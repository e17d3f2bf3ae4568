//! Join/leave coalescing for room membership.
//!
//! Intents accumulate in two disjoint pending sets; a single [`flush`]
//! (triggered by the host at the next scheduling opportunity) turns the net
//! intents into at most one transport call per direction. The membership set
//! records which rooms the queue believes are joined and filters redundant
//! calls — it is not a reference count.
//!
//! [`flush`]: RoomQueue::flush

use indexmap::IndexSet;
use tracing::debug;

use crate::model_patch::RoomId;

/// Direction of a room membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Join,
    Leave,
}

impl Intent {
    pub fn name(self) -> &'static str {
        match self {
            Intent::Join => "join",
            Intent::Leave => "leave",
        }
    }
}

/// Coalescing queue of room join/leave intents.
#[derive(Debug, Default)]
pub struct RoomQueue {
    pending_join: IndexSet<RoomId>,
    pending_leave: IndexSet<RoomId>,
    joined: IndexSet<RoomId>,
    pending_flush: bool,
}

impl RoomQueue {
    pub fn new() -> RoomQueue {
        RoomQueue::default()
    }

    /// Record an intent for `room`, removing it from the opposite pending
    /// set — the last intent before a flush wins, and the two sets stay
    /// disjoint. Marks a flush as pending.
    pub fn enqueue(&mut self, intent: Intent, room: &str) {
        let (from, to) = match intent {
            Intent::Join => (&mut self.pending_leave, &mut self.pending_join),
            Intent::Leave => (&mut self.pending_join, &mut self.pending_leave),
        };
        from.shift_remove(room);
        to.insert(room.to_string());
        self.pending_flush = true;
    }

    /// Whether any enqueue happened since the last flush.
    pub fn needs_flush(&self) -> bool {
        self.pending_flush
    }

    /// Whether the queue currently believes `room` is joined.
    pub fn is_joined(&self, room: &str) -> bool {
        self.joined.contains(room)
    }

    /// Rooms pending for `intent`, in enqueue order.
    pub fn pending(&self, intent: Intent) -> impl Iterator<Item = &str> {
        let set = match intent {
            Intent::Join => &self.pending_join,
            Intent::Leave => &self.pending_leave,
        };
        set.iter().map(String::as_str)
    }

    /// Flush both queues through `revolve`: leaves first, then joins, so the
    /// transport never observes a room as joined twice.
    pub fn flush<F>(&mut self, mut revolve: F)
    where
        F: FnMut(Intent, &[RoomId]),
    {
        self.flush_queue(Intent::Leave, &mut revolve);
        self.flush_queue(Intent::Join, &mut revolve);
        self.pending_flush = false;
    }

    /// Flush one direction. Only rooms whose membership state is not yet
    /// consistent with the intent are sent (a join for an already-joined
    /// room is redundant); when nothing qualifies the transport is not
    /// called and the set is kept for a later flush.
    fn flush_queue<F>(&mut self, intent: Intent, revolve: &mut F)
    where
        F: FnMut(Intent, &[RoomId]),
    {
        // Leave flushes rooms that are members; join flushes rooms that
        // are not.
        let flushable_when_member = intent == Intent::Leave;
        let pending = match intent {
            Intent::Join => &self.pending_join,
            Intent::Leave => &self.pending_leave,
        };
        let flushable: Vec<RoomId> = pending
            .iter()
            .filter(|room| self.joined.contains(room.as_str()) == flushable_when_member)
            .cloned()
            .collect();
        if flushable.is_empty() {
            return;
        }
        debug!(intent = intent.name(), rooms = flushable.len(), "flushing room queue");
        revolve(intent, &flushable);
        for room in &flushable {
            match intent {
                Intent::Join => {
                    self.joined.insert(room.clone());
                }
                Intent::Leave => {
                    self.joined.shift_remove(room);
                }
            }
        }
        match intent {
            Intent::Join => self.pending_join.clear(),
            Intent::Leave => self.pending_leave.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect_flush(queue: &mut RoomQueue) -> Vec<(Intent, Vec<RoomId>)> {
        let mut calls = Vec::new();
        queue.flush(|intent, rooms| calls.push((intent, rooms.to_vec())));
        calls
    }

    #[test]
    fn join_then_leave_cancels_to_leave_only() {
        let mut queue = RoomQueue::new();
        queue.enqueue(Intent::Join, "r");
        queue.enqueue(Intent::Leave, "r");
        assert_eq!(queue.pending(Intent::Join).count(), 0);
        // Not joined yet, so the pending leave filters out too: zero calls.
        let calls = collect_flush(&mut queue);
        assert!(calls.is_empty());
    }

    #[test]
    fn leave_then_join_cancels_to_join() {
        let mut queue = RoomQueue::new();
        queue.enqueue(Intent::Join, "r");
        collect_flush(&mut queue);
        assert!(queue.is_joined("r"));

        queue.enqueue(Intent::Leave, "r");
        queue.enqueue(Intent::Join, "r");
        // Already joined, so the re-join is redundant: zero calls.
        let calls = collect_flush(&mut queue);
        assert!(calls.is_empty());
        assert!(queue.is_joined("r"));
    }

    #[test]
    fn pending_sets_stay_disjoint() {
        let mut queue = RoomQueue::new();
        queue.enqueue(Intent::Join, "a");
        queue.enqueue(Intent::Leave, "a");
        queue.enqueue(Intent::Join, "a");
        let join: Vec<_> = queue.pending(Intent::Join).collect();
        let leave: Vec<_> = queue.pending(Intent::Leave).collect();
        assert_eq!(join, vec!["a"]);
        assert!(leave.is_empty());
    }

    #[test]
    fn flush_processes_leaves_before_joins() {
        let mut queue = RoomQueue::new();
        queue.enqueue(Intent::Join, "old");
        collect_flush(&mut queue);

        queue.enqueue(Intent::Leave, "old");
        queue.enqueue(Intent::Join, "new");
        let calls = collect_flush(&mut queue);
        assert_eq!(
            calls,
            vec![
                (Intent::Leave, vec!["old".to_string()]),
                (Intent::Join, vec!["new".to_string()]),
            ]
        );
        assert!(!queue.is_joined("old"));
        assert!(queue.is_joined("new"));
    }

    #[test]
    fn redundant_join_makes_no_transport_call() {
        let mut queue = RoomQueue::new();
        queue.enqueue(Intent::Join, "r");
        collect_flush(&mut queue);

        queue.enqueue(Intent::Join, "r");
        let calls = collect_flush(&mut queue);
        assert!(calls.is_empty());
        assert!(queue.is_joined("r"));
    }

    #[test]
    fn leave_of_unjoined_room_makes_no_transport_call() {
        let mut queue = RoomQueue::new();
        queue.enqueue(Intent::Leave, "never-joined");
        let calls = collect_flush(&mut queue);
        assert!(calls.is_empty());
    }

    #[test]
    fn burst_of_joins_yields_one_call() {
        let mut queue = RoomQueue::new();
        queue.enqueue(Intent::Join, "a");
        queue.enqueue(Intent::Join, "b");
        queue.enqueue(Intent::Join, "a");
        let calls = collect_flush(&mut queue);
        assert_eq!(
            calls,
            vec![(Intent::Join, vec!["a".to_string(), "b".to_string()])]
        );
    }

    #[test]
    fn flush_clears_pending_flag() {
        let mut queue = RoomQueue::new();
        assert!(!queue.needs_flush());
        queue.enqueue(Intent::Join, "r");
        assert!(queue.needs_flush());
        collect_flush(&mut queue);
        assert!(!queue.needs_flush());
    }
}
