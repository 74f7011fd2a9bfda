//! Cycle-driven event scheduler.
//!
//! The scheduler is the simulation's only notion of time: a monotonic
//! integer cycle counter plus a priority queue of pending events, ordered by
//! target cycle and, for ties, arrival order (stable FIFO). It holds no
//! reference to the component that owns an event, only the opaque
//! `(ComponentId, EventTag)` pair identifying it; dispatch is the
//! [`crate::component::Simulation`]'s job.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::error::{Result, SimError};

/// Simulation time, in cycles, counted from zero at construction.
pub type Cycle = u64;

/// Identifies a component registered with a [`crate::component::Simulation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(
    /// Index into the owning [`crate::component::Simulation`]'s registry.
    pub usize,
);

/// A component-local tag distinguishing between a component's own
/// concurrently pending events. Most components in this crate only ever
/// have one self-reschedule event in flight and use tag `0`.
pub type EventTag = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct EventKey {
    component: ComponentId,
    tag: EventTag,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
struct QueuedEvent {
    cycle: Cycle,
    seq: u64,
    key: EventKey,
}

// `BinaryHeap` is a max-heap; reverse the natural order on `(cycle, seq)` so
// the earliest-scheduled, then earliest-enqueued, event sorts to the top.
// Same trick as the shortest-path example in `std::collections::binary_heap`.
impl Ord for QueuedEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cycle
            .cmp(&self.cycle)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueuedEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The cycle-counted priority queue described above.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Cycle,
    next_seq: u64,
    heap: BinaryHeap<QueuedEvent>,
    pending: HashSet<EventKey>,
    stop_requested: bool,
}

impl Scheduler {
    /// A fresh scheduler at cycle zero.
    pub fn new() -> Self {
        Scheduler::default()
    }

    /// The current simulation cycle.
    pub fn now(&self) -> Cycle {
        self.now
    }

    /// Whether a handler has called [`Scheduler::request_stop`].
    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Asks [`crate::component::Simulation::run_until`] to return after the
    /// current event finishes, regardless of `limit`.
    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// True if `(component, tag)` has a pending event in the queue.
    pub fn is_enqueued(&self, component: ComponentId, tag: EventTag) -> bool {
        self.pending.contains(&EventKey { component, tag })
    }

    /// Schedules `(component, tag)` to fire `delay` cycles from now
    /// (`delay` must be at least 1; an event cannot fire in its own cycle).
    /// Re-enqueuing an event that is already pending is a scheduling bug in
    /// the caller and returns [`SimError::SchedulerMisuse`] rather than
    /// silently clobbering the earlier one.
    pub fn enqueue(&mut self, component: ComponentId, tag: EventTag, delay: Cycle) -> Result<()> {
        let key = EventKey { component, tag };
        if self.pending.contains(&key) {
            return Err(SimError::SchedulerMisuse { component, tag });
        }
        let delay = delay.max(1);
        self.pending.insert(key);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(QueuedEvent {
            cycle: self.now + delay,
            seq,
            key,
        });
        Ok(())
    }

    /// Cancels a pending event, if any. A no-op if it isn't pending.
    /// Cancellation is lazy: the stale heap entry is dropped the next time
    /// it would otherwise surface from [`Scheduler::peek_cycle`] or
    /// [`Scheduler::pop_ready`].
    pub fn cancel(&mut self, component: ComponentId, tag: EventTag) {
        self.pending.remove(&EventKey { component, tag });
    }

    fn drop_stale_top(&mut self) {
        while let Some(top) = self.heap.peek() {
            if self.pending.contains(&top.key) {
                break;
            }
            self.heap.pop();
        }
    }

    /// The cycle of the next still-pending event, if any, without firing it.
    pub fn peek_cycle(&mut self) -> Option<Cycle> {
        self.drop_stale_top();
        self.heap.peek().map(|e| e.cycle)
    }

    /// Pops and fires the next pending event: advances `now` to its target
    /// cycle, clears its pending flag (a handler may re-enqueue the same
    /// key immediately), and returns its identity.
    pub fn pop_ready(&mut self) -> Option<(ComponentId, EventTag)> {
        self.drop_stale_top();
        let ev = self.heap.pop()?;
        self.pending.remove(&ev.key);
        self.now = ev.cycle;
        Some((ev.key.component, ev.key.tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_cycle_then_fifo_order() {
        let mut s = Scheduler::new();
        let a = ComponentId(0);
        let b = ComponentId(1);
        s.enqueue(a, 0, 5).unwrap();
        s.enqueue(b, 0, 2).unwrap();
        s.enqueue(a, 1, 2).unwrap();

        assert_eq!(s.pop_ready(), Some((b, 0)));
        assert_eq!(s.now(), 2);
        assert_eq!(s.pop_ready(), Some((a, 1)));
        assert_eq!(s.now(), 2);
        assert_eq!(s.pop_ready(), Some((a, 0)));
        assert_eq!(s.now(), 5);
        assert_eq!(s.pop_ready(), None);
    }

    #[test]
    fn rejects_double_enqueue() {
        let mut s = Scheduler::new();
        let a = ComponentId(0);
        s.enqueue(a, 0, 1).unwrap();
        assert!(matches!(s.enqueue(a, 0, 1), Err(SimError::SchedulerMisuse { .. })));
    }

    #[test]
    fn cancel_is_lazy_and_safe() {
        let mut s = Scheduler::new();
        let a = ComponentId(0);
        let b = ComponentId(1);
        s.enqueue(a, 0, 1).unwrap();
        s.enqueue(b, 0, 1).unwrap();
        s.cancel(a, 0);
        assert_eq!(s.pop_ready(), Some((b, 0)));
        assert_eq!(s.pop_ready(), None);
    }
}
