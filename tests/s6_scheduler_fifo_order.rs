//! Two events enqueued at the same target cycle fire in insertion
//! order, and reversing insertion order reverses fire order, exercised
//! here purely through the public scheduler API
//! with no components involved.

use vp_core::scheduler::{ComponentId, Scheduler};

#[test]
fn same_cycle_events_fire_in_insertion_order() {
    let mut sched = Scheduler::new();
    let a = ComponentId(0);
    let b = ComponentId(1);

    sched.enqueue(a, 0, 5).unwrap();
    sched.enqueue(b, 0, 5).unwrap();

    assert_eq!(sched.pop_ready(), Some((a, 0)));
    assert_eq!(sched.pop_ready(), Some((b, 0)));
    assert_eq!(sched.now(), 5);
}

#[test]
fn reversing_insertion_order_reverses_fire_order() {
    let mut sched = Scheduler::new();
    let a = ComponentId(0);
    let b = ComponentId(1);

    sched.enqueue(b, 0, 5).unwrap();
    sched.enqueue(a, 0, 5).unwrap();

    assert_eq!(sched.pop_ready(), Some((b, 0)));
    assert_eq!(sched.pop_ready(), Some((a, 0)));
}
