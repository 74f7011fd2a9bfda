//! Component registry and event dispatch.
//!
//! Every component in the fabric implements [`Component`]. A
//! [`Simulation`] owns the shared [`Scheduler`] plus the set of registered
//! components behind `Rc<RefCell<_>>` handles, so port bindings (see
//! [`crate::itf::port`]) can hold their own clone of a handle without
//! going through the registry's index. Event dispatch clones the handle
//! for the firing `ComponentId` out of the registry before calling into it,
//! so the registry itself is never borrowed across the dispatch call.

use std::cell::RefCell;
use std::rc::Rc;

use crate::scheduler::{ComponentId, Cycle, EventTag, Scheduler};

/// A component in the fabric: a named node with a reset hook and,
/// optionally, a self-scheduled event handler.
pub trait Component {
    /// The component's name within its enclosing namespace.
    fn name(&self) -> &str;

    /// Restores elaboration-time defaults. Called once at startup and
    /// again on any subsequent reset; must not touch port bindings, which
    /// persist across resets.
    fn reset(&mut self);

    /// Called once by [`Simulation::register`] so a self-scheduling
    /// component can remember its own id for later `Scheduler::enqueue`
    /// calls. Components with no events of their own (e.g. `Switch`) can
    /// ignore this.
    fn set_id(&mut self, id: ComponentId) {
        let _ = id;
    }

    /// Invoked when one of this component's scheduled events fires.
    fn handle_event(&mut self, tag: EventTag, sched: &mut Scheduler) {
        let _ = (tag, sched);
    }
}

/// A shared handle to a registered component, usable both from the
/// registry and from a port binding closure.
pub type ComponentHandle = Rc<RefCell<dyn Component>>;

/// Owns the shared scheduler and the set of registered components, and
/// drives dispatch.
#[derive(Default)]
pub struct Simulation {
    scheduler: Scheduler,
    components: Vec<ComponentHandle>,
}

impl Simulation {
    /// An empty simulation at cycle zero.
    pub fn new() -> Self {
        Simulation::default()
    }

    /// Registers a component, assigns it a [`ComponentId`], and calls its
    /// `set_id` hook.
    pub fn register(&mut self, component: ComponentHandle) -> ComponentId {
        let id = ComponentId(self.components.len());
        component.borrow_mut().set_id(id);
        self.components.push(component);
        id
    }

    /// Mutable access to the shared scheduler, e.g. to kick off the first
    /// event for a component built outside of [`Simulation::register`].
    pub fn scheduler(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// Calls `reset` on every registered component, in registration order.
    pub fn reset_all(&mut self) {
        for c in &self.components {
            c.borrow_mut().reset();
        }
    }

    /// Drains the event queue, dispatching each event to its owning
    /// component, until the queue is empty, a handler calls
    /// [`Scheduler::request_stop`], or `now >= limit`.
    pub fn run_until(&mut self, limit: Cycle) {
        loop {
            if self.scheduler.stop_requested() || self.scheduler.now() >= limit {
                break;
            }
            match self.scheduler.pop_ready() {
                None => break,
                Some((component, tag)) => {
                    let handle = Rc::clone(&self.components[component.0]);
                    handle.borrow_mut().handle_event(tag, &mut self.scheduler);
                }
            }
        }
    }
}
