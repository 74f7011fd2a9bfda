//! The generic master-port binding mechanism shared by the `wire<T>`,
//! `i2c`, and `uart` interface kinds.
//!
//! The original model dispatches a sync call through a type-erased
//! function pointer fixed up at bind time. The idiomatic Rust replacement
//! is a boxed closure captured at bind time: [`MasterPort::bind`] takes
//! a `Box<dyn FnMut(Args)>`, usually one that closes over an
//! `Rc<RefCell<Slave>>` and calls a typed method on it. This sidesteps the
//! original's `void*` cast entirely — the closure's captured type already
//! encodes which slave and which method to call.

use crate::trace::Tracer;

/// A master port of some interface kind whose sync payload is `Args`.
/// Unbound until [`MasterPort::bind`] is called; syncing an unbound port
/// warns once (the first time) and otherwise drops the call.
pub struct MasterPort<Args> {
    name: &'static str,
    handler: Option<Box<dyn FnMut(Args)>>,
    warned: bool,
}

impl<Args> MasterPort<Args> {
    /// A fresh, unbound port named `name` (used only in its warning
    /// message).
    pub fn new(name: &'static str) -> Self {
        MasterPort { name, handler: None, warned: false }
    }

    /// Whether this port currently has a bound slave.
    pub fn is_bound(&self) -> bool {
        self.handler.is_some()
    }

    /// Binds this port to a slave's sync closure. Replaces any existing
    /// binding and resets the unbound-warning latch.
    pub fn bind(&mut self, handler: Box<dyn FnMut(Args)>) {
        self.handler = Some(handler);
        self.warned = false;
    }

    /// Removes the current binding, if any.
    pub fn unbind(&mut self) {
        self.handler = None;
    }

    /// Delivers `args` to the bound slave. If unbound, emits a single
    /// warning the first time (subsequent unbound syncs on this port are
    /// silently dropped) and returns without side effects.
    pub fn sync(&mut self, args: Args, tracer: &Tracer) {
        match &mut self.handler {
            Some(handler) => handler(args),
            None => {
                if !self.warned {
                    tracer.warning(format!("sync on unbound master port `{}`", self.name));
                    self.warned = true;
                }
            }
        }
    }
}
