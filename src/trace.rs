//! Per-component tracing capability.
//!
//! The design note behind this crate's error handling asks that ad hoc
//! `trace`/`warning` call sites be abstracted behind a single capability
//! handed to each component at build time, rather than components reaching
//! for a global logger. This wraps [`tracing`] to do exactly that.

use std::fmt;

/// A tracer bound to one component's fabric path (e.g. `"soc.i2c0"`).
/// Cheap to clone; every message it emits is attributed to that path.
#[derive(Debug, Clone)]
pub struct Tracer {
    path: String,
}

impl Tracer {
    /// Creates a tracer for a component at the given fabric path.
    pub fn new(path: impl Into<String>) -> Self {
        Tracer { path: path.into() }
    }

    /// A component-local debug trace.
    pub fn msg(&self, message: impl fmt::Display) {
        tracing::debug!(component = %self.path, "{}", message);
    }

    /// A recoverable condition worth surfacing but not fatal to the
    /// simulation: an unbound sync, an unknown command byte, an invalid
    /// register access.
    pub fn warning(&self, message: impl fmt::Display) {
        tracing::warn!(component = %self.path, "{}", message);
    }

    /// The fabric path this tracer reports under.
    pub fn path(&self) -> &str {
        &self.path
    }
}
