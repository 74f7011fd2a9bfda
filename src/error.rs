//! Error taxonomy for the simulation kernel.
//!
//! Non-fatal conditions — an invalid register access, an unbound sync, an
//! unknown I2C command byte — are deliberately *not* represented here.
//! Per the error-handling design those must not raise out-of-band; they're
//! encoded as ordinary return values ([`crate::itf::io_req::IoStatus`]) or a
//! traced warning, never as a [`SimError`].

use thiserror::Error;

/// Fatal conditions that abort elaboration or the simulation outright.
#[derive(Debug, Error)]
pub enum SimError {
    /// A required configuration key was missing, or present with the wrong
    /// scalar type.
    #[error("configuration error on component `{component}`: {reason}")]
    Config {
        /// Name of the component whose configuration was invalid.
        component: String,
        /// Human-readable explanation of what was wrong.
        reason: String,
    },

    /// A master port was bound to a slave of a mismatched interface kind,
    /// or bound while already bound.
    #[error("binding error: {0}")]
    Binding(String),

    /// An already-enqueued event was enqueued again. Always a bug in a
    /// component's own scheduling logic (see [`crate::scheduler::Scheduler`]),
    /// never a recoverable condition.
    #[error("scheduler misuse: event (component {component:?}, tag {tag}) is already enqueued")]
    SchedulerMisuse {
        /// The component whose event was already pending.
        component: crate::scheduler::ComponentId,
        /// The event tag that was already pending.
        tag: crate::scheduler::EventTag,
    },

    /// Raised through by the (out of scope) CPU/LSU contract when a
    /// stack-relative access escapes its configured window.
    #[error("stack bounds violation at 0x{addr:08x} (window 0x{start:08x}..0x{end:08x})")]
    StackBoundsViolation {
        /// The offending address.
        addr: u64,
        /// Inclusive start of the configured stack window.
        start: u64,
        /// Exclusive end of the configured stack window.
        end: u64,
    },

    /// Escape hatch for host-level integration errors this crate doesn't
    /// otherwise categorize.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout this crate's fallible, elaboration-time
/// APIs.
pub type Result<T> = std::result::Result<T, SimError>;
