//! Per-PID operations: detail lookup and termination.
//!
//! Both are independent entry points, usually called with a PID taken from a
//! previous port check.

pub mod detail;
pub mod terminate;

pub use detail::{DetailFetcher, ProcessDetail};
pub use terminate::{
    PlatformControl, ProcessControl, SignalError, TerminationMode, TerminationOutcome, Terminator,
};
