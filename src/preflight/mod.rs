//! Preflight orchestration
//!
//! Sequences flavor detection, validation checks, default resolution and the
//! configuration gate into the entry points used by install and uninstall.

pub mod guard;
pub mod orchestrator;

pub use guard::*;
pub use orchestrator::*;
