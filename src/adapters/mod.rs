//! Adapters
//!
//! Provides concrete implementations of the domain ports:
//! - Kubernetes: flavor detection from kubeconfig and node labels
//! - Azure: BYOCNI lookup through the az CLI
//! - Command: local tool execution

pub mod azure;
pub mod command;
pub mod kubernetes;

pub use azure::*;
pub use command::*;
pub use kubernetes::*;
