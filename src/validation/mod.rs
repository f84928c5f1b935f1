//! Validation layer
//!
//! Provides:
//! - The registry mapping each cluster kind to its checks
//! - The runner that executes them with the user's disable-list
//! - The built-in checks for minikube, kind and AKS

pub mod checks;
pub mod registry;
pub mod runner;

pub use checks::*;
pub use registry::*;
pub use runner::*;
