//! Resolution layer
//!
//! Provides:
//! - Datapath mode and kube-proxy replacement defaults per flavor
//! - The configuration gate for cluster name and encryption mode

pub mod datapath;
pub mod gate;

pub use datapath::*;
pub use gate::*;
