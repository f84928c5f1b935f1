//! Domain layer - Core types and port definitions
//!
//! This module defines the install parameters the preflight chain resolves
//! and the traits (ports) that adapters implement, following hexagonal
//! architecture principles.

pub mod params;
pub mod ports;

pub use params::*;
pub use ports::*;
