//! CNI Preflight - Cluster Autodetection & Validation
//!
//! Works out what kind of Kubernetes cluster a CNI installer is pointed at,
//! fills in safe defaults for cluster-specific settings and rejects invalid
//! configuration before anything is applied to the cluster.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                            Preflight Orchestrator                            │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │     Flavor      │  │   Validation    │  │       Check Runner          │  │
//! │  │    Detector     │─▶│    Registry     │─▶│  (disable-list, first fail) │  │
//! │  └─────────────────┘  └─────────────────┘  └─────────────┬───────────────┘  │
//! │                                                          │                   │
//! │  ┌─────────────────────────────┐  ┌─────────────────────┴───────────────┐   │
//! │  │    Configuration Gate       │◀─│      Datapath Mode Resolver         │   │
//! │  │  (cluster name, encryption) │  │  (kube-proxy replacement, BYOCNI)   │   │
//! │  └─────────────────────────────┘  └─────────────────────────────────────┘   │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │                               Adapters                                       │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────────┐  │
//! │  │   Kubernetes    │  │    Azure CLI    │  │      Local Commands         │  │
//! │  │  (kubeconfig,   │  │  (az aks show)  │  │  (minikube, kind, az)       │  │
//! │  │   node labels)  │  │                 │  │                             │  │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`preflight`]: Orchestrator and cancellation guard
//! - [`validation`]: Check registry, runner and built-in checks
//! - [`resolve`]: Datapath resolution and the configuration gate
//! - [`adapters`]: Kubernetes, Azure and process adapters
//! - [`domain`]: Install parameters and port traits
//! - [`config`]: YAML configuration and command line overrides
//! - [`error`]: Error types and handling

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod preflight;
pub mod resolve;
pub mod validation;

// Re-export commonly used types
pub use preflight::{Preflight, PreflightOutcome, RunGuard};

pub use domain::params::{
    AzureParameters, DatapathMode, EncryptionMode, InstallParameters, ProxyReplacement,
};

pub use domain::ports::{
    ByocniLookup, CheckContext, CommandRunner, Flavor, FlavorDetector, Kind, ValidationCheck,
};

pub use adapters::{AzCliByocniLookup, KubeFlavorDetector, TokioCommandRunner};

pub use config::{Overrides, PreflightConfig};

pub use error::{ClusterNameError, Error, Result};

pub use resolve::{ConfigurationGate, DatapathResolver};

pub use validation::{CheckReport, CheckRunner, ValidationRegistry, ValidationRegistryBuilder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
