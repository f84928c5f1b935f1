//! Domain Ports - Core trait definitions for the preflight engine
//!
//! These traits define the boundaries between the preflight logic and the
//! cluster, cloud CLIs and local tooling it talks to. Adapters implement
//! these traits to provide concrete functionality.

use crate::domain::params::{AzureParameters, InstallParameters};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Cluster Flavor
// =============================================================================

/// Kind of Kubernetes distribution the installer is talking to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Kind {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "minikube")]
    Minikube,
    #[serde(rename = "kind")]
    Kind,
    #[serde(rename = "EKS")]
    Eks,
    #[serde(rename = "GKE")]
    Gke,
    #[serde(rename = "AKS")]
    Aks,
    #[serde(rename = "k3s")]
    K3s,
    #[serde(rename = "microk8s")]
    Microk8s,
    #[serde(rename = "rancher-desktop")]
    RancherDesktop,
}

impl Kind {
    /// All kinds, in declaration order
    pub const ALL: [Kind; 9] = [
        Kind::Unknown,
        Kind::Minikube,
        Kind::Kind,
        Kind::Eks,
        Kind::Gke,
        Kind::Aks,
        Kind::K3s,
        Kind::Microk8s,
        Kind::RancherDesktop,
    ];

    pub fn is_unknown(&self) -> bool {
        matches!(self, Kind::Unknown)
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Unknown => write!(f, "unknown"),
            Kind::Minikube => write!(f, "minikube"),
            Kind::Kind => write!(f, "kind"),
            Kind::Eks => write!(f, "EKS"),
            Kind::Gke => write!(f, "GKE"),
            Kind::Aks => write!(f, "AKS"),
            Kind::K3s => write!(f, "k3s"),
            Kind::Microk8s => write!(f, "microk8s"),
            Kind::RancherDesktop => write!(f, "rancher-desktop"),
        }
    }
}

/// Detected cluster environment
///
/// Produced once per run by a [`FlavorDetector`] and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flavor {
    /// Detected distribution
    pub kind: Kind,
    /// Cluster name inferred by the detector, not yet normalized
    pub cluster_name: Option<String>,
}

impl Flavor {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            cluster_name: None,
        }
    }

    pub fn with_cluster_name(mut self, name: impl Into<String>) -> Self {
        self.cluster_name = Some(name.into());
        self
    }
}

// =============================================================================
// Flavor Detector Port
// =============================================================================

/// Port for identifying the target cluster's flavor
///
/// Detection never fails: a cluster that cannot be classified yields
/// [`Kind::Unknown`].
#[async_trait]
pub trait FlavorDetector: Send + Sync {
    async fn detect_flavor(&self) -> Flavor;
}

// =============================================================================
// BYOCNI Lookup Port
// =============================================================================

/// Port for the provider lookup that decides whether an AKS cluster runs
/// in bring-your-own-CNI mode
#[async_trait]
pub trait ByocniLookup: Send + Sync {
    async fn detect_byocni(&self, azure: &AzureParameters, cluster_name: Option<&str>) -> Result<bool>;
}

// =============================================================================
// Command Runner Port
// =============================================================================

/// Port for running local tools (`minikube`, `kind`, `az`)
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` and return its standard output
    async fn run(&self, program: &str, args: &[&str]) -> Result<String>;
}

// =============================================================================
// Validation Check Port
// =============================================================================

/// Everything a validation check may look at
pub struct CheckContext<'a> {
    pub flavor: &'a Flavor,
    pub params: &'a InstallParameters,
    pub runner: &'a dyn CommandRunner,
    pub cancel: &'a CancellationToken,
}

/// A named, flavor-scoped precondition
///
/// Names must be stable and unique within one flavor's check list; they are
/// what `--disable-check` matches against.
#[async_trait]
pub trait ValidationCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, ctx: &CheckContext<'_>) -> Result<()>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type FlavorDetectorRef = Arc<dyn FlavorDetector>;
pub type ByocniLookupRef = Arc<dyn ByocniLookup>;
pub type CommandRunnerRef = Arc<dyn CommandRunner>;
pub type ValidationCheckRef = Arc<dyn ValidationCheck>;
