//! Configuration Gate
//!
//! Final, flavor-independent acceptance of the merged parameters. Runs after
//! flavor inference because the cluster name may have been filled in from the
//! detector.

use crate::domain::params::{EncryptionMode, InstallParameters};
use crate::domain::ports::Flavor;
use crate::error::{ClusterNameError, Error, Result};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{error, info};

/// DNS-label-like: lowercase alphanumerics and '-', alphanumeric at both ends
pub const CLUSTER_NAME_PATTERN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

static CLUSTER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CLUSTER_NAME_PATTERN).expect("cluster name pattern compiles"));

/// Make a detector-supplied name safe for Kubernetes object names
pub fn normalize_cluster_name(name: &str) -> String {
    name.replace('_', "-")
}

/// Check a cluster name, reporting dots separately from other mismatches
pub fn validate_cluster_name(name: &str) -> Result<()> {
    if name.contains('.') {
        error!("❌ Cluster name {:?} cannot contain dots", name);
        return Err(Error::InvalidClusterName {
            name: name.to_string(),
            reason: ClusterNameError::ContainsDot,
        });
    }

    if !CLUSTER_NAME.is_match(name) {
        error!(
            "❌ Cluster name {:?} is not valid, must match regular expression: {}",
            name, CLUSTER_NAME_PATTERN
        );
        return Err(Error::InvalidClusterName {
            name: name.to_string(),
            reason: ClusterNameError::PatternMismatch,
        });
    }

    Ok(())
}

/// Parse the encryption mode, rejecting anything outside the closed set
pub fn validate_encryption(mode: &str) -> Result<EncryptionMode> {
    mode.parse().map_err(|_| {
        error!("❌ Invalid encryption mode: {:?}", mode);
        Error::InvalidEncryptionMode(mode.to_string())
    })
}

/// Acceptance checks applied to the fully merged parameters
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfigurationGate;

impl ConfigurationGate {
    pub fn new() -> Self {
        Self
    }

    /// Adopt the detector's cluster name when the user gave none
    ///
    /// Returns `true` when a name was adopted.
    pub fn adopt_cluster_name(&self, flavor: &Flavor, params: &mut InstallParameters) -> bool {
        if params.cluster_name.is_some() {
            return false;
        }

        match flavor.cluster_name.as_deref() {
            Some(detected) if !detected.is_empty() => {
                let name = normalize_cluster_name(detected);
                info!("🔮 Auto-detected cluster name: {}", name);
                params.cluster_name = Some(name);
                true
            }
            _ => false,
        }
    }

    /// Log the deprecated IPAM override; it is neither validated nor mapped
    pub fn note_deprecated_ipam(&self, params: &InstallParameters) {
        // TODO: drop together with the deprecated --ipam flag
        if let Some(ipam) = params.ipam.as_deref().filter(|s| !s.is_empty()) {
            info!("ℹ️ Custom IPAM mode: {}", ipam);
        }
    }

    /// Reject an invalid cluster name or encryption mode
    pub fn check(&self, params: &InstallParameters) -> Result<EncryptionMode> {
        validate_cluster_name(params.cluster_name.as_deref().unwrap_or_default())?;
        validate_encryption(&params.encryption)
    }
}
