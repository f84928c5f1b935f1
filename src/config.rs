//! Preflight Configuration
//!
//! Install parameters may come from a YAML file; flags given on the command
//! line take precedence over the file, and `disable-check` entries from both
//! sources are combined.

use crate::domain::params::{DatapathMode, InstallParameters, ProxyReplacement};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Overall deadline for one preflight run when none is configured
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// File Configuration
// =============================================================================

/// Contents of a `--config` file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PreflightConfig {
    /// kubeconfig context to detect against
    pub context: Option<String>,
    /// Overall deadline in seconds
    pub timeout_secs: Option<u64>,
    /// Install parameters
    #[serde(flatten)]
    pub params: InstallParameters,
    /// Keys matched by nothing above; `deny_unknown_fields` does not work with `flatten`
    #[serde(flatten)]
    unknown: BTreeMap<String, serde_yaml::Value>,
}

impl PreflightConfig {
    /// Parse a YAML document
    ///
    /// Unknown keys are rejected so a misspelled key does not silently fall
    /// back to auto-detection.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        if !config.unknown.is_empty() {
            let keys: Vec<&str> = config.unknown.keys().map(String::as_str).collect();
            return Err(Error::Configuration(format!(
                "unknown configuration keys: {}",
                keys.join(", ")
            )));
        }
        Ok(config)
    }

    /// Read and parse a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    /// Overall deadline for the run
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Layer command line values over the file's values
    pub fn apply(&mut self, overrides: Overrides) {
        let params = &mut self.params;

        for name in overrides.disable_checks {
            if !params.disable_checks.contains(&name) {
                params.disable_checks.push(name);
            }
        }

        if overrides.datapath_mode.is_some() {
            params.datapath_mode = overrides.datapath_mode;
        }
        if overrides.kube_proxy_replacement.is_some() {
            params.kube_proxy_replacement = overrides.kube_proxy_replacement;
        }
        if overrides.cluster_name.is_some() {
            params.cluster_name = overrides.cluster_name;
        }
        if let Some(encryption) = overrides.encryption {
            params.encryption = encryption;
        }
        if overrides.ipam.is_some() {
            params.ipam = overrides.ipam;
        }
        if overrides.azure_resource_group.is_some() {
            params.azure.resource_group = overrides.azure_resource_group;
        }
        if overrides.azure_subscription_id.is_some() {
            params.azure.subscription_id = overrides.azure_subscription_id;
        }
        if overrides.azure_cluster_name.is_some() {
            params.azure.cluster_name = overrides.azure_cluster_name;
        }
        if let Some(version) = overrides.chart_version {
            params.chart_version = version;
        }
        if overrides.context.is_some() {
            self.context = overrides.context;
        }
        if overrides.timeout_secs.is_some() {
            self.timeout_secs = overrides.timeout_secs;
        }
    }
}

// =============================================================================
// Command Line Overrides
// =============================================================================

/// Values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub disable_checks: Vec<String>,
    pub datapath_mode: Option<DatapathMode>,
    pub kube_proxy_replacement: Option<ProxyReplacement>,
    pub cluster_name: Option<String>,
    pub encryption: Option<String>,
    pub ipam: Option<String>,
    pub azure_resource_group: Option<String>,
    pub azure_subscription_id: Option<String>,
    pub azure_cluster_name: Option<String>,
    pub chart_version: Option<String>,
    pub context: Option<String>,
    pub timeout_secs: Option<u64>,
}
