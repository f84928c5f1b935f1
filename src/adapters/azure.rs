//! Azure BYOCNI Lookup
//!
//! Asks the az CLI how an AKS cluster was created. Clusters created with
//! `--network-plugin none` bring their own CNI.

use crate::domain::params::AzureParameters;
use crate::domain::ports::{ByocniLookup, CommandRunnerRef};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

/// Network plugin reported for bring-your-own-CNI clusters
const BYOCNI_NETWORK_PLUGIN: &str = "none";

// =============================================================================
// az aks show output
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AksCluster {
    #[serde(default)]
    network_profile: Option<NetworkProfile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NetworkProfile {
    #[serde(default)]
    network_plugin: Option<String>,
}

/// Decide BYOCNI from `az aks show --output json`
pub fn parse_byocni(aks_show_json: &str) -> Result<bool> {
    let cluster: AksCluster = serde_json::from_str(aks_show_json).map_err(|e| provider_error(e.to_string()))?;

    let plugin = cluster
        .network_profile
        .and_then(|p| p.network_plugin)
        .ok_or_else(|| provider_error("cluster has no networkProfile.networkPlugin".to_string()))?;

    debug!("AKS network plugin: {}", plugin);
    Ok(plugin == BYOCNI_NETWORK_PLUGIN)
}

fn provider_error(reason: String) -> Error {
    Error::ProviderLookup {
        provider: "azure".to_string(),
        reason,
    }
}

// =============================================================================
// Lookup
// =============================================================================

/// [`ByocniLookup`] that shells out to `az aks show`
pub struct AzCliByocniLookup {
    runner: CommandRunnerRef,
}

impl AzCliByocniLookup {
    pub fn new(runner: CommandRunnerRef) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl ByocniLookup for AzCliByocniLookup {
    async fn detect_byocni(&self, azure: &AzureParameters, cluster_name: Option<&str>) -> Result<bool> {
        let resource_group = azure
            .resource_group
            .as_deref()
            .filter(|rg| !rg.is_empty())
            .ok_or_else(|| provider_error("--azure-resource-group is required on AKS".to_string()))?;
        let cluster_name = cluster_name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| provider_error("AKS cluster name is required, set --azure-cluster-name".to_string()))?;

        let mut args = vec![
            "aks",
            "show",
            "--resource-group",
            resource_group,
            "--name",
            cluster_name,
            "--output",
            "json",
        ];
        if let Some(subscription) = azure.subscription_id.as_deref() {
            args.extend(["--subscription", subscription]);
        }

        let output = self
            .runner
            .run("az", &args)
            .await
            .map_err(|e| match e {
                Error::Cancelled | Error::Timeout(_) => e,
                other => provider_error(other.to_string()),
            })?;

        let is_byocni = parse_byocni(&output)?;
        if is_byocni {
            info!("🔮 AKS cluster {} runs in BYOCNI mode", cluster_name);
        }
        Ok(is_byocni)
    }
}
