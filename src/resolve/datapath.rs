//! Datapath Mode Resolver
//!
//! Picks the datapath mode (and, for some flavors, the kube-proxy
//! replacement posture) when the user did not choose one.
//!
//! | Kind      | Datapath mode          | Side effect                    |
//! |-----------|------------------------|--------------------------------|
//! | kind      | tunnel                 | kube-proxy replacement off     |
//! | minikube  | tunnel                 |                                |
//! | EKS       | aws-eni                |                                |
//! | GKE       | gke                    |                                |
//! | AKS       | aks-byocni / azure     | kube-proxy replacement off     |
//! | other     | tunnel                 |                                |

use crate::domain::params::{DatapathMode, InstallParameters, ProxyReplacement};
use crate::domain::ports::{ByocniLookup, Flavor, Kind};
use crate::error::{Error, Result};
use crate::preflight::guard::RunGuard;
use tracing::info;

/// Default datapath mode for a detected kind, given the BYOCNI answer where it applies
pub fn default_datapath_mode(kind: Kind, is_byocni: bool) -> DatapathMode {
    match kind {
        Kind::Kind | Kind::Minikube => DatapathMode::Tunnel,
        Kind::Eks => DatapathMode::AwsEni,
        Kind::Gke => DatapathMode::Gke,
        // Azure IPAM is not available in BYOCNI mode
        Kind::Aks if is_byocni => DatapathMode::AksByocni,
        Kind::Aks => DatapathMode::Azure,
        _ => DatapathMode::Tunnel,
    }
}

/// Whether the flavor needs kube-proxy replacement turned off by default
fn disables_kube_proxy_replacement(kind: Kind) -> bool {
    matches!(kind, Kind::Kind | Kind::Aks)
}

/// Resolves `datapath_mode` and `kube_proxy_replacement`
pub struct DatapathResolver<'a> {
    byocni: &'a dyn ByocniLookup,
}

impl<'a> DatapathResolver<'a> {
    pub fn new(byocni: &'a dyn ByocniLookup) -> Self {
        Self { byocni }
    }

    /// Fill in the datapath mode for `flavor` unless the user set one
    ///
    /// Idempotent: once `datapath_mode` is set, later calls only log it.
    /// For AKS the BYOCNI lookup runs first, against `azure.cluster_name` or
    /// else the detector's raw cluster name. Its failure aborts the
    /// resolution with [`Error::ProviderLookup`]; cancellation and the
    /// deadline are reported as themselves.
    pub async fn resolve(
        &self,
        flavor: &Flavor,
        params: &mut InstallParameters,
        guard: &RunGuard,
    ) -> Result<()> {
        if let Some(mode) = params.datapath_mode {
            info!("ℹ️ Custom datapath mode: {}", mode);
            return Ok(());
        }

        if flavor.kind == Kind::Aks {
            // The AKS resource name, not the installer's (possibly normalized) cluster name
            let cluster_name = params
                .azure
                .cluster_name
                .as_deref()
                .or(flavor.cluster_name.as_deref());
            let is_byocni = guard
                .run(self.byocni.detect_byocni(&params.azure, cluster_name))
                .await
                .map_err(into_provider_error)?;
            params.azure.is_byocni = is_byocni;
        }

        let mode = default_datapath_mode(flavor.kind, params.azure.is_byocni);

        if disables_kube_proxy_replacement(flavor.kind) && params.kube_proxy_replacement.is_none() {
            info!("ℹ️  kube-proxy-replacement disabled");
            params.kube_proxy_replacement = Some(ProxyReplacement::Disabled);
        }

        info!("🔮 Auto-detected datapath mode: {}", mode);
        params.datapath_mode = Some(mode);

        Ok(())
    }
}

fn into_provider_error(err: Error) -> Error {
    match err {
        Error::ProviderLookup { .. } | Error::Cancelled | Error::Timeout(_) => err,
        other => Error::ProviderLookup {
            provider: "azure".to_string(),
            reason: other.to_string(),
        },
    }
}
