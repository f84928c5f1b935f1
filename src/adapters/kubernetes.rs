//! Kubernetes Flavor Detector
//!
//! Classifies the target cluster from the kubeconfig context it is reached
//! through and, failing that, from the labels and provider IDs of its nodes.

use crate::domain::ports::{Flavor, FlavorDetector, Kind};
use crate::error::{Error, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Nodes inspected when classifying by labels
const NODE_SAMPLE_LIMIT: u32 = 50;

// =============================================================================
// Classification
// =============================================================================

/// What the detector needs to know about one node
#[derive(Debug, Clone, Default)]
pub struct NodeFacts {
    pub labels: BTreeMap<String, String>,
    pub provider_id: Option<String>,
}

impl From<&Node> for NodeFacts {
    fn from(node: &Node) -> Self {
        Self {
            labels: node.metadata.labels.clone().unwrap_or_default(),
            provider_id: node.spec.as_ref().and_then(|s| s.provider_id.clone()),
        }
    }
}

fn named(kind: Kind, cluster_name: &str) -> Flavor {
    match cluster_name {
        "" => Flavor::new(kind),
        name => Flavor::new(kind).with_cluster_name(name),
    }
}

/// Classify from kubeconfig names alone, without talking to the cluster
pub fn classify_context(context: Option<&str>, cluster: Option<&str>) -> Option<Flavor> {
    let context = context.unwrap_or_default();
    let cluster = cluster.unwrap_or_default();

    if context == "minikube" || cluster == "minikube" {
        return Some(named(Kind::Minikube, cluster));
    }

    if context == "microk8s" || cluster.starts_with("microk8s-") {
        return Some(named(Kind::Microk8s, cluster));
    }

    if context == "rancher-desktop" {
        return Some(named(Kind::RancherDesktop, cluster));
    }

    // eksctl names clusters "<name>.<region>.eksctl.io"
    if let Some(stripped) = cluster.strip_suffix(".eksctl.io") {
        let name = stripped.split('.').next().unwrap_or(stripped);
        return Some(named(Kind::Eks, name));
    }

    None
}

fn classify_node(node: &NodeFacts) -> Option<Kind> {
    for label in node.labels.keys() {
        if label.starts_with("eks.amazonaws.com/") {
            return Some(Kind::Eks);
        }
        if label.starts_with("cloud.google.com/gke-") {
            return Some(Kind::Gke);
        }
        if label.starts_with("kubernetes.azure.com/") {
            return Some(Kind::Aks);
        }
        if label.starts_with("k3s.io/") {
            return Some(Kind::K3s);
        }
    }

    match node.provider_id.as_deref() {
        Some(id) if id.starts_with("kind://") => Some(Kind::Kind),
        _ => None,
    }
}

/// Classify from node facts, falling back to kubeconfig naming conventions
pub fn classify_nodes(cluster: Option<&str>, nodes: &[NodeFacts]) -> Flavor {
    let cluster = cluster.unwrap_or_default();
    let kind_name = cluster.strip_prefix("kind-");

    let detected = nodes.iter().find_map(classify_node);

    match (detected, kind_name) {
        (Some(Kind::Kind), Some(name)) | (None, Some(name)) => named(Kind::Kind, name),
        (Some(kind), _) => named(kind, cluster),
        (None, None) => named(Kind::Unknown, cluster),
    }
}

// =============================================================================
// Detector
// =============================================================================

/// [`FlavorDetector`] backed by a kubeconfig context and the node list
pub struct KubeFlavorDetector {
    client: Client,
    context: Option<String>,
    cluster: Option<String>,
}

impl KubeFlavorDetector {
    /// Build a detector for `context`, or the kubeconfig's current context
    pub async fn from_kubeconfig(context: Option<String>) -> Result<Self> {
        let kubeconfig = Kubeconfig::read()
            .map_err(|e| Error::Configuration(format!("Failed to read kubeconfig: {}", e)))?;

        let context_name = context.or_else(|| kubeconfig.current_context.clone());
        let cluster = context_name.as_deref().and_then(|name| {
            kubeconfig
                .contexts
                .iter()
                .find(|c| c.name == name)
                .and_then(|c| c.context.as_ref())
                .map(|c| c.cluster.clone())
        });

        let options = KubeConfigOptions {
            context: context_name.clone(),
            ..Default::default()
        };
        let config = Config::from_custom_kubeconfig(kubeconfig, &options)
            .await
            .map_err(|e| Error::Configuration(format!("Failed to load kubeconfig: {}", e)))?;
        let client = Client::try_from(config)?;

        debug!("Using kubeconfig context {:?} (cluster {:?})", context_name, cluster);

        Ok(Self::new(client, context_name, cluster))
    }

    pub fn new(client: Client, context: Option<String>, cluster: Option<String>) -> Self {
        Self {
            client,
            context,
            cluster,
        }
    }

    async fn node_facts(&self) -> Result<Vec<NodeFacts>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes.list(&ListParams::default().limit(NODE_SAMPLE_LIMIT)).await?;
        Ok(list.items.iter().map(NodeFacts::from).collect())
    }
}

#[async_trait]
impl FlavorDetector for KubeFlavorDetector {
    async fn detect_flavor(&self) -> Flavor {
        if let Some(flavor) = classify_context(self.context.as_deref(), self.cluster.as_deref()) {
            return flavor;
        }

        let nodes = match self.node_facts().await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!("Unable to list nodes for flavor detection: {}", e);
                Vec::new()
            }
        };

        classify_nodes(self.cluster.as_deref(), &nodes)
    }
}
