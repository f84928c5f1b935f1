//! Install parameters and the value types they carry
//!
//! Optional fields start as `None` ("infer") and are filled in at most once by
//! the resolution stages. A value the user supplied is never overwritten.

use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

// =============================================================================
// Datapath Mode
// =============================================================================

/// Networking transport the installer will configure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DatapathMode {
    Tunnel,
    Native,
    AwsEni,
    Gke,
    Azure,
    AksByocni,
}

impl DatapathMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatapathMode::Tunnel => "tunnel",
            DatapathMode::Native => "native",
            DatapathMode::AwsEni => "aws-eni",
            DatapathMode::Gke => "gke",
            DatapathMode::Azure => "azure",
            DatapathMode::AksByocni => "aks-byocni",
        }
    }
}

impl std::fmt::Display for DatapathMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatapathMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "tunnel" => Ok(DatapathMode::Tunnel),
            "native" => Ok(DatapathMode::Native),
            "aws-eni" => Ok(DatapathMode::AwsEni),
            "gke" => Ok(DatapathMode::Gke),
            "azure" => Ok(DatapathMode::Azure),
            "aks-byocni" => Ok(DatapathMode::AksByocni),
            other => Err(format!(
                "unknown datapath mode {:?} (expected one of tunnel, native, aws-eni, gke, azure, aks-byocni)",
                other
            )),
        }
    }
}

// =============================================================================
// Kube-Proxy Replacement
// =============================================================================

/// Whether the installed datapath replaces kube-proxy
///
/// Deserializes from either a mode name or a bare YAML/JSON boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyReplacement {
    Disabled,
    Partial,
    Strict,
    True,
    False,
}

impl ProxyReplacement {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyReplacement::Disabled => "disabled",
            ProxyReplacement::Partial => "partial",
            ProxyReplacement::Strict => "strict",
            ProxyReplacement::True => "true",
            ProxyReplacement::False => "false",
        }
    }
}

impl std::fmt::Display for ProxyReplacement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyReplacement {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(ProxyReplacement::Disabled),
            "partial" => Ok(ProxyReplacement::Partial),
            "strict" => Ok(ProxyReplacement::Strict),
            "true" => Ok(ProxyReplacement::True),
            "false" => Ok(ProxyReplacement::False),
            other => Err(format!("unknown kube-proxy-replacement mode {:?}", other)),
        }
    }
}

impl<'de> Deserialize<'de> for ProxyReplacement {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Mode(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(true) => Ok(ProxyReplacement::True),
            Raw::Flag(false) => Ok(ProxyReplacement::False),
            Raw::Mode(mode) => mode.parse().map_err(serde::de::Error::custom),
        }
    }
}

// =============================================================================
// Encryption Mode
// =============================================================================

/// Transparent encryption modes accepted by the installer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncryptionMode {
    Disabled,
    IPsec,
    WireGuard,
}

impl EncryptionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EncryptionMode::Disabled => "disabled",
            EncryptionMode::IPsec => "ipsec",
            EncryptionMode::WireGuard => "wireguard",
        }
    }
}

impl std::fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-sensitive: `IPsec` or `WireGuard` spelled with capitals are rejected
impl FromStr for EncryptionMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(EncryptionMode::Disabled),
            "ipsec" => Ok(EncryptionMode::IPsec),
            "wireguard" => Ok(EncryptionMode::WireGuard),
            other => Err(format!("unknown encryption mode {:?}", other)),
        }
    }
}

// =============================================================================
// Azure Parameters
// =============================================================================

/// AKS-specific configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct AzureParameters {
    /// Resource group holding the AKS cluster
    pub resource_group: Option<String>,
    /// Subscription the cluster belongs to; the az CLI default when unset
    pub subscription_id: Option<String>,
    /// AKS resource name; the detector's raw cluster name when unset
    pub cluster_name: Option<String>,
    /// Filled in by the BYOCNI lookup during datapath resolution
    pub is_byocni: bool,
}

// =============================================================================
// Install Parameters
// =============================================================================

/// Default chart version reported by the install path
pub const DEFAULT_CHART_VERSION: &str = "1.16.5";

/// User-supplied installer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstallParameters {
    /// Check names to skip, matched exactly
    pub disable_checks: Vec<String>,
    /// Datapath mode; `None` means infer from the flavor
    pub datapath_mode: Option<DatapathMode>,
    /// Kube-proxy replacement; `None` means infer from the flavor
    pub kube_proxy_replacement: Option<ProxyReplacement>,
    /// Cluster name; `None` means adopt the detector's name
    pub cluster_name: Option<String>,
    /// Encryption mode, validated by the configuration gate
    pub encryption: String,
    /// Deprecated IPAM override, passed through untouched
    pub ipam: Option<String>,
    /// AKS-specific configuration
    pub azure: AzureParameters,
    /// Chart version that will be installed
    pub chart_version: String,
}

impl Default for InstallParameters {
    fn default() -> Self {
        Self {
            disable_checks: Vec::new(),
            datapath_mode: None,
            kube_proxy_replacement: None,
            cluster_name: None,
            encryption: EncryptionMode::Disabled.to_string(),
            ipam: None,
            azure: AzureParameters::default(),
            chart_version: DEFAULT_CHART_VERSION.to_string(),
        }
    }
}

impl InstallParameters {
    /// Whether the named check was disabled by the user
    pub fn check_disabled(&self, name: &str) -> bool {
        self.disable_checks.iter().any(|n| n == name)
    }
}
