//! Built-in Validation Checks
//!
//! Flavor-specific preconditions that shell out to the tooling a user runs
//! alongside a local or managed cluster and compare its version against the
//! minimum the installer supports.

use crate::domain::ports::{CheckContext, ValidationCheck};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::debug;

// =============================================================================
// Version
// =============================================================================

/// `major.minor.patch` version as printed by CLI tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self { major, minor, patch }
    }

    /// Find the first token in `output` that parses as a version
    pub fn find_in(output: &str) -> Result<Self> {
        output
            .split_whitespace()
            .find_map(|token| token.parse().ok())
            .ok_or_else(|| Error::VersionParse(format!("no version found in {:?}", output.trim())))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch).cmp(&(other.major, other.minor, other.patch))
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Accepts `1.2.3`, `v1.2.3`, `1.2` and ignores `-pre`/`+build` suffixes
impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim().trim_start_matches('v');
        let core = trimmed
            .split(|c| c == '-' || c == '+')
            .next()
            .unwrap_or_default();

        let mut parts = core.split('.');
        let mut next = |required: bool| -> Result<u64> {
            match parts.next() {
                Some(p) => p
                    .parse()
                    .map_err(|_| Error::VersionParse(format!("invalid version {:?}", s))),
                None if required => Err(Error::VersionParse(format!("invalid version {:?}", s))),
                None => Ok(0),
            }
        };

        let version = Version::new(next(true)?, next(true)?, next(false)?);
        if parts.next().is_some() {
            return Err(Error::VersionParse(format!("invalid version {:?}", s)));
        }
        Ok(version)
    }
}

fn require_at_least(tool: &str, found: Version, required: Version) -> Result<()> {
    if found < required {
        return Err(Error::VersionTooOld {
            tool: tool.to_string(),
            found: found.to_string(),
            required: required.to_string(),
        });
    }
    debug!("{} version {} satisfies minimum {}", tool, found, required);
    Ok(())
}

// =============================================================================
// minikube
// =============================================================================

/// minikube older than this cannot run the datapath
pub const MINIMUM_MINIKUBE_VERSION: Version = Version::new(1, 5, 2);

/// Requires a recent enough `minikube` binary
#[derive(Debug, Clone)]
pub struct MinikubeVersionCheck {
    pub minimum: Version,
}

impl Default for MinikubeVersionCheck {
    fn default() -> Self {
        Self {
            minimum: MINIMUM_MINIKUBE_VERSION,
        }
    }
}

#[async_trait]
impl ValidationCheck for MinikubeVersionCheck {
    fn name(&self) -> &str {
        "minimum-version"
    }

    async fn check(&self, ctx: &CheckContext<'_>) -> Result<()> {
        let output = ctx.runner.run("minikube", &["version", "--short"]).await?;
        let version = Version::find_in(&output)?;
        require_at_least("minikube", version, self.minimum)
    }
}

// =============================================================================
// kind
// =============================================================================

/// First kind release that supports disabling the default CNI
pub const MINIMUM_KIND_VERSION: Version = Version::new(0, 7, 0);

/// Requires a recent enough `kind` binary
#[derive(Debug, Clone)]
pub struct KindVersionCheck {
    pub minimum: Version,
}

impl Default for KindVersionCheck {
    fn default() -> Self {
        Self {
            minimum: MINIMUM_KIND_VERSION,
        }
    }
}

#[async_trait]
impl ValidationCheck for KindVersionCheck {
    fn name(&self) -> &str {
        "kind-version"
    }

    async fn check(&self, ctx: &CheckContext<'_>) -> Result<()> {
        // "kind v0.20.0 go1.20.4 linux/amd64"
        let output = ctx.runner.run("kind", &["version"]).await?;
        let version = Version::find_in(&output)?;
        require_at_least("kind", version, self.minimum)
    }
}

// =============================================================================
// Azure CLI
// =============================================================================

/// First az CLI release able to describe BYOCNI clusters
pub const MINIMUM_AZURE_CLI_VERSION: Version = Version::new(2, 39, 0);

#[derive(Debug, Deserialize)]
struct AzVersionOutput {
    #[serde(rename = "azure-cli")]
    azure_cli: String,
}

/// Requires an `az` CLI that can report whether an AKS cluster runs in
/// bring-your-own-CNI mode
#[derive(Debug, Clone)]
pub struct AzureCliVersionCheck {
    pub minimum: Version,
}

impl Default for AzureCliVersionCheck {
    fn default() -> Self {
        Self {
            minimum: MINIMUM_AZURE_CLI_VERSION,
        }
    }
}

#[async_trait]
impl ValidationCheck for AzureCliVersionCheck {
    fn name(&self) -> &str {
        "az-version"
    }

    async fn check(&self, ctx: &CheckContext<'_>) -> Result<()> {
        let output = ctx.runner.run("az", &["version", "--output", "json"]).await?;
        let parsed: AzVersionOutput = serde_json::from_str(&output)?;
        let version: Version = parsed.azure_cli.parse()?;
        require_at_least("az", version, self.minimum)
    }
}
