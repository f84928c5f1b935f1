//! Preflight Orchestrator
//!
//! Owns the install parameters for one run and drives them through:
//! - Flavor detection
//! - Flavor-specific validation checks
//! - Cluster name, datapath and kube-proxy replacement defaults
//! - The configuration gate
//!
//! Every stage runs strictly after the previous one committed its output and
//! the first error ends the run.

use crate::domain::params::{EncryptionMode, InstallParameters};
use crate::domain::ports::{ByocniLookupRef, CommandRunnerRef, Flavor, FlavorDetectorRef};
use crate::error::Result;
use crate::preflight::guard::RunGuard;
use crate::resolve::{ConfigurationGate, DatapathResolver};
use crate::validation::{CheckReport, CheckRunner, ValidationRegistry};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Outcome
// =============================================================================

/// Accepted result of the install path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightOutcome {
    /// Detected flavor
    pub flavor: Flavor,
    /// Checks that ran or were skipped
    pub checks: CheckReport,
    /// Encryption mode accepted by the gate
    pub encryption: EncryptionMode,
    /// Fully resolved parameters
    pub params: InstallParameters,
}

// =============================================================================
// Preflight
// =============================================================================

/// Runs autodetection and validation for one install or uninstall invocation
pub struct Preflight {
    detector: FlavorDetectorRef,
    byocni: ByocniLookupRef,
    runner: CommandRunnerRef,
    registry: ValidationRegistry,
    gate: ConfigurationGate,
    guard: RunGuard,
    params: InstallParameters,
    flavor: Option<Flavor>,
}

impl Preflight {
    /// Create a preflight run over `params` using the built-in checks
    pub fn new(
        detector: FlavorDetectorRef,
        byocni: ByocniLookupRef,
        runner: CommandRunnerRef,
        params: InstallParameters,
    ) -> Self {
        Self {
            detector,
            byocni,
            runner,
            registry: ValidationRegistry::global().clone(),
            gate: ConfigurationGate::new(),
            guard: RunGuard::default(),
            params,
            flavor: None,
        }
    }

    /// Use a custom check registry
    pub fn with_registry(mut self, registry: ValidationRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Honor the given cancellation token and deadline
    pub fn with_guard(mut self, guard: RunGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Parameters in their current state of resolution
    pub fn params(&self) -> &InstallParameters {
        &self.params
    }

    /// Flavor detected by the last autodetection, if any
    pub fn flavor(&self) -> Option<&Flavor> {
        self.flavor.as_ref()
    }

    /// Detect and store the cluster flavor
    ///
    /// This is the whole uninstall path: no checks and no resolution, so it
    /// works against a misconfigured or partially installed cluster. It only
    /// fails when the run is cancelled.
    pub async fn autodetect(&mut self) -> Result<&Flavor> {
        let flavor = self.guard.run_infallible(self.detector.detect_flavor()).await?;

        if !flavor.kind.is_unknown() {
            info!("🔮 Auto-detected Kubernetes kind: {}", flavor.kind);
        }

        Ok(self.flavor.insert(flavor))
    }

    /// Install path: detect, validate, resolve defaults and gate
    pub async fn autodetect_and_validate(&mut self) -> Result<PreflightOutcome> {
        let flavor = self.autodetect().await?.clone();

        let checks = CheckRunner::new(&self.registry)
            .run(&flavor, &self.params, self.runner.as_ref(), &self.guard)
            .await?;

        info!("ℹ️  Using chart version {}", self.params.chart_version);

        self.gate.adopt_cluster_name(&flavor, &mut self.params);

        DatapathResolver::new(self.byocni.as_ref())
            .resolve(&flavor, &mut self.params, &self.guard)
            .await?;

        self.gate.note_deprecated_ipam(&self.params);

        let encryption = self.gate.check(&self.params)?;

        Ok(PreflightOutcome {
            flavor,
            checks,
            encryption,
            params: self.params.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AzCliByocniLookup;
    use crate::domain::params::{AzureParameters, DatapathMode, ProxyReplacement};
    use crate::domain::ports::{
        ByocniLookup, CheckContext, CommandRunner, FlavorDetector, Kind, ValidationCheck,
    };
    use crate::error::{ClusterNameError, Error};
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    // =========================================================================
    // Stubs
    // =========================================================================

    struct FixedDetector(Flavor);

    #[async_trait]
    impl FlavorDetector for FixedDetector {
        async fn detect_flavor(&self) -> Flavor {
            self.0.clone()
        }
    }

    struct StubLookup {
        answer: Option<bool>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ByocniLookup for StubLookup {
        async fn detect_byocni(&self, _azure: &AzureParameters, _cluster: Option<&str>) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.ok_or_else(|| Error::ProviderLookup {
                provider: "azure".into(),
                reason: "cluster not found".into(),
            })
        }
    }

    struct NoopRunner;

    #[async_trait]
    impl CommandRunner for NoopRunner {
        async fn run(&self, _program: &str, _args: &[&str]) -> Result<String> {
            Ok(String::new())
        }
    }

    struct Recording {
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ValidationCheck for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn check(&self, _ctx: &CheckContext<'_>) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::Configuration("precondition not met".into()))
            } else {
                Ok(())
            }
        }
    }

    struct Harness {
        preflight: Preflight,
        lookup_calls: Arc<AtomicUsize>,
        check_calls: Arc<AtomicUsize>,
    }

    fn harness(flavor: Flavor, byocni: Option<bool>, check_fails: bool, params: InstallParameters) -> Harness {
        let lookup_calls = Arc::new(AtomicUsize::new(0));
        let check_calls = Arc::new(AtomicUsize::new(0));

        let registry = ValidationRegistry::builder()
            .register(
                flavor.kind,
                Recording {
                    fail: check_fails,
                    calls: check_calls.clone(),
                },
            )
            .unwrap()
            .build();

        let preflight = Preflight::new(
            Arc::new(FixedDetector(flavor)),
            Arc::new(StubLookup {
                answer: byocni,
                calls: lookup_calls.clone(),
            }),
            Arc::new(NoopRunner),
            params,
        )
        .with_registry(registry);

        Harness {
            preflight,
            lookup_calls,
            check_calls,
        }
    }

    fn named(name: &str) -> InstallParameters {
        InstallParameters {
            cluster_name: Some(name.into()),
            ..Default::default()
        }
    }

    // =========================================================================
    // Install path
    // =========================================================================

    #[tokio::test]
    async fn test_kind_without_overrides() {
        let flavor = Flavor::new(Kind::Kind).with_cluster_name("kind");
        let mut h = harness(flavor, None, false, InstallParameters::default());

        let outcome = h.preflight.autodetect_and_validate().await.unwrap();

        assert_eq!(outcome.params.datapath_mode, Some(DatapathMode::Tunnel));
        assert_eq!(outcome.params.kube_proxy_replacement, Some(ProxyReplacement::Disabled));
        assert_eq!(outcome.params.cluster_name.as_deref(), Some("kind"));
        assert_eq!(outcome.encryption, EncryptionMode::Disabled);
        assert_eq!(outcome.checks.passed, vec!["recording"]);
        assert_eq!(h.lookup_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_aks_byocni_without_overrides() {
        let flavor = Flavor::new(Kind::Aks).with_cluster_name("aks_prod");
        let mut h = harness(flavor, Some(true), false, InstallParameters::default());

        let outcome = h.preflight.autodetect_and_validate().await.unwrap();

        assert_eq!(outcome.params.datapath_mode, Some(DatapathMode::AksByocni));
        assert_eq!(outcome.params.kube_proxy_replacement, Some(ProxyReplacement::Disabled));
        assert_eq!(outcome.params.cluster_name.as_deref(), Some("aks-prod"));
        assert!(outcome.params.azure.is_byocni);
        assert_eq!(h.lookup_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_aks_lookup_failure_stops_the_run() {
        // the gate would reject this encryption mode if it ran
        let params = InstallParameters {
            encryption: "aes".into(),
            ..named("aks")
        };
        let mut h = harness(Flavor::new(Kind::Aks), None, false, params);

        let err = h.preflight.autodetect_and_validate().await.unwrap_err();

        assert_matches!(err, Error::ProviderLookup { .. });
        assert_eq!(h.preflight.params().datapath_mode, None);
        assert_eq!(h.preflight.params().kube_proxy_replacement, None);
    }

    #[tokio::test]
    async fn test_check_failure_stops_before_resolution() {
        let flavor = Flavor::new(Kind::Aks).with_cluster_name("aks");
        let mut h = harness(flavor, Some(true), true, InstallParameters::default());

        let err = h.preflight.autodetect_and_validate().await.unwrap_err();

        assert_matches!(err, Error::ValidationCheck { kind: Kind::Aks, ref check, .. } if check == "recording");
        assert_eq!(h.lookup_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.preflight.params().cluster_name, None);
        assert_eq!(h.preflight.params().datapath_mode, None);
    }

    #[tokio::test]
    async fn test_disabled_check_lets_run_continue() {
        let params = InstallParameters {
            disable_checks: vec!["recording".into()],
            ..named("dev")
        };
        let mut h = harness(Flavor::new(Kind::Minikube), None, true, params);

        let outcome = h.preflight.autodetect_and_validate().await.unwrap();

        assert_eq!(h.check_calls.load(Ordering::SeqCst), 0);
        assert_eq!(outcome.checks.skipped, vec!["recording"]);
        assert_eq!(outcome.params.datapath_mode, Some(DatapathMode::Tunnel));
    }

    #[tokio::test]
    async fn test_user_overrides_survive() {
        let params = InstallParameters {
            datapath_mode: Some(DatapathMode::Native),
            kube_proxy_replacement: Some(ProxyReplacement::Strict),
            cluster_name: Some("mine".into()),
            encryption: "ipsec".into(),
            ..Default::default()
        };
        let flavor = Flavor::new(Kind::Aks).with_cluster_name("detected_name");
        let mut h = harness(flavor, Some(true), false, params);

        let outcome = h.preflight.autodetect_and_validate().await.unwrap();

        assert_eq!(outcome.params.datapath_mode, Some(DatapathMode::Native));
        assert_eq!(outcome.params.kube_proxy_replacement, Some(ProxyReplacement::Strict));
        assert_eq!(outcome.params.cluster_name.as_deref(), Some("mine"));
        assert_eq!(outcome.encryption, EncryptionMode::IPsec);
        assert_eq!(h.lookup_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_gate_rejects_detected_name_with_dot() {
        let flavor = Flavor::new(Kind::Gke).with_cluster_name("gke.example");
        let mut h = harness(flavor, None, false, InstallParameters::default());

        let err = h.preflight.autodetect_and_validate().await.unwrap_err();

        assert_matches!(
            err,
            Error::InvalidClusterName { reason: ClusterNameError::ContainsDot, .. }
        );
        // resolution already ran, the gate is last
        assert_eq!(h.preflight.params().datapath_mode, Some(DatapathMode::Gke));
    }

    #[tokio::test]
    async fn test_missing_cluster_name_is_rejected() {
        let mut h = harness(Flavor::new(Kind::Unknown), None, false, InstallParameters::default());

        let err = h.preflight.autodetect_and_validate().await.unwrap_err();

        assert_matches!(
            err,
            Error::InvalidClusterName { reason: ClusterNameError::PatternMismatch, .. }
        );
    }

    #[tokio::test]
    async fn test_invalid_encryption_rejected() {
        let params = InstallParameters {
            encryption: "aes".into(),
            ..named("prod")
        };
        let mut h = harness(Flavor::new(Kind::Eks), None, false, params);

        let err = h.preflight.autodetect_and_validate().await.unwrap_err();

        assert_matches!(err, Error::InvalidEncryptionMode(ref m) if m == "aes");
    }

    #[tokio::test]
    async fn test_cancelled_run_reports_cancellation() {
        let token = CancellationToken::new();
        let mut h = harness(Flavor::new(Kind::Kind), None, false, named("kind"));
        h.preflight = h.preflight.with_guard(RunGuard::new(token.clone()));
        token.cancel();

        let err = h.preflight.autodetect_and_validate().await.unwrap_err();

        assert_matches!(err, Error::Cancelled);
        assert_eq!(h.check_calls.load(Ordering::SeqCst), 0);
        assert!(h.preflight.flavor().is_none());
    }

    /// Runner that answers like `az aks show` for a BYOCNI cluster and keeps
    /// the arguments of every call
    #[derive(Default)]
    struct AzRecorder {
        calls: std::sync::Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl CommandRunner for AzRecorder {
        async fn run(&self, _program: &str, args: &[&str]) -> Result<String> {
            self.calls.lock().unwrap().push(args.iter().map(|a| a.to_string()).collect());
            Ok(r#"{"networkProfile": {"networkPlugin": "none"}}"#.to_string())
        }
    }

    async fn az_name_for(detected: &str, params: InstallParameters) -> (String, PreflightOutcome) {
        let recorder = Arc::new(AzRecorder::default());
        let mut preflight = Preflight::new(
            Arc::new(FixedDetector(Flavor::new(Kind::Aks).with_cluster_name(detected))),
            Arc::new(AzCliByocniLookup::new(recorder.clone())),
            recorder.clone(),
            params,
        )
        .with_registry(ValidationRegistry::default());

        let outcome = preflight.autodetect_and_validate().await.unwrap();

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let args = &calls[0];
        let name = args
            .iter()
            .position(|a| a == "--name")
            .map(|i| args[i + 1].clone())
            .unwrap();
        (name, outcome)
    }

    fn in_resource_group(params: InstallParameters) -> InstallParameters {
        InstallParameters {
            azure: AzureParameters {
                resource_group: Some("rg".into()),
                ..Default::default()
            },
            ..params
        }
    }

    #[tokio::test]
    async fn test_byocni_lookup_uses_raw_detected_name() {
        let (name, outcome) = az_name_for("prod_aks", in_resource_group(InstallParameters::default())).await;

        assert_eq!(name, "prod_aks");
        assert_eq!(outcome.params.cluster_name.as_deref(), Some("prod-aks"));
        assert_eq!(outcome.params.datapath_mode, Some(DatapathMode::AksByocni));
    }

    #[tokio::test]
    async fn test_byocni_lookup_ignores_installer_cluster_name() {
        let (name, outcome) = az_name_for("prod-aks", in_resource_group(named("mesh1"))).await;

        assert_eq!(name, "prod-aks");
        assert_eq!(outcome.params.cluster_name.as_deref(), Some("mesh1"));
    }

    #[tokio::test]
    async fn test_byocni_lookup_prefers_explicit_aks_name() {
        let mut params = in_resource_group(named("mesh1"));
        params.azure.cluster_name = Some("aks_west".into());

        let (name, _) = az_name_for("prod-aks", params).await;

        assert_eq!(name, "aks_west");
    }

    /// Detector that never returns
    struct HangingDetector;

    #[async_trait]
    impl FlavorDetector for HangingDetector {
        async fn detect_flavor(&self) -> Flavor {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_detector_past_deadline_times_out() {
        let mut preflight = Preflight::new(
            Arc::new(HangingDetector),
            Arc::new(StubLookup {
                answer: Some(true),
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Arc::new(NoopRunner),
            named("aks"),
        )
        .with_guard(RunGuard::with_timeout(
            CancellationToken::new(),
            std::time::Duration::from_millis(20),
        ));

        let err = preflight.autodetect_and_validate().await.unwrap_err();

        assert_matches!(err, Error::Timeout(_));
        assert!(preflight.flavor().is_none());
        assert_eq!(preflight.params().datapath_mode, None);
    }

    // =========================================================================
    // Uninstall path
    // =========================================================================

    #[tokio::test]
    async fn test_autodetect_only_detects() {
        let params = InstallParameters {
            encryption: "aes".into(),
            ..Default::default()
        };
        let flavor = Flavor::new(Kind::Aks).with_cluster_name("aks");
        let mut h = harness(flavor.clone(), None, true, params);

        let detected = h.preflight.autodetect().await.unwrap().clone();

        assert_eq!(detected, flavor);
        assert_eq!(h.preflight.flavor(), Some(&flavor));
        assert_eq!(h.check_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.lookup_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.preflight.params().datapath_mode, None);
        assert_eq!(h.preflight.params().cluster_name, None);
    }

    #[tokio::test]
    async fn test_autodetect_unknown_kind() {
        let mut h = harness(Flavor::default(), None, false, InstallParameters::default());

        let detected = h.preflight.autodetect().await.unwrap();

        assert!(detected.kind.is_unknown());
    }
}
