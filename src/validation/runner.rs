//! Check Runner
//!
//! Executes the checks registered for the detected flavor in registration
//! order, skipping the ones the user disabled and stopping at the first
//! failure.

use crate::domain::params::InstallParameters;
use crate::domain::ports::{CheckContext, CommandRunner, Flavor};
use crate::error::{Error, Result};
use crate::preflight::guard::RunGuard;
use crate::validation::registry::ValidationRegistry;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Outcome of a successful check run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    /// Checks that ran and passed, in order
    pub passed: Vec<String>,
    /// Checks skipped through `--disable-check`, in order
    pub skipped: Vec<String>,
}

impl CheckReport {
    pub fn is_empty(&self) -> bool {
        self.passed.is_empty() && self.skipped.is_empty()
    }
}

/// Runs a registry's checks for one flavor
pub struct CheckRunner<'a> {
    registry: &'a ValidationRegistry,
}

impl<'a> CheckRunner<'a> {
    pub fn new(registry: &'a ValidationRegistry) -> Self {
        Self { registry }
    }

    /// Run every non-disabled check for `flavor.kind`
    ///
    /// A kind without checks succeeds immediately with an empty report.
    /// The first failing check aborts the run and is reported as
    /// [`Error::ValidationCheck`] carrying the kind and the check name.
    pub async fn run(
        &self,
        flavor: &Flavor,
        params: &InstallParameters,
        runner: &dyn CommandRunner,
        guard: &RunGuard,
    ) -> Result<CheckReport> {
        let checks = self.registry.checks_for(flavor.kind);
        let mut report = CheckReport::default();

        if checks.is_empty() {
            return Ok(report);
        }

        info!("✨ Running {:?} validation checks", flavor.kind.to_string());

        let ctx = CheckContext {
            flavor,
            params,
            runner,
            cancel: guard.token(),
        };

        for check in checks {
            let name = check.name();

            if params.check_disabled(name) {
                info!("⏭️  Skipping disabled validation test {:?}", name);
                report.skipped.push(name.to_string());
                continue;
            }

            match guard.run(check.check(&ctx)).await {
                Ok(()) => report.passed.push(name.to_string()),
                Err(e) if e.is_cancellation() => return Err(e),
                Err(e) => {
                    error!("❌ Validation test {} failed: {}", name, e);
                    info!("ℹ️  You can disable the test with --disable-check={}", name);
                    return Err(Error::ValidationCheck {
                        kind: flavor.kind,
                        check: name.to_string(),
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(report)
    }
}
