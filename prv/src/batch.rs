use crate::registry::RegistryLookup;
use futures::stream::{self, StreamExt};
use req_verify_core::{PackageDeclaration, RegistryError, Report, VerificationOutcome, verify};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

/// Limits applied to one verification batch
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Upper bound for a single registry lookup
    pub lookup_timeout: Duration,
    /// Maximum number of verification tasks alive at once
    pub max_concurrency: usize,
    /// Point in time after which no lookup is started or awaited
    pub deadline: Option<Instant>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            lookup_timeout: Duration::from_secs(5),
            max_concurrency: 10,
            deadline: None,
        }
    }
}

/// Declarations partitioned by verification result
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub verified: Vec<VerificationOutcome>,
    pub unverified: Vec<VerificationOutcome>,
    /// Every diagnostic, labelled with its declaration name
    pub diagnostics: Vec<String>,
}

impl BatchOutcome {
    fn push(&mut self, outcome: VerificationOutcome) {
        self.diagnostics.extend(outcome.labelled_diagnostics());
        if outcome.verified {
            self.verified.push(outcome);
        } else {
            self.unverified.push(outcome);
        }
    }

    /// Combine with parse errors into the final report
    pub fn into_report(self, errors: Vec<String>) -> Report {
        Report::new(self.verified, self.unverified, errors)
    }
}

/// Verify all declarations concurrently.
///
/// At most `max_concurrency` tasks exist at once; the next declaration is
/// spawned only when a slot frees up. Returns once every task has finished,
/// in input order, and every input declaration appears exactly once in the
/// result. Failures never abort the batch: they mark the affected
/// declaration unverified with a diagnostic.
pub async fn verify_batch(
    declarations: Vec<PackageDeclaration>,
    registry: Arc<dyn RegistryLookup>,
    options: &BatchOptions,
    progress_callback: impl Fn(usize, usize) + Send + Sync + 'static,
) -> BatchOutcome {
    let total = declarations.len();
    let progress_callback = Arc::new(progress_callback);
    let completed = Arc::new(AtomicUsize::new(0));
    let shared_options = Arc::new(options.clone());

    let results: Vec<_> = stream::iter(declarations)
        .map(|declaration| {
            let fallback = declaration.clone();
            let registry = Arc::clone(&registry);
            let callback = Arc::clone(&progress_callback);
            let completed = Arc::clone(&completed);
            let options = Arc::clone(&shared_options);

            let task = tokio::spawn(async move {
                let outcome = check_declaration(declaration, registry.as_ref(), &options).await;

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                callback(done, total);

                outcome
            });

            async move { (fallback, task.await) }
        })
        .buffered(options.max_concurrency.max(1))
        .collect()
        .await;

    let mut outcome = BatchOutcome::default();
    for (fallback, result) in results {
        match result {
            Ok(verified) => outcome.push(verified),
            Err(e) => {
                warn!(package = fallback.name(), "verification task failed: {e}");
                outcome.push(VerificationOutcome::new(
                    fallback,
                    false,
                    vec![format!("verification task failed: {e}")],
                ));
            }
        }
    }

    debug!(
        verified = outcome.verified.len(),
        unverified = outcome.unverified.len(),
        "verification batch finished"
    );

    outcome
}

async fn check_declaration(
    declaration: PackageDeclaration,
    registry: &dyn RegistryLookup,
    options: &BatchOptions,
) -> VerificationOutcome {
    if !declaration.requires_registry() {
        return verify(declaration, &[]);
    }

    match lookup_versions(declaration.name(), registry, options).await {
        Ok(versions) => {
            debug!(
                package = declaration.name(),
                count = versions.len(),
                "registry returned versions"
            );
            verify(declaration, &versions)
        }
        Err(e) => {
            warn!(package = declaration.name(), "{e}");
            VerificationOutcome::new(declaration, false, vec![e.to_string()])
        }
    }
}

/// Registry lookup bounded by the per-lookup timeout and the batch deadline
async fn lookup_versions(
    package: &str,
    registry: &dyn RegistryLookup,
    options: &BatchOptions,
) -> Result<Vec<String>, RegistryError> {
    let deadline_exceeded = || RegistryError::DeadlineExceeded {
        package: package.to_string(),
    };

    let now = Instant::now();
    let timeout_bound = now + options.lookup_timeout;
    let (bound, by_deadline) = match options.deadline {
        // timeout_at polls the lookup once before checking the clock
        Some(deadline) if deadline <= now => return Err(deadline_exceeded()),
        Some(deadline) if deadline < timeout_bound => (deadline, true),
        _ => (timeout_bound, false),
    };

    match timeout_at(bound, registry.get_available_versions(package)).await {
        Ok(result) => result,
        Err(_) if by_deadline => Err(deadline_exceeded()),
        Err(_) => Err(RegistryError::Timeout {
            package: package.to_string(),
            timeout: options.lookup_timeout,
        }),
    }
}
