use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::RESULTS_FILE_NAME;
use crate::error::{BenchError, Result};
use crate::job::{JobPlan, OutputTarget};
use crate::report::EngineOutput;
use crate::runner::disk::{check_capacity, DiskUsage};
use crate::runner::engine::Engine;

/// Removes transient files when dropped, whatever path the run took.
struct CleanupGuard {
    paths: Vec<PathBuf>,
}

impl CleanupGuard {
    fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        for path in &self.paths {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }
}

pub struct BenchmarkRunner<E: Engine> {
    engine: E,
    results_path: PathBuf,
}

impl<E: Engine> BenchmarkRunner<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            results_path: PathBuf::from(RESULTS_FILE_NAME),
        }
    }

    /// Where the engine's raw JSON is kept after the run.
    pub fn with_results_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.results_path = path.into();
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    /// Runs every sub-job of `plan` in one engine invocation.
    ///
    /// `interrupt` resolving before the engine finishes abandons the run with
    /// [`BenchError::Interrupted`]. The job file and the test data file are
    /// removed on every exit path.
    pub async fn run<I>(&self, plan: &JobPlan, interrupt: I) -> Result<EngineOutput>
    where
        I: Future<Output = ()>,
    {
        let config = plan.config();
        let usage = DiskUsage::probe(&config.directory)?;
        check_capacity(&config.directory, &usage, config.size)?;

        let job_file = config.job_file_path();
        let _cleanup = CleanupGuard::new(vec![job_file.clone(), config.test_file_path()]);

        let document = plan.render();
        debug!("Job file {}:\n{}", job_file.display(), document);
        document.write_to(&OutputTarget::File(job_file.clone()))?;

        info!(
            "Running {} sub-jobs with {}",
            plan.sub_jobs().len(),
            self.engine.name()
        );

        let raw = tokio::select! {
            result = self.engine.run(&job_file) => result?,
            _ = interrupt => {
                warn!("Interrupted, abandoning benchmark run");
                return Err(BenchError::Interrupted);
            }
        };

        std::fs::write(&self.results_path, &raw).map_err(|e| {
            BenchError::io(
                format!("Failed to save results to {}", self.results_path.display()),
                e,
            )
        })?;
        info!("Raw results saved to {}", self.results_path.display());

        EngineOutput::parse(&raw)
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
