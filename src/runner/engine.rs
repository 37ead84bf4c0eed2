use lazy_static::lazy_static;
use regex::Regex;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{BenchError, Result};
use crate::report::DirectionStats;

lazy_static! {
    static ref VERSION_RE: Regex =
        Regex::new(r"^fio-(\d+)\.(\d+)(?:\.(\d+))?").expect("fio version pattern");
}

/// External benchmark engine: reports its version and runs a job file,
/// returning the raw JSON it prints.
pub trait Engine {
    fn name(&self) -> &str;

    fn version(&self) -> impl Future<Output = Result<String>> + Send;

    fn run(&self, job_file: &Path) -> impl Future<Output = Result<String>> + Send;
}

/// Runs the `fio` binary as a subprocess.
#[derive(Debug, Clone)]
pub struct FioEngine {
    binary: String,
}

impl FioEngine {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn invocation_error(&self, reason: impl Into<String>) -> BenchError {
        BenchError::EngineInvocation {
            engine: self.binary.clone(),
            reason: reason.into(),
        }
    }
}

impl Default for FioEngine {
    fn default() -> Self {
        Self::new("fio")
    }
}

impl Engine for FioEngine {
    fn name(&self) -> &str {
        &self.binary
    }

    fn version(&self) -> impl Future<Output = Result<String>> + Send {
        async move {
            debug!("Probing engine version: {} --version", self.binary);
            let output = Command::new(&self.binary)
                .arg("--version")
                .stdin(Stdio::null())
                .output()
                .await
                .map_err(|e| self.invocation_error(e.to_string()))?;

            if !output.status.success() {
                return Err(self.invocation_error(format!(
                    "version probe exited with {}",
                    output.status
                )));
            }

            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or_default()
                .trim()
                .to_string();
            debug!("Engine reports version '{}'", version);
            Ok(version)
        }
    }

    fn run(&self, job_file: &Path) -> impl Future<Output = Result<String>> + Send {
        let job_file = job_file.to_path_buf();
        async move {
            debug!(
                "Running: {} --output-format=json {}",
                self.binary,
                job_file.display()
            );

            // Dropping the future (on interrupt) must take the child down too.
            let child = Command::new(&self.binary)
                .arg("--output-format=json")
                .arg(&job_file)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| self.invocation_error(e.to_string()))?;

            let output = child
                .wait_with_output()
                .await
                .map_err(|e| self.invocation_error(e.to_string()))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(self.invocation_error(format!(
                    "exited with {}: {}",
                    output.status,
                    stderr.trim()
                )));
            }

            String::from_utf8(output.stdout)
                .map_err(|_| BenchError::MalformedOutput("output is not UTF-8".to_string()))
        }
    }
}

/// Which bandwidth field the engine reports and how to turn it into MB/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandwidthScale {
    pub field: &'static str,
    pub divisor: f64,
}

impl BandwidthScale {
    /// fio 3.1 reports `bw` in KiB/s.
    pub const LEGACY: BandwidthScale = BandwidthScale {
        field: "bw",
        divisor: 1_000_000.0 / 1024.0,
    };

    /// Later releases report `bw_bytes` in bytes/s.
    pub const CURRENT: BandwidthScale = BandwidthScale {
        field: "bw_bytes",
        divisor: 1_000_000.0,
    };

    pub fn from_version(version: &str) -> Self {
        match parse_version(version) {
            Some((3, 1, None)) => Self::LEGACY,
            Some(_) => Self::CURRENT,
            None => {
                debug!("Unrecognised engine version '{}', assuming current", version);
                Self::CURRENT
            }
        }
    }

    /// Raw bandwidth value for this scale's field.
    pub fn raw_bandwidth(&self, stats: &DirectionStats) -> Option<f64> {
        if self.field == Self::LEGACY.field {
            stats.bw
        } else {
            stats.bw_bytes
        }
    }

    pub fn to_megabytes(&self, raw: f64) -> f64 {
        raw / self.divisor
    }
}

fn parse_version(version: &str) -> Option<(u32, u32, Option<u32>)> {
    let caps = VERSION_RE.captures(version.trim())?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    let patch = caps.get(3).and_then(|m| m.as_str().parse().ok());
    Some((major, minor, patch))
}
