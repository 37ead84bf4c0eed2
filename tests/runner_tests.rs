use diskmark::config::GlobalConfig;
use diskmark::job::JobPlan;
use diskmark::report::{build_rows, ReportOptions};
use diskmark::runner::{BandwidthScale, BenchmarkRunner, Engine};
use diskmark::BenchError;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::sync::oneshot;

#[derive(Clone, Copy)]
enum Behaviour {
    Succeed,
    Fail,
    Hang,
}

/// Scripted engine that touches the test data file like fio would and
/// answers with measurements for every section in the job file.
struct FakeEngine {
    behaviour: Behaviour,
    test_file: PathBuf,
    runs: Arc<AtomicUsize>,
    started: Mutex<Option<oneshot::Sender<()>>>,
}

impl FakeEngine {
    fn new(behaviour: Behaviour, test_file: PathBuf) -> Self {
        Self {
            behaviour,
            test_file,
            runs: Arc::new(AtomicUsize::new(0)),
            started: Mutex::new(None),
        }
    }

    fn response(job_file: &Path) -> String {
        let content = std::fs::read_to_string(job_file).unwrap();
        let jobs: Vec<serde_json::Value> = content
            .lines()
            .filter(|l| l.starts_with('[') && *l != "[global]")
            .map(|l| {
                serde_json::json!({
                    "jobname": l.trim_matches(|c| c == '[' || c == ']'),
                    "read": { "bw_bytes": 200_000_000.0, "iops": 48828.0, "lat_ns": { "mean": 20480.0 } },
                    "write": { "bw_bytes": 100_000_000.0, "iops": 24414.0, "lat_ns": { "mean": 40960.0 } }
                })
            })
            .collect();
        serde_json::json!({ "fio version": "fio-3.35", "jobs": jobs }).to_string()
    }
}

impl Engine for FakeEngine {
    fn name(&self) -> &str {
        "fake-fio"
    }

    fn version(&self) -> impl Future<Output = diskmark::error::Result<String>> + Send {
        async { Ok("fio-3.35".to_string()) }
    }

    fn run(&self, job_file: &Path) -> impl Future<Output = diskmark::error::Result<String>> + Send {
        let job_file = job_file.to_path_buf();
        async move {
            self.runs.fetch_add(1, Ordering::SeqCst);
            assert!(job_file.exists(), "job file must exist while the engine runs");
            std::fs::write(&self.test_file, b"data").unwrap();

            match self.behaviour {
                Behaviour::Succeed => Ok(Self::response(&job_file)),
                Behaviour::Fail => Err(BenchError::EngineInvocation {
                    engine: "fake-fio".to_string(),
                    reason: "exited with status 1".to_string(),
                }),
                Behaviour::Hang => {
                    let sender = self.started.lock().unwrap().take();
                    if let Some(sender) = sender {
                        let _ = sender.send(());
                    }
                    std::future::pending::<()>().await;
                    unreachable!()
                }
            }
        }
    }
}

fn plan(dir: &Path, size: u64, mix: Option<u8>) -> JobPlan {
    let config = GlobalConfig::new(dir.to_path_buf(), size).with_mix_read(mix);
    JobPlan::from_specs::<&str>(config, &[]).unwrap()
}

fn transient_files(plan: &JobPlan) -> [PathBuf; 2] {
    [plan.config().job_file_path(), plan.config().test_file_path()]
}

#[tokio::test]
async fn test_successful_run_persists_results_and_cleans_up() {
    let target = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let plan = plan(target.path(), 1 << 20, Some(70));
    let engine = FakeEngine::new(Behaviour::Succeed, plan.config().test_file_path());
    let results_path = out.path().join("results.json");
    let runner = BenchmarkRunner::new(engine).with_results_path(&results_path);

    let output = runner.run(&plan, std::future::pending()).await.unwrap();

    assert_eq!(runner.engine().runs.load(Ordering::SeqCst), 1);
    assert_eq!(runner.results_path(), results_path.as_path());
    assert_eq!(output.jobs.len(), 12);
    for path in transient_files(&plan) {
        assert!(!path.exists(), "{} should be removed", path.display());
    }

    let saved = std::fs::read_to_string(&results_path).unwrap();
    assert!(saved.contains("\"jobname\":\"mix-3-RND4KQ1T1\""));

    let options = ReportOptions {
        mix_read: Some(70),
        extra_info: true,
    };
    let rows = build_rows(
        plan.jobs(),
        &output.into_index(),
        &BandwidthScale::CURRENT,
        &options,
    )
    .unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].read_mbps, 200.0);
    assert_eq!(rows[0].write_mbps, 100.0);
    assert_eq!(rows[0].mix_mbps, Some(170.0));
    assert!(rows[0].extra.is_none());
    let extra = rows[2].extra.as_ref().unwrap();
    assert_eq!(extra.read_latency_us, 20.48);
}

#[tokio::test]
async fn test_engine_failure_still_cleans_up() {
    let target = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let plan = plan(target.path(), 1 << 20, None);
    let engine = FakeEngine::new(Behaviour::Fail, plan.config().test_file_path());
    let results_path = out.path().join("results.json");
    let runner = BenchmarkRunner::new(engine).with_results_path(&results_path);

    let err = runner.run(&plan, std::future::pending()).await.unwrap_err();

    assert!(matches!(err, BenchError::EngineInvocation { .. }));
    assert!(!results_path.exists());
    for path in transient_files(&plan) {
        assert!(!path.exists(), "{} should be removed", path.display());
    }
}

#[tokio::test]
async fn test_interrupt_abandons_run_and_cleans_up() {
    let target = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let plan = plan(target.path(), 1 << 20, None);
    let engine = FakeEngine::new(Behaviour::Hang, plan.config().test_file_path());
    let (tx, rx) = oneshot::channel();
    *engine.started.lock().unwrap() = Some(tx);
    let results_path = out.path().join("results.json");
    let runner = BenchmarkRunner::new(engine).with_results_path(&results_path);

    let interrupt = async {
        let _ = rx.await;
    };
    let err = runner.run(&plan, interrupt).await.unwrap_err();

    assert!(matches!(err, BenchError::Interrupted));
    assert!(!results_path.exists());
    for path in transient_files(&plan) {
        assert!(!path.exists(), "{} should be removed", path.display());
    }
}

#[tokio::test]
async fn test_insufficient_space_skips_engine() {
    let target = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let plan = plan(target.path(), u64::MAX, None);
    let engine = FakeEngine::new(Behaviour::Succeed, plan.config().test_file_path());
    let runs = Arc::clone(&engine.runs);
    let runner = BenchmarkRunner::new(engine).with_results_path(out.path().join("results.json"));

    let err = runner.run(&plan, std::future::pending()).await.unwrap_err();

    assert!(matches!(err, BenchError::InsufficientSpace { .. }));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert!(!plan.config().job_file_path().exists());
}

#[tokio::test]
async fn test_missing_target_directory() {
    let plan = plan(Path::new("/nonexistent/diskmark/target"), 1 << 20, None);
    let engine = FakeEngine::new(Behaviour::Succeed, plan.config().test_file_path());
    let runner = BenchmarkRunner::new(engine);

    let err = runner.run(&plan, std::future::pending()).await.unwrap_err();
    assert!(matches!(err, BenchError::Io { .. }));
}
