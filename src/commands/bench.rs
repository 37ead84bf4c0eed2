use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use tracing::info;

use crate::config::{GlobalConfig, UserConfig};
use crate::job::{JobPlan, OutputTarget};
use crate::report::{build_rows, render_table, BenchReport, ReportGenerator, ReportOptions};
use crate::runner::{ctrl_c, BandwidthScale, BenchmarkRunner, DiskUsage, Engine, FioEngine};
use crate::ui::Spinner;
use crate::utils::{format_size, parse_size};

pub struct BenchOptions {
    pub target: PathBuf,
    pub size: Option<String>,
    pub loops: Option<u32>,
    pub jobs: Vec<String>,
    pub mix: Option<u8>,
    pub zero_buffers: bool,
    pub dump_config: Option<String>,
    pub extra_info: bool,
    pub engine: Option<String>,
    pub report: Option<String>,
}

/// Builds the job plan from CLI options layered over the user config.
pub fn build_plan(options: &BenchOptions, user: &UserConfig) -> Result<JobPlan> {
    let size_str = options.size.as_deref().unwrap_or(&user.defaults.size);
    let size = parse_size(size_str)?;
    let loops = options.loops.unwrap_or(user.defaults.loops);
    let mix = options.mix.or(user.defaults.mix_read);

    let config = GlobalConfig::new(options.target.clone(), size)
        .with_loops(loops)
        .with_zero_buffers(options.zero_buffers)
        .with_mix_read(mix);

    Ok(JobPlan::from_specs(config, &options.jobs)?)
}

pub async fn handle_bench(options: BenchOptions) -> Result<()> {
    let user = UserConfig::load();

    if !options.target.is_dir() {
        anyhow::bail!(
            "Target must be an existing directory: {}",
            options.target.display()
        );
    }

    let plan = build_plan(&options, &user)?;

    if let Some(dest) = &options.dump_config {
        let target = OutputTarget::from(dest.as_str());
        plan.render()
            .write_to(&target)
            .context("Failed to dump job file")?;
        if let OutputTarget::File(path) = target {
            println!("{} Job file written to {}", "✔".green(), path.display());
        }
        return Ok(());
    }

    let config = plan.config();
    let usage = DiskUsage::probe(&config.directory)?;
    println!(
        "tests: {}, size: {}, target: {} {}/{} ({} free)",
        config.loops,
        format_size(config.size),
        config.directory.display().to_string().bright_white(),
        format_size(usage.used),
        format_size(usage.total),
        format_size(usage.free)
    );

    let engine = FioEngine::new(
        options
            .engine
            .clone()
            .unwrap_or_else(|| user.defaults.engine.clone()),
    );
    let version = engine.version().await?;
    let scale = BandwidthScale::from_version(&version);
    info!("Using {} ({} field)", version, scale.field);

    let runner = BenchmarkRunner::new(engine);
    let spinner = Spinner::new(&format!("Running {}...", runner.engine().name()));
    let result = runner.run(&plan, ctrl_c()).await;
    spinner.clear();
    let output = result?;
    println!(
        "{} Raw results saved to {}",
        "✔".green(),
        runner.results_path().display()
    );

    let engine_version = output.engine_version.clone().or(Some(version));
    let measurements = output.into_index();
    let report_options = ReportOptions {
        mix_read: config.mix_read,
        extra_info: options.extra_info,
    };
    let rows = build_rows(plan.jobs(), &measurements, &scale, &report_options)?;

    println!();
    print!("{}", render_table(&rows, config.mix_read.is_some()));

    let formats: Vec<String> = match &options.report {
        Some(list) => list.split(',').map(|f| f.to_string()).collect(),
        None => user.defaults.report_formats.clone(),
    };
    if !formats.is_empty() {
        let report = BenchReport {
            timestamp: Utc::now(),
            target: config.directory.clone(),
            size: config.size,
            loops: config.loops,
            mix_read: config.mix_read,
            engine_version,
            rows,
        };
        for path in ReportGenerator::generate_reports(&report, &formats, &std::env::current_dir()?)? {
            println!("{} Report saved to {}", "✔".green(), path.display());
        }
    }

    Ok(())
}
