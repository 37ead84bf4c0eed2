use anyhow::Result as AnyResult;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BenchError, Result};
use crate::job::{Direction, JobRequest, Pattern};
use crate::runner::BandwidthScale;

/// Narrowest name column; fits `. latency us` and the default job names.
const MIN_NAME_WIDTH: usize = 12;
const VALUE_WIDTH: usize = 12;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatencyStats {
    #[serde(default)]
    pub mean: f64,
}

/// Per-direction numbers from one engine job.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionStats {
    /// KiB/s (fio 3.1).
    #[serde(default)]
    pub bw: Option<f64>,
    /// Bytes/s.
    #[serde(default)]
    pub bw_bytes: Option<f64>,
    #[serde(default)]
    pub iops: f64,
    #[serde(default)]
    pub lat_ns: Option<LatencyStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMeasurement {
    pub jobname: String,
    #[serde(default)]
    pub read: DirectionStats,
    #[serde(default)]
    pub write: DirectionStats,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineOutput {
    #[serde(rename = "fio version", default)]
    pub engine_version: Option<String>,
    pub jobs: Vec<RawMeasurement>,
}

impl EngineOutput {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| BenchError::MalformedOutput(e.to_string()))
    }

    /// Measurements keyed by sub-job name, in engine order.
    pub fn into_index(self) -> IndexMap<String, RawMeasurement> {
        self.jobs
            .into_iter()
            .map(|m| (m.jobname.clone(), m))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub mix_read: Option<u8>,
    pub extra_info: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExtraInfo {
    pub read_iops: f64,
    pub write_iops: f64,
    pub read_latency_us: f64,
    pub write_latency_us: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReportRow {
    pub name: String,
    pub pattern: Pattern,
    pub read_mbps: f64,
    pub write_mbps: f64,
    pub mix_mbps: Option<f64>,
    pub extra: Option<ExtraInfo>,
}

/// Weighted throughput of a mixed workload with `mix_percent` reads.
pub fn mix_throughput(read: f64, write: f64, mix_percent: u8) -> f64 {
    let p = f64::from(mix_percent);
    (write * (100.0 - p) + read * p) / 100.0
}

fn lookup<'a>(
    measurements: &'a IndexMap<String, RawMeasurement>,
    job: &JobRequest,
    direction: Direction,
) -> Result<&'a RawMeasurement> {
    let name = job.key(direction).to_string();
    measurements
        .get(&name)
        .ok_or(BenchError::MissingResult(name))
}

fn megabytes(scale: &BandwidthScale, stats: &DirectionStats, jobname: &str) -> Result<f64> {
    scale
        .raw_bandwidth(stats)
        .map(|raw| scale.to_megabytes(raw))
        .ok_or_else(|| {
            BenchError::MalformedOutput(format!(
                "sub-job '{}' has no '{}' field",
                jobname, scale.field
            ))
        })
}

fn latency_us(stats: &DirectionStats) -> f64 {
    stats.lat_ns.as_ref().map(|l| l.mean / 1000.0).unwrap_or(0.0)
}

/// One row per job, in job order.
pub fn build_rows(
    jobs: &[JobRequest],
    measurements: &IndexMap<String, RawMeasurement>,
    scale: &BandwidthScale,
    options: &ReportOptions,
) -> Result<Vec<ReportRow>> {
    jobs.iter()
        .map(|job| {
            let read = lookup(measurements, job, Direction::Read)?;
            let write = lookup(measurements, job, Direction::Write)?;

            let read_mbps = megabytes(scale, &read.read, &read.jobname)?;
            let write_mbps = megabytes(scale, &write.write, &write.jobname)?;

            let mix_mbps = match options.mix_read {
                Some(percent) => {
                    let mix = lookup(measurements, job, Direction::Mix)?;
                    Some(mix_throughput(
                        megabytes(scale, &mix.read, &mix.jobname)?,
                        megabytes(scale, &mix.write, &mix.jobname)?,
                        percent,
                    ))
                }
                None => None,
            };

            let extra = (options.extra_info && job.pattern == Pattern::Random).then(|| ExtraInfo {
                read_iops: read.read.iops,
                write_iops: write.write.iops,
                read_latency_us: latency_us(&read.read),
                write_latency_us: latency_us(&write.write),
            });

            Ok(ReportRow {
                name: job.display_name(),
                pattern: job.pattern,
                read_mbps,
                write_mbps,
                mix_mbps,
                extra,
            })
        })
        .collect()
}

fn push_line(
    out: &mut String,
    name_width: usize,
    name: &str,
    cells: &[Option<f64>],
    with_mix: bool,
) {
    let _ = write!(out, "|{:<name_width$}|", name);
    let columns = if with_mix { 3 } else { 2 };
    for cell in cells.iter().take(columns) {
        match cell {
            Some(value) => {
                let _ = write!(out, "{:>VALUE_WIDTH$.2}|", value);
            }
            None => {
                let _ = write!(out, "{:>VALUE_WIDTH$}|", "");
            }
        }
    }
    out.push('\n');
}

/// Fixed-width comparison table. The name column widens to the longest job
/// name; the Mix column appears only when the rows carry mixed results.
pub fn render_table(rows: &[ReportRow], with_mix: bool) -> String {
    let mut out = String::new();
    let name_width = rows
        .iter()
        .map(|row| row.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(MIN_NAME_WIDTH);

    let mut header = format!(
        "|{:<name_width$}|{:>VALUE_WIDTH$}|{:>VALUE_WIDTH$}|",
        "Name", "Read(MB/s)", "Write(MB/s)"
    );
    let mut rule = format!(
        "|{}|{}|{}|",
        "-".repeat(name_width),
        "-".repeat(VALUE_WIDTH),
        "-".repeat(VALUE_WIDTH)
    );
    if with_mix {
        let _ = write!(header, "{:>VALUE_WIDTH$}|", "Mix(MB/s)");
        let _ = write!(rule, "{}|", "-".repeat(VALUE_WIDTH));
    }
    out.push_str(&header);
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for row in rows {
        push_line(
            &mut out,
            name_width,
            &row.name,
            &[Some(row.read_mbps), Some(row.write_mbps), row.mix_mbps],
            with_mix,
        );
        if let Some(extra) = &row.extra {
            push_line(
                &mut out,
                name_width,
                ". IOPS",
                &[Some(extra.read_iops), Some(extra.write_iops), None],
                with_mix,
            );
            push_line(
                &mut out,
                name_width,
                ". latency us",
                &[
                    Some(extra.read_latency_us),
                    Some(extra.write_latency_us),
                    None,
                ],
                with_mix,
            );
        }
    }

    out
}

#[derive(Debug, Serialize)]
pub struct BenchReport {
    pub timestamp: DateTime<Utc>,
    pub target: PathBuf,
    pub size: u64,
    pub loops: u32,
    pub mix_read: Option<u8>,
    pub engine_version: Option<String>,
    pub rows: Vec<ReportRow>,
}

#[derive(Debug, Serialize)]
struct CsvRecord<'a> {
    name: &'a str,
    pattern: Pattern,
    read_mbps: f64,
    write_mbps: f64,
    mix_mbps: Option<f64>,
    read_iops: Option<f64>,
    write_iops: Option<f64>,
    read_latency_us: Option<f64>,
    write_latency_us: Option<f64>,
}

pub struct ReportGenerator;

impl ReportGenerator {
    pub fn generate_reports(
        report: &BenchReport,
        formats: &[String],
        output_dir: &Path,
    ) -> AnyResult<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)?;

        let mut generated_files = Vec::new();
        for format in formats {
            let format = format.trim().to_lowercase();
            match format.as_str() {
                "json" => generated_files.push(Self::generate_json_report(report, output_dir)?),
                "csv" => generated_files.push(Self::generate_csv_report(report, output_dir)?),
                "" => {}
                _ => {
                    tracing::warn!("Unknown report format '{}'", format);
                }
            }
        }

        Ok(generated_files)
    }

    fn generate_json_report(report: &BenchReport, output_dir: &Path) -> AnyResult<PathBuf> {
        let timestamp = report.timestamp.format("%Y%m%d_%H%M%S");
        let path = output_dir.join(format!("diskmark_report_{}.json", timestamp));

        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)?;

        Ok(path)
    }

    fn generate_csv_report(report: &BenchReport, output_dir: &Path) -> AnyResult<PathBuf> {
        let timestamp = report.timestamp.format("%Y%m%d_%H%M%S");
        let path = output_dir.join(format!("diskmark_report_{}.csv", timestamp));

        let mut writer = csv::Writer::from_path(&path)?;
        for row in &report.rows {
            let extra = row.extra.as_ref();
            writer.serialize(CsvRecord {
                name: &row.name,
                pattern: row.pattern,
                read_mbps: row.read_mbps,
                write_mbps: row.write_mbps,
                mix_mbps: row.mix_mbps,
                read_iops: extra.map(|e| e.read_iops),
                write_iops: extra.map(|e| e.write_iops),
                read_latency_us: extra.map(|e| e.read_latency_us),
                write_latency_us: extra.map(|e| e.write_latency_us),
            })?;
        }
        writer.flush()?;

        Ok(path)
    }
}
