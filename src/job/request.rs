use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{BenchError, Result};
use crate::utils::parse_size;

const SEQUENTIAL_BLOCK_SIZE: u64 = 1024 * 1024;
const RANDOM_BLOCK_SIZE: u64 = 4 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    Sequential,
    Random,
}

impl Pattern {
    fn label(self) -> &'static str {
        match self {
            Pattern::Sequential => "SEQ",
            Pattern::Random => "RND",
        }
    }
}

impl FromStr for Pattern {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seq" | "sequential" => Ok(Pattern::Sequential),
            "rnd" | "rand" | "random" => Ok(Pattern::Random),
            _ => Err(BenchError::InvalidPattern(s.to_string())),
        }
    }
}

/// Default block size for a pattern name: 1 MiB sequential, 4 KiB random.
pub fn block_size_for(pattern: &str) -> Result<u64> {
    Ok(default_block_size(pattern.parse()?))
}

fn default_block_size(pattern: Pattern) -> u64 {
    match pattern {
        Pattern::Sequential => SEQUENTIAL_BLOCK_SIZE,
        Pattern::Random => RANDOM_BLOCK_SIZE,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Read,
    Write,
    Mix,
}

impl Direction {
    /// fio `rw=` value for this direction under the given pattern.
    pub fn workload(self, pattern: Pattern) -> &'static str {
        match (pattern, self) {
            (Pattern::Sequential, Direction::Read) => "read",
            (Pattern::Sequential, Direction::Write) => "write",
            (Pattern::Sequential, Direction::Mix) => "rw",
            (Pattern::Random, Direction::Read) => "randread",
            (Pattern::Random, Direction::Write) => "randwrite",
            (Pattern::Random, Direction::Mix) => "randrw",
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Direction::Read => "read",
            Direction::Write => "write",
            Direction::Mix => "mix",
        }
    }
}

/// One requested benchmark job. `index` is its position in the job list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequest {
    pub index: usize,
    pub pattern: Pattern,
    pub block_size: u64,
    pub queue_depth: u32,
    pub thread_count: u32,
}

impl JobRequest {
    pub fn new(
        index: usize,
        pattern: Pattern,
        queue_depth: u32,
        thread_count: u32,
        block_size: Option<u64>,
    ) -> Result<Self> {
        let job = Self {
            index,
            pattern,
            block_size: block_size.unwrap_or_else(|| default_block_size(pattern)),
            queue_depth,
            thread_count,
        };

        if queue_depth == 0 {
            return Err(BenchError::InvalidJob(
                job.label(),
                "queue depth must be greater than 0".to_string(),
            ));
        }
        if thread_count == 0 {
            return Err(BenchError::InvalidJob(
                job.label(),
                "thread count must be greater than 0".to_string(),
            ));
        }
        if job.block_size == 0 {
            return Err(BenchError::InvalidJob(
                job.label(),
                "block size must be greater than 0".to_string(),
            ));
        }

        Ok(job)
    }

    /// Compact label, e.g. `SEQ1MQ8T1`.
    pub fn label(&self) -> String {
        format!(
            "{}{}Q{}T{}",
            self.pattern.label(),
            block_label(self.block_size),
            self.queue_depth,
            self.thread_count
        )
    }

    /// Name shown in the report's first column, e.g. `SEQ1M Q8 T1`.
    pub fn display_name(&self) -> String {
        format!(
            "{}{} Q{:<2}T{:<2}",
            self.pattern.label(),
            block_label(self.block_size),
            self.queue_depth,
            self.thread_count
        )
        .trim_end()
        .to_string()
    }

    pub fn key(&self, direction: Direction) -> SubJobKey {
        SubJobKey {
            index: self.index,
            pattern: self.pattern,
            block_size: self.block_size,
            queue_depth: self.queue_depth,
            thread_count: self.thread_count,
            direction,
        }
    }
}

/// Engine-facing identity of one sub-job. Its `Display` form is the section
/// name in the job file and the `jobname` in the engine's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubJobKey {
    pub index: usize,
    pub pattern: Pattern,
    pub block_size: u64,
    pub queue_depth: u32,
    pub thread_count: u32,
    pub direction: Direction,
}

impl fmt::Display for SubJobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}{}Q{}T{}",
            self.direction.as_str(),
            self.index,
            self.pattern.label(),
            block_label(self.block_size),
            self.queue_depth,
            self.thread_count
        )
    }
}

fn block_label(bytes: u64) -> String {
    if bytes >= 1024 * 1024 && bytes % (1024 * 1024) == 0 {
        format!("{}M", bytes / (1024 * 1024))
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{}K", bytes / 1024)
    } else {
        bytes.to_string()
    }
}

/// Parses a `pattern,queueDepth,threadCount[,blockSize]` tuple.
pub fn parse_job_tuple(index: usize, spec: &str) -> Result<JobRequest> {
    let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err(BenchError::InvalidJob(
            spec.to_string(),
            "expected pattern,queue_depth,threads[,block_size]".to_string(),
        ));
    }

    let pattern: Pattern = parts[0].parse()?;
    let queue_depth = parts[1].parse::<u32>().map_err(|_| {
        BenchError::InvalidJob(spec.to_string(), "queue depth is not a number".to_string())
    })?;
    let thread_count = parts[2].parse::<u32>().map_err(|_| {
        BenchError::InvalidJob(spec.to_string(), "thread count is not a number".to_string())
    })?;
    let block_size = parts.get(3).map(|bs| parse_size(bs)).transpose()?;

    JobRequest::new(index, pattern, queue_depth, thread_count, block_size)
}
