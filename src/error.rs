use std::path::PathBuf;
use thiserror::Error;

use crate::utils::format_size;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Invalid job pattern '{0}'. Use: seq, sequential, rnd, random")]
    InvalidPattern(String),

    #[error("Invalid job '{0}': {1}")]
    InvalidJob(String, String),

    #[error("Invalid size '{0}'. Use a number with an optional k, m, g or t suffix")]
    InvalidSize(String),

    #[error(
        "Not enough free space at {}: {} needed, {} available",
        .path.display(),
        format_size(*.needed),
        format_size(*.available)
    )]
    InsufficientSpace {
        path: PathBuf,
        needed: u64,
        available: u64,
    },

    #[error("Benchmark engine '{engine}' failed: {reason}")]
    EngineInvocation { engine: String, reason: String },

    #[error("Engine output is not valid JSON: {0}")]
    MalformedOutput(String),

    #[error("No result for sub-job '{0}' in engine output")]
    MissingResult(String),

    #[error("Benchmark interrupted")]
    Interrupted,

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl BenchError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BenchError::Io {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_space_uses_human_units() {
        let err = BenchError::InsufficientSpace {
            path: PathBuf::from("/mnt/data"),
            needed: 5 * 1024 * 1024 * 1024,
            available: 4 * 1024 * 1024 * 1024,
        };
        let message = err.to_string();
        assert!(message.contains("/mnt/data"));
        assert!(message.contains("5.0GiB needed"));
        assert!(message.contains("4.0GiB available"));
    }

    #[test]
    fn test_invalid_pattern_message() {
        let err = BenchError::InvalidPattern("zigzag".to_string());
        assert!(err.to_string().contains("'zigzag'"));
    }
}
