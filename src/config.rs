use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const TEST_FILE_NAME: &str = ".diskmark.tmp";
pub const JOB_FILE_NAME: &str = ".diskmark.fio";
pub const RESULTS_FILE_NAME: &str = "diskmark-results.json";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct UserConfig {
    pub defaults: DefaultsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DefaultsConfig {
    pub engine: String,
    pub size: String,
    pub loops: u32,
    pub mix_read: Option<u8>,
    pub report_formats: Vec<String>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            engine: "fio".to_string(),
            size: "1G".to_string(),
            loops: 5,
            mix_read: None,
            report_formats: Vec::new(),
        }
    }
}

impl UserConfig {
    /// Loads `~/.diskmark/config.json`, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        let path = match Self::get_config_dir() {
            Ok(dir) => dir.join("config.json"),
            Err(_) => return Self::default(),
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    fn get_config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| anyhow::anyhow!("Unable to find home directory"))?;

        Ok(PathBuf::from(home).join(".diskmark"))
    }
}

/// Engine options that depend on the host OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDefaults {
    pub ioengine: &'static str,
    pub thread: bool,
}

impl PlatformDefaults {
    pub fn detect() -> Self {
        let ioengine = if cfg!(target_os = "linux") {
            "libaio"
        } else if cfg!(windows) {
            "windowsaio"
        } else {
            "posixaio"
        };

        Self {
            ioengine,
            thread: cfg!(unix),
        }
    }
}

/// Settings shared by every job of a run.
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    pub directory: PathBuf,
    pub filename: String,
    pub size: u64,
    pub loops: u32,
    pub runtime_secs: u32,
    pub ramp_time_secs: u32,
    pub zero_buffers: bool,
    /// Read percentage of the mixed workload; `None` disables mix sub-jobs.
    pub mix_read: Option<u8>,
    pub platform: PlatformDefaults,
}

impl GlobalConfig {
    pub fn new(directory: PathBuf, size: u64) -> Self {
        Self {
            directory,
            filename: TEST_FILE_NAME.to_string(),
            size,
            loops: 5,
            runtime_secs: 5,
            ramp_time_secs: 1,
            zero_buffers: false,
            mix_read: None,
            platform: PlatformDefaults::detect(),
        }
    }

    pub fn with_loops(mut self, loops: u32) -> Self {
        self.loops = loops;
        self
    }

    pub fn with_zero_buffers(mut self, zero_buffers: bool) -> Self {
        self.zero_buffers = zero_buffers;
        self
    }

    /// A percentage of 0 means no mixed workload.
    pub fn with_mix_read(mut self, mix_read: Option<u8>) -> Self {
        self.mix_read = mix_read.filter(|p| *p > 0).map(|p| p.min(100));
        self
    }

    pub fn test_file_path(&self) -> PathBuf {
        self.directory.join(&self.filename)
    }

    pub fn job_file_path(&self) -> PathBuf {
        self.directory.join(JOB_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_config_default() {
        let defaults = DefaultsConfig::default();
        assert_eq!(defaults.engine, "fio");
        assert_eq!(defaults.size, "1G");
        assert_eq!(defaults.loops, 5);
        assert!(defaults.mix_read.is_none());
    }

    #[test]
    fn test_user_config_partial_json() {
        let config: UserConfig =
            serde_json::from_str(r#"{"defaults": {"engine": "/opt/fio/bin/fio"}}"#).unwrap();
        assert_eq!(config.defaults.engine, "/opt/fio/bin/fio");
        assert_eq!(config.defaults.size, "1G");
        assert_eq!(config.defaults.loops, 5);
    }

    #[test]
    fn test_mix_read_zero_disables_mix() {
        let config = GlobalConfig::new(PathBuf::from("/tmp"), 1024).with_mix_read(Some(0));
        assert!(config.mix_read.is_none());

        let config = GlobalConfig::new(PathBuf::from("/tmp"), 1024).with_mix_read(Some(150));
        assert_eq!(config.mix_read, Some(100));
    }

    #[test]
    fn test_transient_paths_live_in_target() {
        let config = GlobalConfig::new(PathBuf::from("/mnt/disk"), 1024);
        assert_eq!(config.test_file_path(), PathBuf::from("/mnt/disk/.diskmark.tmp"));
        assert_eq!(config.job_file_path(), PathBuf::from("/mnt/disk/.diskmark.fio"));
    }

    #[test]
    fn test_platform_defaults() {
        let platform = PlatformDefaults::detect();
        if cfg!(target_os = "linux") {
            assert_eq!(platform.ioengine, "libaio");
            assert!(platform.thread);
        }
    }
}
