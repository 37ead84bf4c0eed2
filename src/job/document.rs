use std::fmt;
use std::io::Write;
use std::path::PathBuf;

use crate::error::{BenchError, Result};

/// One `[name]` block of a job file. Entries without a value render as
/// bare flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub entries: Vec<(String, Option<String>)>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn set(mut self, key: &str, value: impl ToString) -> Self {
        self.entries.push((key.to_string(), Some(value.to_string())));
        self
    }

    pub fn flag(mut self, key: &str) -> Self {
        self.entries.push((key.to_string(), None));
        self
    }

    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }
}

/// INI-like job description consumed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigDocument {
    pub sections: Vec<Section>,
}

impl ConfigDocument {
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn write_to(&self, target: &OutputTarget) -> Result<()> {
        let text = self.to_string();
        match target {
            OutputTarget::Stdout => {
                let mut stdout = std::io::stdout().lock();
                stdout
                    .write_all(text.as_bytes())
                    .map_err(|e| BenchError::io("Failed to write job file to stdout", e))
            }
            OutputTarget::File(path) => std::fs::write(path, text).map_err(|e| {
                BenchError::io(format!("Failed to write job file {}", path.display()), e)
            }),
        }
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                match value {
                    Some(value) => writeln!(f, "{}={}", key, value)?,
                    None => writeln!(f, "{}", key)?,
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

impl OutputTarget {
    pub const STDOUT_SENTINEL: &'static str = "-";
}

impl From<&str> for OutputTarget {
    fn from(s: &str) -> Self {
        if s == Self::STDOUT_SENTINEL {
            OutputTarget::Stdout
        } else {
            OutputTarget::File(PathBuf::from(s))
        }
    }
}
