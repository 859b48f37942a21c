//! Export of the resolved link.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Destination for `key=value` outputs of a run.
pub trait OutputSink: Send + Sync {
    fn set_output(&self, key: &str, value: &str) -> std::io::Result<()>;
}

/// Appends `key=value` lines to a GitHub Actions output file.
#[derive(Debug, Clone)]
pub struct GithubOutput {
    path: PathBuf,
}

impl GithubOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for GithubOutput {
    fn set_output(&self, key: &str, value: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{key}={value}")
    }
}

/// Keeps outputs in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries.lock().unwrap().clone()
    }

    /// Last value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }
}

impl OutputSink for MemorySink {
    fn set_output(&self, key: &str, value: &str) -> std::io::Result<()> {
        self.entries
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        Ok(())
    }
}

/// Discards outputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn set_output(&self, _key: &str, _value: &str) -> std::io::Result<()> {
        Ok(())
    }
}
