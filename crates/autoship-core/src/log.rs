//! Run log shared by every pipeline step.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File name of the run log, created in the working directory.
pub const RUN_LOG_FILE_NAME: &str = "autoship.log";

/// Sink for pipeline events.
///
/// Passed explicitly to the scanner, synthesizer, and drivers.
pub trait EventLog: Send + Sync {
    fn record(&self, event: &str);
}

/// Append-only, timestamped text log that also mirrors events to tracing.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            path: work_dir.join(RUN_LOG_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl EventLog for RunLog {
    fn record(&self, event: &str) {
        tracing::info!("{event}");
        let line = format!("[{}] {event}", chrono::Utc::now().to_rfc3339());
        if let Err(e) = self.append(&line) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to append to run log");
        }
    }
}

/// In-memory event collector.
#[derive(Debug, Default)]
pub struct MemoryLog {
    events: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.events().iter().any(|e| e.contains(needle))
    }
}

impl EventLog for MemoryLog {
    fn record(&self, event: &str) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.to_owned()),
            Err(poisoned) => poisoned.into_inner().push(event.to_owned()),
        }
    }
}
