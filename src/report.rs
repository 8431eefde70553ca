//! Progress reporting for bootstrap phases
//!
//! The orchestrator only calls into a `Reporter`; it never reads anything
//! back. `JournalReporter` appends JSON lines to `<site>/.kiln-journal.log`
//! and never fails the bootstrap on I/O errors.

use async_trait::async_trait;
use chrono::Utc;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// Journal file name inside the site directory
pub const JOURNAL_FILE: &str = ".kiln-journal.log";

/// Bootstrap phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    LoadProgram,
    PreInit,
    DeleteStaleOutput,
    InitializeCache,
    StageTemplates,
    WritePluginApis,
    PreBootstrap,
    ResolveExtensions,
    CreateWorkers,
}

impl Phase {
    pub const ALL: [Phase; 9] = [
        Phase::LoadProgram,
        Phase::PreInit,
        Phase::DeleteStaleOutput,
        Phase::InitializeCache,
        Phase::StageTemplates,
        Phase::WritePluginApis,
        Phase::PreBootstrap,
        Phase::ResolveExtensions,
        Phase::CreateWorkers,
    ];

    /// 1-based position in the sequence
    pub fn ordinal(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(0) + 1
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LoadProgram => "load program",
            Self::PreInit => "pre-init hooks",
            Self::DeleteStaleOutput => "delete stale output",
            Self::InitializeCache => "initialize cache",
            Self::StageTemplates => "stage templates",
            Self::WritePluginApis => "write plugin dispatch tables",
            Self::PreBootstrap => "pre-bootstrap hooks",
            Self::ResolveExtensions => "resolve extensions",
            Self::CreateWorkers => "create worker pool",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Receives phase timing and diagnostics
#[async_trait]
pub trait Reporter: Send + Sync {
    async fn phase_started(&self, phase: Phase);
    async fn phase_finished(&self, phase: Phase, elapsed: Duration);
    async fn warn(&self, message: &str);
    async fn error(&self, message: &str);
}

/// Reporter that forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

#[async_trait]
impl Reporter for TracingReporter {
    async fn phase_started(&self, phase: Phase) {
        tracing::debug!("[{}/{}] {}", phase.ordinal(), Phase::ALL.len(), phase);
    }

    async fn phase_finished(&self, phase: Phase, elapsed: Duration) {
        info!("{} - {:.3}s", phase, elapsed.as_secs_f64());
    }

    async fn warn(&self, message: &str) {
        warn!("{}", message);
    }

    async fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// File-based reporter that appends JSON lines tagged with a run id
pub struct JournalReporter {
    enabled: bool,
    path: PathBuf,
    run_id: Uuid,
}

impl JournalReporter {
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            enabled,
            path: path.into(),
            run_id: Uuid::new_v4(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Append one journal entry
    ///
    /// Silently drops entries on IO failure.
    pub async fn log(&self, event: &str, data: &serde_json::Value) {
        if !self.enabled {
            return;
        }

        let entry = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "run_id": self.run_id,
            "event": event,
            "data": data,
        });

        let mut line = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to serialize journal entry: {}", e);
                return;
            }
        };
        line.push('\n');

        if let Err(e) = self.append(&line).await {
            warn!("Failed to write journal: {}", e);
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl Reporter for JournalReporter {
    async fn phase_started(&self, phase: Phase) {
        self.log("phase.started", &serde_json::json!({ "phase": phase.label() }))
            .await;
    }

    async fn phase_finished(&self, phase: Phase, elapsed: Duration) {
        self.log(
            "phase.finished",
            &serde_json::json!({
                "phase": phase.label(),
                "elapsed_ms": elapsed.as_millis() as u64,
            }),
        )
        .await;
    }

    async fn warn(&self, message: &str) {
        self.log("warning", &serde_json::json!({ "message": message }))
            .await;
    }

    async fn error(&self, message: &str) {
        self.log("error", &serde_json::json!({ "message": message }))
            .await;
    }
}

/// Fans out to several reporters in order
#[derive(Default, Clone)]
pub struct CompositeReporter {
    reporters: Vec<Arc<dyn Reporter>>,
}

impl CompositeReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporters.push(reporter);
        self
    }
}

#[async_trait]
impl Reporter for CompositeReporter {
    async fn phase_started(&self, phase: Phase) {
        for r in &self.reporters {
            r.phase_started(phase).await;
        }
    }

    async fn phase_finished(&self, phase: Phase, elapsed: Duration) {
        for r in &self.reporters {
            r.phase_finished(phase, elapsed).await;
        }
    }

    async fn warn(&self, message: &str) {
        for r in &self.reporters {
            r.warn(message).await;
        }
    }

    async fn error(&self, message: &str) {
        for r in &self.reporters {
            r.error(message).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn journal(dir: &TempDir, enabled: bool) -> JournalReporter {
        JournalReporter::new(dir.path().join(JOURNAL_FILE), enabled)
    }

    #[test]
    fn phase_ordinals() {
        assert_eq!(Phase::LoadProgram.ordinal(), 1);
        assert_eq!(Phase::CreateWorkers.ordinal(), 9);
    }

    #[tokio::test]
    async fn writes_json_line() {
        let dir = TempDir::new().unwrap();
        let reporter = journal(&dir, true);

        reporter
            .phase_finished(Phase::InitializeCache, Duration::from_millis(12))
            .await;

        let content = tokio::fs::read_to_string(&reporter.path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(content.trim()).unwrap();

        assert_eq!(parsed["event"], "phase.finished");
        assert_eq!(parsed["data"]["phase"], "initialize cache");
        assert_eq!(parsed["data"]["elapsed_ms"], 12);
        assert_eq!(parsed["run_id"], reporter.run_id().to_string());
    }

    #[tokio::test]
    async fn appends_multiple_lines() {
        let dir = TempDir::new().unwrap();
        let reporter = journal(&dir, true);

        reporter.phase_started(Phase::PreInit).await;
        reporter.warn("careful").await;

        let content = tokio::fs::read_to_string(&reporter.path).await.unwrap();
        assert_eq!(content.trim().lines().count(), 2);
    }

    #[tokio::test]
    async fn skips_when_disabled() {
        let dir = TempDir::new().unwrap();
        let reporter = journal(&dir, false);

        reporter.error("should not appear").await;

        assert!(!reporter.path.exists());
    }

    #[tokio::test]
    async fn composite_fans_out() {
        let dir = TempDir::new().unwrap();
        let a = Arc::new(JournalReporter::new(dir.path().join("a.log"), true));
        let b = Arc::new(JournalReporter::new(dir.path().join("b.log"), true));
        let composite = CompositeReporter::new()
            .with(a.clone())
            .with(b.clone())
            .with(Arc::new(TracingReporter));

        composite.warn("both").await;

        assert!(a.path.exists());
        assert!(b.path.exists());
    }
}
