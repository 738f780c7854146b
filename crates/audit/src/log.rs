use std::collections::{HashMap, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use airgate_core::EventKind;
use chrono::Local;
use tokio::sync::Mutex;
use tracing::warn;

use crate::entry;

/// Line cap applied when none is configured.
pub const DEFAULT_MAX_LINES: usize = 1000;

/// Reduce a job name to a safe file stem: keep ASCII alphanumerics, dots,
/// underscores, and spaces; drop everything else; spaces become underscores.
pub fn sanitize_job_name(name: &str) -> String {
    let stem: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '.' | '_'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    if stem.is_empty() { "job".to_owned() } else { stem }
}

/// Append-only, size-bounded audit log, partitioned by job name.
///
/// One `.log` file per job under `dir`. A registry of per-job mutexes
/// serializes the read-modify-write cycle for each file while appends to
/// different jobs proceed concurrently. After every append, the oldest
/// physical lines are evicted until the file is at or under `max_lines`.
pub struct AuditLog {
    dir: PathBuf,
    max_lines: usize,
    targets: Mutex<HashMap<String, Arc<Mutex<PathBuf>>>>,
}

impl AuditLog {
    pub fn new(dir: impl Into<PathBuf>, max_lines: usize) -> Self {
        Self {
            dir: dir.into(),
            max_lines,
            targets: Mutex::new(HashMap::new()),
        }
    }

    /// Directory the per-job files live in.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record one event. Infallible to the caller; write errors are reported
    /// via `tracing` and dropped.
    pub async fn append(&self, job: &str, kind: EventKind, details: &str) {
        self.append_entry(job, kind, details, None).await;
    }

    /// Record one event with a serialized payload block attached.
    pub async fn append_with_payload(
        &self,
        job: &str,
        kind: EventKind,
        details: &str,
        payload: &serde_json::Value,
    ) {
        self.append_entry(job, kind, details, Some(payload)).await;
    }

    async fn append_entry(
        &self,
        job: &str,
        kind: EventKind,
        details: &str,
        payload: Option<&serde_json::Value>,
    ) {
        let lines = entry::render(Local::now(), kind, details, payload);
        if let Err(e) = self.write_lines(job, &lines).await {
            warn!(job = %job, error = %e, "audit write failed, entry dropped");
        }
    }

    /// Look up (or create) the lock guarding one job's file.
    async fn target(&self, job: &str) -> Arc<Mutex<PathBuf>> {
        let mut targets = self.targets.lock().await;
        targets
            .entry(job.to_owned())
            .or_insert_with(|| {
                let file = format!("{}.log", sanitize_job_name(job));
                Arc::new(Mutex::new(self.dir.join(file)))
            })
            .clone()
    }

    async fn write_lines(&self, job: &str, new_lines: &[String]) -> io::Result<()> {
        let target = self.target(job).await;
        let path = target.lock().await;

        tokio::fs::create_dir_all(&self.dir).await?;

        let existing = match tokio::fs::read_to_string(&*path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e),
        };

        let mut lines: VecDeque<&str> = existing.lines().collect();
        lines.extend(new_lines.iter().map(String::as_str));
        while lines.len() > self.max_lines {
            lines.pop_front();
        }

        let mut contents = String::with_capacity(existing.len());
        for line in &lines {
            contents.push_str(line);
            contents.push('\n');
        }
        tokio::fs::write(&*path, contents).await
    }
}
