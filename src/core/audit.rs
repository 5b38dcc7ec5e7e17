//! Request/response audit trail.
//!
//! The dispatcher hands every completed exchange round trip to an optional
//! [`AuditSink`]. Recording is best effort: a failing sink is logged and the
//! call it describes proceeds unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

pub const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub url: String,
    /// Request headers with secret material already redacted
    pub request_headers: Vec<(String, String)>,
    pub response_status: u16,
    pub response_body: String,
    pub query_time: DateTime<Utc>,
    pub response_time: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("audit recorder is closed")]
    Closed,

    #[error("audit recorder lock poisoned")]
    Poisoned,
}

/// Receiver of audit entries. Implementations must tolerate concurrent callers
/// and must not block on I/O inside `record`.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// Appends one JSON document per line to a file.
///
/// `record` only enqueues; a background task owns the file, so writes are
/// serialized no matter how many dispatchers share the sink.
#[derive(Debug, Clone)]
pub struct JsonlAuditSink {
    tx: mpsc::UnboundedSender<AuditEntry>,
}

impl JsonlAuditSink {
    /// Start the writer task. The task drains pending entries and exits once
    /// every clone of the returned sink has been dropped.
    pub fn spawn(path: impl Into<PathBuf>) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(rx, path.into()));
        (Self { tx }, handle)
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.tx.send(entry).map_err(|_| AuditError::Closed)
    }
}

async fn open_writer(path: &Path) -> std::io::Result<BufWriter<fs::File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    Ok(BufWriter::new(file))
}

async fn run_writer(mut rx: mpsc::UnboundedReceiver<AuditEntry>, path: PathBuf) {
    let mut writer = match open_writer(&path).await {
        Ok(writer) => writer,
        Err(e) => {
            error!(?e, path = %path.display(), "audit: failed to open log file");
            return;
        }
    };
    info!(path = %path.display(), "audit: recorder started");

    while let Some(entry) = rx.recv().await {
        let mut line = match serde_json::to_vec(&entry) {
            Ok(line) => line,
            Err(e) => {
                error!(?e, "audit: serialize error, entry dropped");
                continue;
            }
        };
        line.push(b'\n');

        if let Err(e) = writer.write_all(&line).await {
            error!(?e, "audit: write failed, entry dropped");
            continue;
        }
        if let Err(e) = writer.flush().await {
            error!(?e, "audit: flush failed");
        }
    }

    info!("audit: recorder stopped");
}

/// Keeps entries in memory. Useful for inspection in tests and tooling.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    entries: Arc<Mutex<Vec<AuditEntry>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .map_err(|_| AuditError::Poisoned)?
            .push(entry);
        Ok(())
    }
}

/// Copy of `headers` with the values of `secret_headers` replaced.
pub fn redact_headers(headers: &[(String, String)], secret_headers: &[&str]) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            if secret_headers
                .iter()
                .any(|secret| secret.eq_ignore_ascii_case(name))
            {
                (name.clone(), REDACTED.to_string())
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}
