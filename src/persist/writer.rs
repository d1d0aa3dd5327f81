//! Single-writer queue for the persisted config.
//!
//! Every registry mutation submits a full snapshot. Requests are handled by one
//! task in submission order; when several are queued only the newest snapshot
//! is written and all of them are answered with that write's result. Writes
//! therefore complete in initiation order and the file converges to the latest
//! registry state.

use std::path::{Path, PathBuf};

use tokio::sync::{mpsc, oneshot};

use super::error::{PersistError, PersistResult};

type WriteOutcome = Result<(), String>;

struct WriteRequest {
    contents: String,
    done: oneshot::Sender<WriteOutcome>,
}

/// Handle to the writer task for one file. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PersistWriter {
    path: PathBuf,
    tx: mpsc::UnboundedSender<WriteRequest>,
}

impl std::fmt::Debug for WriteRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteRequest")
            .field("bytes", &self.contents.len())
            .finish()
    }
}

impl PersistWriter {
    /// Spawn the writer task. Must be called inside a tokio runtime.
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(path.clone(), rx));
        Self { path, tx }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Queue a snapshot for writing.
    ///
    /// The returned handle may be awaited for the result or dropped; failures
    /// are logged by the writer either way.
    pub fn submit(&self, contents: String) -> PendingWrite {
        let (done, rx) = oneshot::channel();
        if self.tx.send(WriteRequest { contents, done }).is_err() {
            return PendingWrite {
                path: self.path.clone(),
                rx: None,
            };
        }
        PendingWrite {
            path: self.path.clone(),
            rx: Some(rx),
        }
    }
}

/// Completion handle for one submitted snapshot.
#[derive(Debug)]
pub struct PendingWrite {
    path: PathBuf,
    rx: Option<oneshot::Receiver<WriteOutcome>>,
}

impl PendingWrite {
    /// Wait until the snapshot (or a newer one that superseded it) is on disk.
    pub async fn wait(self) -> PersistResult<()> {
        let Some(rx) = self.rx else {
            return Err(PersistError::WriterClosed { path: self.path });
        };
        match rx.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(reason)) => Err(PersistError::Write {
                path: self.path,
                reason,
            }),
            Err(_) => Err(PersistError::WriterClosed { path: self.path }),
        }
    }
}

async fn run(path: PathBuf, mut rx: mpsc::UnboundedReceiver<WriteRequest>) {
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }

        let mut waiters = Vec::with_capacity(batch.len());
        let mut latest = String::new();
        for request in batch {
            latest = request.contents;
            waiters.push(request.done);
        }

        let outcome = write_atomic(&path, &latest)
            .await
            .map_err(|e| e.to_string());

        match &outcome {
            Ok(()) => crate::debug_event!(
                "persist",
                "written",
                "{} ({} snapshot(s))",
                path.display(),
                waiters.len()
            ),
            Err(reason) => tracing::error!("[persist] failed to write {}: {reason}", path.display()),
        }

        for done in waiters {
            let _ = done.send(outcome.clone());
        }
    }
}

/// Write to a sibling temp file, then rename it over the target.
async fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "paths.json".to_string());
    let tmp = path.with_file_name(format!(".{file_name}.tmp"));

    tokio::fs::write(&tmp, contents).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
            crate::debug_event!("persist", "temp file left behind", "{}: {cleanup}", tmp.display());
        }
        return Err(e);
    }
    Ok(())
}
