use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use lazymirror_core::error::Result;
use lazymirror_core::protocol::traffic::{encode_counter, parse_counter};
use lazymirror_core::protocol::TrafficSnapshot;

enum Command {
    /// Add `bytes` to the total. `done` fires once the new total was persisted
    /// (or the write failed).
    Record {
        bytes: u64,
        done: Option<oneshot::Sender<()>>,
    },
}

/// Handle to the process-wide traffic counter.
///
/// Cloning is cheap; all clones feed the same accumulator task, which applies
/// increments strictly one after another.
#[derive(Clone)]
pub struct TrafficAccountant {
    tx: mpsc::UnboundedSender<Command>,
    total: Arc<AtomicU64>,
    persist_failures: Arc<AtomicU64>,
}

/// Join handle of the accumulator task.
///
/// The task exits once every `TrafficAccountant` clone is dropped and all
/// queued increments are persisted.
pub struct PersistHandle {
    task: JoinHandle<()>,
}

impl PersistHandle {
    /// Wait for queued increments to be written.
    pub async fn finish(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "traffic accountant task failed");
        }
    }
}

impl TrafficAccountant {
    /// Load the persisted total and start the accumulator task.
    ///
    /// A missing or unparseable state file starts the counter at zero.
    /// Must be called from within a tokio runtime.
    pub fn spawn(state_file: impl Into<PathBuf>) -> Result<(Self, PersistHandle)> {
        let state_file = state_file.into();
        let initial = load_total(&state_file)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let total = Arc::new(AtomicU64::new(initial));
        let persist_failures = Arc::new(AtomicU64::new(0));

        let task = tokio::spawn(run(
            rx,
            state_file,
            initial,
            Arc::clone(&total),
            Arc::clone(&persist_failures),
        ));

        Ok((
            Self { tx, total, persist_failures },
            PersistHandle { task },
        ))
    }

    /// Queue an increment. The receiver resolves after the persist attempt.
    pub fn record(&self, bytes: u64) -> oneshot::Receiver<()> {
        let (done, rx) = oneshot::channel();
        if self.tx.send(Command::Record { bytes, done: Some(done) }).is_err() {
            tracing::warn!(bytes, "traffic accountant stopped; increment dropped");
        }
        rx
    }

    /// Queue an increment nobody waits for.
    pub fn record_detached(&self, bytes: u64) {
        if self.tx.send(Command::Record { bytes, done: None }).is_err() {
            tracing::warn!(bytes, "traffic accountant stopped; increment dropped");
        }
    }

    /// Current in-memory total.
    pub fn snapshot(&self) -> TrafficSnapshot {
        TrafficSnapshot {
            total_bytes_sent: self.total.load(Ordering::Acquire),
        }
    }

    /// Number of state-file writes that failed since start.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }
}

fn load_total(state_file: &Path) -> Result<u64> {
    match std::fs::read_to_string(state_file) {
        Ok(s) => match parse_counter(&s) {
            Some(v) => {
                tracing::info!(path = %state_file.display(), total = v, "traffic counter loaded");
                Ok(v)
            }
            None => {
                tracing::warn!(path = %state_file.display(), "traffic state file is not a number; starting from 0");
                Ok(0)
            }
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if let Some(parent) = state_file.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            Ok(0)
        }
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            tracing::warn!(path = %state_file.display(), "traffic state file is not utf-8; starting from 0");
            Ok(0)
        }
        Err(e) => Err(e.into()),
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Command>,
    state_file: PathBuf,
    mut current: u64,
    total: Arc<AtomicU64>,
    persist_failures: Arc<AtomicU64>,
) {
    let tmp = tmp_path(&state_file);

    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Record { bytes, done } => {
                current = current.saturating_add(bytes);
                total.store(current, Ordering::Release);

                if let Err(e) = persist(&state_file, &tmp, current).await {
                    persist_failures.fetch_add(1, Ordering::Relaxed);
                    tracing::error!(
                        path = %state_file.display(),
                        total = current,
                        error = %e,
                        "traffic counter persist failed"
                    );
                }

                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
        }
    }

    tracing::debug!(total = current, "traffic accountant stopped");
}

/// Full overwrite via temp file + rename, so a crash never leaves a torn value.
async fn persist(state_file: &Path, tmp: &Path, total: u64) -> io::Result<()> {
    tokio::fs::write(tmp, encode_counter(total)).await?;
    tokio::fs::rename(tmp, state_file).await
}

fn tmp_path(state_file: &Path) -> PathBuf {
    let mut name = state_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    state_file.with_file_name(name)
}
