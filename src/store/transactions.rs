//! Process-wide store of tracked claim transactions.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::claims::{Stage, Transaction, TransactionStatus, TxIdentity};
use crate::observability::metrics;

const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Errors from loading or flushing the store file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store file is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Why a write was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Identical to what is stored.
    Unchanged,
    /// The stored record is already `passed` or `failed`.
    Terminal,
    /// The write would move the record back in its lifecycle.
    Regression,
    /// The write belongs to an older submission for the same identity.
    StaleAttempt,
}

/// Result of [`TransactionStore::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Inserted,
    Updated,
    /// A new submission took the place of an older one for the same identity.
    Replaced,
    Ignored(IgnoreReason),
}

impl SaveOutcome {
    pub fn is_applied(self) -> bool {
        !matches!(self, SaveOutcome::Ignored(_))
    }
}

/// Counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub pending: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
struct Stored {
    seq: u64,
    tx: Transaction,
}

struct Inner {
    records: DashMap<TxIdentity, Stored>,
    next_seq: AtomicU64,
    updates: broadcast::Sender<Transaction>,
    persistence_path: Option<PathBuf>,
    flush_lock: Mutex<()>,
}

/// Shared handle to the transaction store.
///
/// Cloning is cheap; every clone sees the same records. Writers are the claim
/// submission flow and the reconciler; everything else only reads.
#[derive(Clone)]
pub struct TransactionStore {
    inner: Arc<Inner>,
}

impl Default for TransactionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TransactionStore {
    /// Create an empty store, flushing to `persistence_path` when set.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                records: DashMap::new(),
                next_seq: AtomicU64::new(0),
                updates,
                persistence_path,
                flush_lock: Mutex::new(()),
            }),
        }
    }

    /// Open a store backed by `path`, loading existing records if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let store = Self::new(Some(path.to_path_buf()));

        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let transactions: Vec<Transaction> = serde_json::from_reader(reader)?;
            for tx in transactions {
                let seq = store.next_seq();
                store.inner.records.insert(tx.identity(), Stored { seq, tx });
            }
            metrics::record_store_size(store.len());
            tracing::info!(path = %path.display(), count = store.len(), "Loaded transactions from store file");
        }
        Ok(store)
    }

    /// Upsert by `(key, address)` without ever moving a record backwards.
    ///
    /// - same `queue_uid`: applied unless the stored record is terminal or the
    ///   write would regress its stage.
    /// - different `queue_uid`: applied only for a fresh submission over a
    ///   pending or `failed` attempt, which it replaces; a `passed` record is
    ///   never replaced and anything else is a stale write.
    pub fn save(&self, tx: Transaction) -> SaveOutcome {
        let outcome = match self.inner.records.entry(tx.identity()) {
            Entry::Vacant(slot) => {
                let seq = self.next_seq();
                slot.insert(Stored { seq, tx: tx.clone() });
                SaveOutcome::Inserted
            }
            Entry::Occupied(mut slot) => {
                let outcome = decide(&slot.get().tx, &tx);
                match outcome {
                    SaveOutcome::Updated => slot.get_mut().tx = tx.clone(),
                    SaveOutcome::Replaced => {
                        let seq = self.next_seq();
                        slot.insert(Stored { seq, tx: tx.clone() });
                    }
                    _ => {}
                }
                outcome
            }
        };

        match outcome {
            SaveOutcome::Ignored(reason) => {
                tracing::debug!(
                    event_key = %tx.key,
                    queue_uid = %tx.queue_uid,
                    status = %tx.status,
                    ?reason,
                    "Ignoring transaction write"
                );
            }
            _ => {
                metrics::record_store_size(self.len());
                self.persist();
                let _ = self.inner.updates.send(tx);
            }
        }
        outcome
    }

    /// All records in insertion order.
    pub fn list(&self) -> Vec<Transaction> {
        let mut stored: Vec<Stored> = self
            .inner
            .records
            .iter()
            .map(|r| r.value().clone())
            .collect();
        stored.sort_by_key(|s| s.seq);
        stored.into_iter().map(|s| s.tx).collect()
    }

    /// Records of one event, in insertion order.
    pub fn list_for_event(&self, key: &str) -> Vec<Transaction> {
        self.list().into_iter().filter(|tx| tx.key == key).collect()
    }

    pub fn get(&self, identity: &TxIdentity) -> Option<Transaction> {
        self.inner.records.get(identity).map(|r| r.value().tx.clone())
    }

    /// Receive every accepted write from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Transaction> {
        self.inner.updates.subscribe()
    }

    pub fn len(&self) -> usize {
        self.inner.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.records.is_empty()
    }

    pub fn summary(&self) -> StoreSummary {
        let mut summary = StoreSummary::default();
        for r in self.inner.records.iter() {
            match r.value().tx.status {
                TransactionStatus::Pending => summary.pending += 1,
                TransactionStatus::Passed => summary.passed += 1,
                TransactionStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    /// Write all records to the store file, if one is configured.
    pub fn flush(&self) -> Result<(), StoreError> {
        let Some(path) = &self.inner.persistence_path else {
            return Ok(());
        };
        let _guard = self
            .inner
            .flush_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let tmp = path.with_extension("tmp");
        {
            let writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(writer, &self.list())?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Flush after an accepted write. Inside a Tokio runtime the file IO runs
    /// on the blocking pool so `save` never blocks an async worker.
    fn persist(&self) {
        if self.inner.persistence_path.is_none() {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let store = self.clone();
                handle.spawn_blocking(move || store.flush_logged());
            }
            Err(_) => self.flush_logged(),
        }
    }

    fn flush_logged(&self) {
        if let Err(e) = self.flush() {
            tracing::error!(error = %e, "Failed to flush transaction store");
        }
    }

    fn next_seq(&self) -> u64 {
        self.inner.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}

fn decide(current: &Transaction, incoming: &Transaction) -> SaveOutcome {
    if current.queue_uid == incoming.queue_uid {
        if current == incoming {
            SaveOutcome::Ignored(IgnoreReason::Unchanged)
        } else if current.is_terminal() {
            SaveOutcome::Ignored(IgnoreReason::Terminal)
        } else if incoming.stage() < current.stage() {
            SaveOutcome::Ignored(IgnoreReason::Regression)
        } else {
            SaveOutcome::Updated
        }
    } else if current.status == TransactionStatus::Passed {
        SaveOutcome::Ignored(IgnoreReason::Terminal)
    } else if incoming.stage() == Stage::Submitted {
        if !current.is_terminal() {
            // Nothing upstream prevents this; the claim form is the only guard.
            tracing::warn!(
                event_key = %incoming.key,
                address = %incoming.address,
                previous_queue_uid = %current.queue_uid,
                queue_uid = %incoming.queue_uid,
                "New submission replaces a claim that is still pending"
            );
        }
        SaveOutcome::Replaced
    } else {
        SaveOutcome::Ignored(IgnoreReason::StaleAttempt)
    }
}
