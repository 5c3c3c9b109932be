//! The storage engine collaborator.
//!
//! The engine's file layout and compaction are explicitly out of scope for
//! this specification; what's modeled here is the trait boundary the chunk
//! pipeline and `Database` rely on, plus a minimal in-memory reference
//! implementation (a materialized table plus a log of sealed "files") so
//! the crate is runnable and testable end to end. Swap `InMemoryEngine` for
//! a real log-structured engine without touching `pipeline`.

use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use crate::status::Status;

#[derive(Clone)]
pub(crate) enum Op {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

struct SealedFile {
    id: u64,
    ops: Vec<(u64, Op)>,
}

struct EngineInner {
    table: BTreeMap<Vec<u8>, Vec<u8>>,
    current_ops: Vec<(u64, Op)>,
    sealed: Vec<SealedFile>,
    next_file_id: u64,
    next_seq: u64,
    next_snapshot_id: u64,
}

/// A read-only, point-in-time view of the engine, bounded by `fileid_end`
/// and excluding `ignore_set`. Materializes eagerly at construction time —
/// acceptable for a reference engine backing tests; a real engine would
/// open file handles lazily instead.
pub struct EngineView {
    by_key: BTreeMap<Vec<u8>, Vec<u8>>,
    ordered: Vec<(Vec<u8>, Vec<u8>)>,
}

impl EngineView {
    pub fn get(&self, key: &[u8]) -> (Status, Vec<u8>) {
        match self.by_key.get(key) {
            Some(v) => (Status::ok(), v.clone()),
            None => (Status::not_found(), Vec::new()),
        }
    }

    /// Entries in file-id-then-within-file order, as the spec's iteration
    /// contract requires.
    pub fn ordered_entries(&self) -> &[(Vec<u8>, Vec<u8>)] {
        &self.ordered
    }
}

/// The durable storage engine collaborator. File layout and compaction are
/// out of scope; this is a reference in-memory stand-in behind the same
/// trait boundary.
pub struct Engine {
    inner: Mutex<EngineInner>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(EngineInner {
                table: BTreeMap::new(),
                current_ops: Vec::new(),
                sealed: Vec::new(),
                next_file_id: 1,
                next_seq: 0,
                next_snapshot_id: 0,
            }),
        }
    }

    pub fn get(&self, key: &[u8]) -> (Status, Vec<u8>) {
        let inner = self.inner.lock().unwrap();
        match inner.table.get(key) {
            Some(v) => (Status::ok(), v.clone()),
            None => (Status::not_found(), Vec::new()),
        }
    }

    /// Fail-fast health check consulted by `Delete` before it enqueues a
    /// tombstone. The reference engine never reports unhealthy; a real
    /// engine would check for a failed disk here.
    pub fn file_system_status(&self) -> Status {
        Status::ok()
    }

    pub(crate) fn apply(&self, op: Op) {
        let mut inner = self.inner.lock().unwrap();
        match &op {
            Op::Put { key, value } => {
                inner.table.insert(key.clone(), value.clone());
            }
            Op::Delete { key } => {
                inner.table.remove(key);
            }
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.current_ops.push((seq, op));
    }

    /// Seals whatever has accumulated in the current append file and
    /// returns the new `fileid_end` boundary (the highest sealed file id).
    pub fn flush_current_file_for_snapshot(&self) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        if !inner.current_ops.is_empty() {
            let id = inner.next_file_id;
            inner.next_file_id += 1;
            let ops = std::mem::take(&mut inner.current_ops);
            inner.sealed.push(SealedFile { id, ops });
        }
        inner.sealed.last().map(|f| f.id).unwrap_or(0)
    }

    /// Allocates a snapshot id and returns the set of file ids newer than
    /// the snapshot but already on disk (e.g. from a concurrent compaction
    /// in a real engine). The reference engine never compacts, so this is
    /// always empty.
    pub fn get_new_snapshot_data(&self) -> (u64, HashSet<u64>) {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_snapshot_id;
        inner.next_snapshot_id += 1;
        (id, HashSet::new())
    }

    /// Ordered file ids a snapshot's iterator must walk.
    pub fn get_fileids_iterator(&self, fileid_end: u64, ignore_set: &HashSet<u64>) -> Vec<u64> {
        let inner = self.inner.lock().unwrap();
        inner
            .sealed
            .iter()
            .map(|f| f.id)
            .filter(|id| *id <= fileid_end && !ignore_set.contains(id))
            .collect()
    }

    /// Builds a read-only view parametrized by `fileid_end` and
    /// `ignore_set`, replaying sealed files in order. Iteration order is by
    /// file id ascending, then within-file order of each surviving key's
    /// last write, per the snapshot iteration contract.
    pub fn build_view(&self, fileid_end: u64, ignore_set: &HashSet<u64>) -> EngineView {
        let inner = self.inner.lock().unwrap();
        let mut by_key: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        // key -> order of its last surviving write, used to sort the
        // iteration output without re-scanning the log.
        let mut last_write_order: BTreeMap<Vec<u8>, (u64, u64)> = BTreeMap::new();

        for file in inner
            .sealed
            .iter()
            .filter(|f| f.id <= fileid_end && !ignore_set.contains(&f.id))
        {
            for (seq, op) in &file.ops {
                match op {
                    Op::Put { key, value } => {
                        by_key.insert(key.clone(), value.clone());
                        last_write_order.insert(key.clone(), (file.id, *seq));
                    }
                    Op::Delete { key } => {
                        by_key.remove(key);
                        last_write_order.remove(key);
                    }
                }
            }
        }

        let mut ordered: Vec<((u64, u64), (Vec<u8>, Vec<u8>))> = last_write_order
            .into_iter()
            .map(|(key, order)| {
                let value = by_key.get(&key).cloned().unwrap_or_default();
                (order, (key, value))
            })
            .collect();
        ordered.sort_by_key(|(order, _)| *order);
        let ordered = ordered.into_iter().map(|(_, entry)| entry).collect();

        EngineView { by_key, ordered }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
