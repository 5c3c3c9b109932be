//! Point-in-time snapshots and the iterator built on top of them.

use std::collections::HashSet;
use std::sync::Arc;

use crate::engine::{Engine, EngineView};
use crate::status::DbResult;

/// A consistent, point-in-time view of the database, as of the moment
/// `Database::new_snapshot` was called. Holds both the live engine (for
/// anything that wants to bypass the frozen view) and the materialized
/// read-only view bounded at construction time.
pub struct Snapshot {
    engine: Arc<Engine>,
    view: EngineView,
    #[allow(dead_code)]
    snapshot_id: u64,
    #[allow(dead_code)]
    fileid_end: u64,
}

impl Snapshot {
    pub(crate) fn new(engine: Arc<Engine>, snapshot_id: u64, fileid_end: u64, ignore_set: &HashSet<u64>) -> Self {
        let view = engine.build_view(fileid_end, ignore_set);
        Self {
            engine,
            view,
            snapshot_id,
            fileid_end,
        }
    }

    /// Reads `key` as of this snapshot, unaffected by writes made after it
    /// was taken.
    pub fn get(&self, key: &[u8]) -> (crate::status::Status, Vec<u8>) {
        self.view.get(key)
    }

    /// The live engine this snapshot was built from, for callers that need
    /// to combine a frozen read with a live one.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Builds an iterator over this snapshot, walking entries in file-id
    /// order then within-file insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter { snapshot: self, pos: 0 }
    }
}

/// Iterates a [`Snapshot`]'s entries in file-id-then-insertion order.
/// Borrows the snapshot so it cannot outlive it.
pub struct Iter<'s> {
    snapshot: &'s Snapshot,
    pos: usize,
}

impl<'s> Iterator for Iter<'s> {
    type Item = DbResult<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let entries = self.snapshot.view.ordered_entries();
        if self.pos >= entries.len() {
            return None;
        }
        let entry = entries[self.pos].clone();
        self.pos += 1;
        Some(Ok(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Op;

    #[test]
    fn iterator_walks_entries_in_order() {
        let engine = Arc::new(Engine::new());
        engine.apply(Op::Put {
            key: b"a".to_vec(),
            value: b"1".to_vec(),
        });
        engine.apply(Op::Put {
            key: b"b".to_vec(),
            value: b"2".to_vec(),
        });
        let fileid_end = engine.flush_current_file_for_snapshot();
        let (snapshot_id, ignore) = engine.get_new_snapshot_data();
        let snapshot = Snapshot::new(engine, snapshot_id, fileid_end, &ignore);

        let got: Vec<_> = snapshot.iter().map(|r| r.unwrap()).collect();
        assert_eq!(
            got,
            vec![(b"a".to_vec(), b"1".to_vec()), (b"b".to_vec(), b"2".to_vec())]
        );
    }

    #[test]
    fn snapshot_is_unaffected_by_later_writes() {
        let engine = Arc::new(Engine::new());
        engine.apply(Op::Put {
            key: b"a".to_vec(),
            value: b"1".to_vec(),
        });
        let fileid_end = engine.flush_current_file_for_snapshot();
        let (snapshot_id, ignore) = engine.get_new_snapshot_data();
        let snapshot = Snapshot::new(engine.clone(), snapshot_id, fileid_end, &ignore);

        engine.apply(Op::Put {
            key: b"a".to_vec(),
            value: b"2".to_vec(),
        });

        assert_eq!(snapshot.get(b"a").1, b"1");
    }
}
