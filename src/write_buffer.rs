//! The write buffer collaborator.
//!
//! Internal queueing is out of scope; modeled here is the trait boundary
//! the chunk pipeline dispatches into (`put_chunk`, `delete`, `get`,
//! `flush`) plus a reference in-memory implementation that accumulates a
//! partial entry's frames until its last chunk arrives, then hands the
//! decoded value to the engine on `flush`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::compressor::decode_frame_stream;
use crate::config::CompressionType;
use crate::engine::{Engine, Op};
use crate::status::{DbResult, Status};

enum BufferedEntry {
    Tombstone,
    Pending {
        /// `(offset_chunk_compressed, bytes)` in arrival order; arrival
        /// order is offset order per the chunk pipeline's invariants.
        frames: Vec<(u64, Vec<u8>)>,
        size_value: u64,
    },
    Complete { value: Vec<u8>, crc32: u32 },
}

/// The write buffer collaborator: `Get`, `PutChunk`, `Delete`, `Flush`.
///
/// `is_last` is passed explicitly alongside the sentinel-bearing
/// `size_value_compressed`/`crc32` fields the spec's collaborator contract
/// names, since those sentinels (`0`) are ambiguous for a zero-length
/// value or an incidentally zero CRC (see `SPEC_FULL.md` open questions).
pub struct WriteBuffer {
    engine: Arc<Engine>,
    compression: CompressionType,
    entries: Mutex<HashMap<Vec<u8>, BufferedEntry>>,
}

impl WriteBuffer {
    pub fn new(engine: Arc<Engine>, compression: CompressionType) -> Self {
        Self {
            engine,
            compression,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &[u8]) -> (Status, Vec<u8>) {
        let entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(BufferedEntry::Tombstone) => (Status::delete_order(), Vec::new()),
            Some(BufferedEntry::Complete { value, .. }) => (Status::ok(), value.clone()),
            Some(BufferedEntry::Pending { .. }) | None => (Status::not_found(), Vec::new()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn put_chunk(
        &self,
        key: &[u8],
        bytes: &[u8],
        offset_chunk_compressed: u64,
        size_value: u64,
        size_value_compressed: u64,
        crc32: u32,
        is_last: bool,
    ) -> DbResult<()> {
        let mut entries = self.entries.lock().unwrap();

        // `offset_chunk_compressed == 0` only ever holds for an entry's
        // first dispatched chunk (the compressor's cumulative position, or
        // the logical offset in the uncompressed path, both start at 0),
        // so it doubles as the pipeline's `is_first_chunk` signal here.
        // A fresh first chunk overwrites whatever was buffered for this key
        // before (tombstone, stale completed value, or an abandoned partial
        // entry), matching the read path's "buffer is authoritative for
        // recent mutations" rule.
        if offset_chunk_compressed == 0 {
            entries.insert(
                key.to_vec(),
                BufferedEntry::Pending {
                    frames: Vec::new(),
                    size_value,
                },
            );
        }

        let entry = entries
            .entry(key.to_vec())
            .or_insert_with(|| BufferedEntry::Pending {
                frames: Vec::new(),
                size_value,
            });
        let BufferedEntry::Pending { frames, .. } = entry else {
            unreachable!("a non-first chunk must continue an existing Pending entry");
        };
        frames.push((offset_chunk_compressed, bytes.to_vec()));

        if is_last {
            let mut frames = std::mem::take(frames);
            frames.sort_by_key(|(offset, _)| *offset);
            let mut framed = Vec::new();
            for (_, bytes) in &frames {
                framed.extend_from_slice(bytes);
            }
            let value = if size_value_compressed > 0 || self.compression != CompressionType::None {
                decode_frame_stream(&framed, self.compression)
            } else {
                framed
            };
            entries.insert(
                key.to_vec(),
                BufferedEntry::Complete { value, crc32 },
            );
        }
        Ok(())
    }

    pub fn delete(&self, key: &[u8]) -> DbResult<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_vec(), BufferedEntry::Tombstone);
        Ok(())
    }

    /// Drains every completed mutation into the engine, in arbitrary order
    /// (the reference engine timestamps them with its own sequence
    /// counter on `apply`, which is what establishes total order).
    pub fn flush(&self) -> DbResult<()> {
        let mut entries = self.entries.lock().unwrap();
        let drained: Vec<(Vec<u8>, BufferedEntry)> = entries.drain().collect();
        for (key, entry) in drained {
            match entry {
                BufferedEntry::Complete { value, .. } => {
                    self.engine.apply(Op::Put { key, value });
                }
                BufferedEntry::Tombstone => {
                    self.engine.apply(Op::Delete { key });
                }
                BufferedEntry::Pending { .. } => {
                    // An entry whose last chunk never arrived is discarded
                    // rather than partially flushed.
                    log::debug!("discarding incomplete entry on flush");
                }
            }
        }
        Ok(())
    }
}
