//! `Database`: the public facade tying the chunk pipeline, write buffer,
//! and storage engine collaborators together.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::byte_array::ByteArray;
use crate::config::{DbOptions, ReadOptions, WriteOptions};
use crate::engine::Engine;
use crate::pipeline;
use crate::snapshot::Snapshot;
use crate::status::{DbError, DbResult, Status};
use crate::write_buffer::WriteBuffer;

/// An open key-value database. Cheap to clone-share via `Arc` if needed by
/// callers; internally every collaborator is already behind its own lock.
pub struct Database {
    options: DbOptions,
    engine: Arc<Engine>,
    write_buffer: WriteBuffer,
    closed: AtomicBool,
}

impl Database {
    pub fn open(options: DbOptions) -> DbResult<Self> {
        let engine = Arc::new(Engine::new());
        let write_buffer = WriteBuffer::new(engine.clone(), options.get_compression());
        Ok(Self {
            options,
            engine,
            write_buffer,
            closed: AtomicBool::new(false),
        })
    }

    fn check_open(&self) -> DbResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DbError::Closed);
        }
        Ok(())
    }

    /// Marks the database closed; further operations return
    /// `DbError::Closed` ("database is not open").
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn get(&self, _read_options: &ReadOptions, key: &[u8]) -> DbResult<(Status, Vec<u8>)> {
        self.check_open()?;
        let (status, value) = self.write_buffer.get(key);
        if status.is_delete_order() {
            return Ok((Status::not_found(), Vec::new()));
        }
        if status.is_not_found() {
            return Ok(self.engine.get(key));
        }
        Ok((status, value))
    }

    pub fn put(&self, write_options: &WriteOptions, key: &[u8], value: &[u8]) -> DbResult<()> {
        self.put_chunk(write_options, key, ByteArray::borrowed(value), 0, value.len() as u64)
    }

    pub fn put_chunk(
        &self,
        _write_options: &WriteOptions,
        key: &[u8],
        chunk: ByteArray<'_>,
        offset_chunk: u64,
        size_value: u64,
    ) -> DbResult<()> {
        self.check_open()?;
        pipeline::put_chunk(&self.write_buffer, &self.options, key, chunk, offset_chunk, size_value)
    }

    pub fn delete(&self, _write_options: &WriteOptions, key: &[u8]) -> DbResult<()> {
        self.check_open()?;
        let status = self.engine.file_system_status();
        if !status.is_ok() {
            return Ok(());
        }
        self.write_buffer.delete(key)
    }

    /// Flushes the write buffer into the engine, seals the current file,
    /// and builds a read-only view bounded at the resulting `fileid_end`.
    pub fn new_snapshot(&self) -> DbResult<Snapshot> {
        self.check_open()?;
        log::debug!("new_snapshot: flushing write buffer");
        self.write_buffer.flush()?;
        let fileid_end = self.engine.flush_current_file_for_snapshot();
        log::debug!("new_snapshot: sealed current file at fileid_end={fileid_end}");
        let (snapshot_id, ignore_set) = self.engine.get_new_snapshot_data();
        Ok(Snapshot::new(self.engine.clone(), snapshot_id, fileid_end, &ignore_set))
    }

    pub fn new_iterator(&self, _read_options: &ReadOptions) -> DbResult<Snapshot> {
        self.new_snapshot()
    }
}
