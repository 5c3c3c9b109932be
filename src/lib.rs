//! An embeddable, append-only key-value store core.
//!
//! The durable file layout and compaction are out of scope here — `engine`
//! exposes the trait boundary a real log-structured engine would sit
//! behind, backed today by an in-memory reference implementation. What
//! this crate does own end to end is the write path: chunking an
//! oversized value, streaming per-writer compression and CRC state across
//! an entry's chunks, falling back to uncompressed framing when a
//! compressed entry would overrun its on-disk budget, and dispatching the
//! framed bytes to a write buffer collaborator. [`Database`] ties these
//! pieces together behind `Get`/`Put`/`PutChunk`/`Delete` plus
//! snapshot-consistent iteration.

pub mod byte_array;
pub mod compressor;
pub mod config;
pub mod db;
pub mod engine;
pub mod pipeline;
pub mod snapshot;
pub mod status;
pub mod write_buffer;
pub(crate) mod writer_state;
mod crc;

pub use byte_array::ByteArray;
pub use config::{CompressionType, DbOptions, ReadOptions, WriteOptions};
pub use db::Database;
pub use snapshot::{Iter, Snapshot};
pub use status::{DbError, DbResult, Status, StatusKind};
