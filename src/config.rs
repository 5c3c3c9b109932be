//! Configuration surface, in the same consuming-builder style as
//! `write::WriteOptions` in the teacher crate.

use std::path::{Path, PathBuf};

/// The per-chunk compression scheme. `None` disables compression for the
/// whole database; `Lz4`/`Zstd` select the codec `compressor::new_compressor`
/// instantiates per writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionType {
    #[default]
    None,
    #[cfg(feature = "lz4")]
    Lz4,
    #[cfg(feature = "zstd")]
    Zstd,
}

/// Database-wide configuration.
#[derive(Debug, Clone)]
pub struct DbOptions {
    path: PathBuf,
    maximum_chunk_size: u64,
    compression: CompressionType,
}

/// Default chunk ceiling: 64 KiB, generous enough that most values fit in a
/// single chunk but small enough that one oversized `Put` cannot blow out
/// the in-memory write buffer.
pub const DEFAULT_MAXIMUM_CHUNK_SIZE: u64 = 64 * 1024;

impl DbOptions {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            maximum_chunk_size: DEFAULT_MAXIMUM_CHUNK_SIZE,
            compression: CompressionType::default(),
        }
    }

    /// `storage__maximum_chunk_size`: the largest chunk the pipeline will
    /// hand to the write buffer in one call; larger inputs are split.
    pub fn maximum_chunk_size(mut self, maximum_chunk_size: u64) -> Self {
        self.maximum_chunk_size = maximum_chunk_size;
        self
    }

    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_maximum_chunk_size(&self) -> u64 {
        self.maximum_chunk_size
    }

    pub fn get_compression(&self) -> CompressionType {
        self.compression
    }

    /// Engine-dictated alignment padding available to the compressor as
    /// overflow slack, as a function of the entry's declared uncompressed
    /// size. Real engines pad to their own record/block alignment; the
    /// reference engine in this crate aligns to 8 bytes, floored at one
    /// frame header's worth of slack so a single uncompressed-fallback
    /// frame always fits regardless of alignment remainder.
    pub fn padding(&self, size_value: u64) -> u64 {
        const ALIGNMENT: u64 = 8;
        const MIN_RESERVE: u64 = 5; // one frame header (see compressor::size_frame_header)
        let remainder = size_value % ALIGNMENT;
        let align_pad = if remainder == 0 { 0 } else { ALIGNMENT - remainder };
        align_pad.max(MIN_RESERVE)
    }
}

/// Reserved for future per-call overrides (verbosity, snapshot pinning);
/// empty today, the way `write::WriteOptions`'s sibling read-side knobs
/// start minimal and grow.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions;

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions;
