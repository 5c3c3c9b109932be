//! Per-writer streaming compression state.
//!
//! Each chunk of an entry becomes one independent frame — a 1-byte flag
//! (`0` = compressed, `1` = stored verbatim) followed by a little-endian
//! `u32` payload length and the payload itself. Independence per frame is
//! what lets a consumer decompress a prefix of the entry without seeing
//! later chunks, as required by the fallback mechanism in the chunk
//! pipeline. This mirrors the `Decompressor` trait in the teacher crate's
//! `sans_io::decompressor` (reset/consume/produce, one impl per codec), but
//! on the compression side and using each codec's block API — a chunk-sized
//! unit of work, not a long-lived container stream — since every frame here
//! must stand alone.

use byteorder::{WriteBytesExt, LE};

use crate::config::CompressionType;
use crate::status::DbError;

pub const FRAME_FLAG_COMPRESSED: u8 = 0;
pub const FRAME_FLAG_UNCOMPRESSED: u8 = 1;
const FRAME_HEADER_LEN: u64 = 5; // 1 byte flag + 4 byte LE length

/// Per-writer compression state for one in-flight entry.
pub trait StreamingCompressor: Send {
    /// Begins a new entry's frame stream.
    fn reset(&mut self);

    /// Constant length of a frame header.
    fn size_frame_header(&self) -> u64 {
        FRAME_HEADER_LEN
    }

    /// Size of a frame that stores `n` bytes verbatim.
    fn size_uncompressed_frame(&self, n: u64) -> u64 {
        self.size_frame_header() + n
    }

    /// Compresses `src` into one new frame, returning the framed bytes.
    fn compress(&mut self, src: &[u8]) -> Result<Vec<u8>, DbError>;

    /// Cumulative bytes emitted across frames since `reset()`.
    fn size_compressed(&self) -> u64;

    /// Applies a signed correction after the caller discards a speculative
    /// frame (used when the chunk pipeline abandons a compressed frame in
    /// favor of the uncompressed fallback).
    fn adjust_compressed_size(&mut self, delta: i64);

    /// Rewrites the header of a freshly constructed frame to mark it as
    /// stored uncompressed.
    fn disable_compression_in_frame_header(&self, buf: &mut [u8]) {
        buf[0] = FRAME_FLAG_UNCOMPRESSED;
    }
}

fn write_frame(flag: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN as usize + payload.len());
    frame.push(flag);
    frame
        .write_u32::<LE>(payload.len() as u32)
        .expect("writing to a Vec<u8> cannot fail");
    frame.extend_from_slice(payload);
    frame
}

/// Builds an uncompressed fallback frame for `chunk`, the way step 4 of the
/// chunk pipeline does when it abandons a speculative compressed frame.
pub fn uncompressed_frame(chunk: &[u8]) -> Vec<u8> {
    write_frame(FRAME_FLAG_UNCOMPRESSED, chunk)
}

#[cfg(feature = "lz4")]
pub struct Lz4Compressor {
    size_compressed: u64,
}

#[cfg(feature = "lz4")]
impl Lz4Compressor {
    pub fn new() -> Self {
        Self { size_compressed: 0 }
    }
}

#[cfg(feature = "lz4")]
impl StreamingCompressor for Lz4Compressor {
    fn reset(&mut self) {
        self.size_compressed = 0;
    }

    fn compress(&mut self, src: &[u8]) -> Result<Vec<u8>, DbError> {
        let body = lz4::block::compress(src, None, false)
            .map_err(|e| DbError::Compression(e.to_string()))?;
        let frame = write_frame(FRAME_FLAG_COMPRESSED, &body);
        self.size_compressed += frame.len() as u64;
        Ok(frame)
    }

    fn size_compressed(&self) -> u64 {
        self.size_compressed
    }

    fn adjust_compressed_size(&mut self, delta: i64) {
        self.size_compressed = (self.size_compressed as i64 + delta) as u64;
    }
}

#[cfg(feature = "zstd")]
pub struct ZstdCompressor {
    size_compressed: u64,
    level: i32,
}

#[cfg(feature = "zstd")]
impl ZstdCompressor {
    pub fn new() -> Self {
        Self {
            size_compressed: 0,
            level: 0,
        }
    }
}

#[cfg(feature = "zstd")]
impl StreamingCompressor for ZstdCompressor {
    fn reset(&mut self) {
        self.size_compressed = 0;
    }

    fn compress(&mut self, src: &[u8]) -> Result<Vec<u8>, DbError> {
        let body = zstd::bulk::compress(src, self.level)
            .map_err(|e| DbError::Compression(e.to_string()))?;
        let frame = write_frame(FRAME_FLAG_COMPRESSED, &body);
        self.size_compressed += frame.len() as u64;
        Ok(frame)
    }

    fn size_compressed(&self) -> u64 {
        self.size_compressed
    }

    fn adjust_compressed_size(&mut self, delta: i64) {
        self.size_compressed = (self.size_compressed as i64 + delta) as u64;
    }
}

/// Decodes the frame stream produced by [`StreamingCompressor`] back into
/// the original bytes. Used by the reference in-memory engine to serve
/// `Get`; a real log-structured engine would own this instead.
///
/// An uncompressed frame's declared length covers only the chunk that was
/// in flight when the fallback engaged; every chunk submitted afterward for
/// that entry appends raw bytes with no frame header of its own (the chunk
/// pipeline never re-enables compression once it disables it for an
/// entry). So the first uncompressed flag this function sees means
/// everything from that point to the end of the byte stream is raw value
/// bytes, and the declared length is not consulted for it.
pub fn decode_frame_stream(bytes: &[u8], compression: CompressionType) -> Vec<u8> {
    let mut out = Vec::new();
    let mut pos = 0usize;
    while pos < bytes.len() {
        let flag = bytes[pos];
        if flag == FRAME_FLAG_UNCOMPRESSED {
            out.extend_from_slice(&bytes[pos + 5..]);
            break;
        }
        let len = u32::from_le_bytes(bytes[pos + 1..pos + 5].try_into().unwrap()) as usize;
        let payload = &bytes[pos + 5..pos + 5 + len];
        match flag {
            FRAME_FLAG_COMPRESSED => match compression {
                #[cfg(feature = "lz4")]
                CompressionType::Lz4 => {
                    let decompressed = lz4::block::decompress(payload, None)
                        .expect("frame produced by Lz4Compressor must decompress");
                    out.extend_from_slice(&decompressed);
                }
                #[cfg(feature = "zstd")]
                CompressionType::Zstd => {
                    // Each frame covers at most `storage__maximum_chunk_size`
                    // uncompressed bytes; oversize the capacity guess generously.
                    let decompressed = zstd::bulk::decompress(payload, payload.len() * 32 + 4096)
                        .expect("frame produced by ZstdCompressor must decompress");
                    out.extend_from_slice(&decompressed);
                }
                CompressionType::None => unreachable!(
                    "a compressed frame cannot appear when compression is disabled"
                ),
            },
            other => unreachable!("unknown frame flag {other}"),
        }
        pos += 5 + len;
    }
    out
}

pub fn new_compressor(kind: CompressionType) -> Option<Box<dyn StreamingCompressor>> {
    match kind {
        CompressionType::None => None,
        #[cfg(feature = "lz4")]
        CompressionType::Lz4 => Some(Box::new(Lz4Compressor::new())),
        #[cfg(feature = "zstd")]
        CompressionType::Zstd => Some(Box::new(ZstdCompressor::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "zstd")]
    #[test]
    fn zstd_round_trip_single_frame() {
        let mut c = ZstdCompressor::new();
        c.reset();
        let frame = c.compress(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap();
        assert_eq!(c.size_compressed(), frame.len() as u64);
        let decoded = decode_frame_stream(&frame, CompressionType::Zstd);
        assert_eq!(decoded, b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    }

    #[test]
    fn uncompressed_frame_round_trips() {
        let frame = uncompressed_frame(b"hello");
        let decoded = decode_frame_stream(&frame, CompressionType::None);
        assert_eq!(decoded, b"hello");
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn lz4_round_trip_single_frame() {
        let mut c = Lz4Compressor::new();
        c.reset();
        let frame = c.compress(b"abcabcabcabcabcabcabcabcabcabc").unwrap();
        let decoded = decode_frame_stream(&frame, CompressionType::Lz4);
        assert_eq!(decoded, b"abcabcabcabcabcabcabcabcabcabc");
    }
}
