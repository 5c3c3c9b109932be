//! The `PutChunk` chunk pipeline: the core algorithm of this crate.
//!
//! A `Put` of a value larger than one chunk arrives here as a sequence of
//! `PutChunk` calls from the same writing thread, each carrying its offset
//! into the logical value. This module classifies each chunk, drives the
//! thread-local compression/CRC state across the sequence, decides per-chunk
//! framing (compressed vs. a space-budget fallback to stored-verbatim), and
//! dispatches the framed bytes to the write buffer.

use crate::byte_array::ByteArray;
use crate::compressor::{new_compressor, uncompressed_frame};
use crate::config::DbOptions;
use crate::status::{DbError, DbResult};
use crate::write_buffer::WriteBuffer;
use crate::writer_state::with_state;

/// Writes `value[offset_value..]` as `chunk`, splitting it into
/// `maximum_chunk_size`-sized sub-chunks first when the caller hands us
/// more than the engine accepts in one call.
///
/// `offset_chunk` is the chunk's offset within the logical value, and
/// `size_value` is the value's total size (known up front; streaming a
/// value of unknown length is out of scope). All but the last sub-chunk are
/// non-owning windows into `chunk`; the last one reuses `chunk`'s buffer by
/// advancing past the bytes already submitted.
pub fn put_chunk(
    write_buffer: &WriteBuffer,
    options: &DbOptions,
    key: &[u8],
    mut chunk: ByteArray<'_>,
    mut offset_chunk: u64,
    size_value: u64,
) -> DbResult<()> {
    let maximum_chunk_size = options.get_maximum_chunk_size();

    if size_value > maximum_chunk_size && chunk.size() as u64 > maximum_chunk_size {
        loop {
            let take = maximum_chunk_size.min(chunk.size() as u64);
            let is_final_remainder = take as usize == chunk.size();
            let sub = chunk.window(take as usize);
            put_chunk_sized(write_buffer, options, key, sub, offset_chunk, size_value)?;
            offset_chunk += take;
            if is_final_remainder {
                return Ok(());
            }
            chunk.advance(take as usize);
        }
    }

    put_chunk_sized(write_buffer, options, key, chunk, offset_chunk, size_value)
}

/// The valid-size path: `chunk.size() <= storage__maximum_chunk_size`.
fn put_chunk_sized(
    write_buffer: &WriteBuffer,
    options: &DbOptions,
    key: &[u8],
    chunk: ByteArray<'_>,
    offset_chunk: u64,
    size_value: u64,
) -> DbResult<()> {
    // Step 1 — classification.
    let is_first_chunk = offset_chunk == 0;
    let is_last_chunk = offset_chunk + chunk.size() as u64 == size_value;
    let do_compression = chunk.size() > 0 && options.get_compression() != crate::config::CompressionType::None;

    log::trace!(
        "put_chunk key={:?} offset_chunk={offset_chunk} size={}",
        key,
        chunk.size()
    );

    with_state(|state| -> DbResult<()> {
        if !is_first_chunk && state.in_flight_key.as_deref() != Some(key) {
            log::error!("chunk stream interleaved with another entry's chunks");
            return Err(DbError::InvalidArgument(
                "chunk stream interleaved with another entry's chunks".to_string(),
            ));
        }

        // Step 2 — entry boot.
        if is_first_chunk {
            state.compression_enabled = true;
            state.fallback_output_offset = 0;
            state.crc.reset();
            state.crc.stream(key);
            state.in_flight_key = Some(key.to_vec());
            if do_compression {
                state.compressor = new_compressor(options.get_compression());
                if let Some(c) = state.compressor.as_mut() {
                    c.reset();
                }
            } else {
                state.compressor = None;
            }
        }

        // Step 3 — choose output framing.
        let (mut chunk_final, offset_chunk_compressed, mut out_len) = if !state.compression_enabled {
            // Fallback already engaged by a prior chunk of this entry.
            let offset = state.fallback_output_offset;
            let len = chunk.size() as u64;
            state.fallback_output_offset += len;
            (ByteArray::owned_arc(chunk.to_owned_arc()), offset, len)
        } else if !do_compression {
            (
                ByteArray::owned_arc(chunk.to_owned_arc()),
                offset_chunk,
                chunk.size() as u64,
            )
        } else {
            let compressor = state
                .compressor
                .as_mut()
                .expect("compressor was set in step 2 since do_compression is true");
            let offset_chunk_compressed = compressor.size_compressed();
            let out = compressor.compress(chunk.data())?;
            let out_len = out.len() as u64;
            (ByteArray::owned(out), offset_chunk_compressed, out_len)
        };

        // Step 4 — compression space-budget check (compressed branch only).
        if state.compression_enabled && do_compression {
            let size_remaining = size_value - offset_chunk;
            let space_left = size_value + options.padding(size_value) - offset_chunk_compressed;
            let compressor = state
                .compressor
                .as_mut()
                .expect("compressor was set in step 2 since do_compression is true");
            let frame_header = compressor.size_frame_header();
            if (size_remaining - chunk.size() as u64) + frame_header > space_left - out_len {
                compressor.adjust_compressed_size(-(out_len as i64));
                let mut fallback = uncompressed_frame(chunk.data());
                compressor.disable_compression_in_frame_header(&mut fallback);
                let fallback_len = fallback.len() as u64;
                state.compression_enabled = false;
                state.fallback_output_offset = compressor.size_compressed() + fallback_len;
                chunk_final = ByteArray::owned(fallback);
                out_len = fallback_len;
                log::debug!("compression fallback engaged for key={:?} at offset_chunk={offset_chunk}", key);
            }
        }

        // Step 5 — last-chunk compressed-size finalization.
        let size_value_compressed = if do_compression && is_last_chunk {
            if state.compression_enabled {
                state
                    .compressor
                    .as_ref()
                    .expect("compressor present when compression_enabled")
                    .size_compressed()
            } else {
                offset_chunk_compressed + chunk.size() as u64
            }
        } else {
            0
        };

        // Step 6 — CRC.
        state.crc.stream(chunk_final.data());
        let crc = if is_last_chunk { state.crc.finalize() } else { 0 };

        // Step 7 — bounds assertion.
        let size_padding = if do_compression { options.padding(size_value) } else { 0 };
        if offset_chunk_compressed + chunk_final.size() as u64 > size_value + size_padding {
            log::error!(
                "write outside allocated memory for key={:?}: offset_chunk_compressed={offset_chunk_compressed} chunk_len={} budget={}",
                key,
                chunk_final.size(),
                size_value + size_padding
            );
            return Err(DbError::BoundsViolation {
                offset_chunk_compressed,
                chunk_len: chunk_final.size() as u64,
                budget: size_value + size_padding,
            });
        }

        // Step 8 — dispatch.
        write_buffer.put_chunk(
            key,
            chunk_final.data(),
            offset_chunk_compressed,
            size_value,
            size_value_compressed,
            crc,
            is_last_chunk,
        )?;

        if is_last_chunk {
            state.in_flight_key = None;
        }
        Ok(())
    })
}
