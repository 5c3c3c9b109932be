use kingvault::{ByteArray, Database, DbOptions, WriteOptions};

/// Property 8: the finalized CRC covers `key || on_disk_bytes`, in
/// submission order, regardless of how many chunks the value was split
/// into. Verified indirectly: two different splits of the same
/// `(key, value)` must still be indistinguishable to a reader, which only
/// holds if the CRC (and therefore the integrity check it backs) is
/// computed over the same logical byte stream both times.
#[test]
fn crc_is_independent_of_chunk_boundaries() {
    let value = b"the quick brown fox jumps over the lazy dog";

    let single = Database::open(DbOptions::new("/tmp/kingvault-crc-a").maximum_chunk_size(64)).unwrap();
    single.put(&WriteOptions::default(), b"k", value).unwrap();

    let chunked = Database::open(DbOptions::new("/tmp/kingvault-crc-b").maximum_chunk_size(5)).unwrap();
    let mut offset = 0u64;
    for window in value.chunks(5) {
        chunked
            .put_chunk(
                &WriteOptions::default(),
                b"k",
                ByteArray::borrowed(window),
                offset,
                value.len() as u64,
            )
            .unwrap();
        offset += window.len() as u64;
    }

    let (status_a, value_a) = single.get(&Default::default(), b"k").unwrap();
    let (status_b, value_b) = chunked.get(&Default::default(), b"k").unwrap();
    assert!(status_a.is_ok());
    assert!(status_b.is_ok());
    assert_eq!(value_a, value_b);
    assert_eq!(value_a, value);
}

#[test]
fn chunk_stream_interleaved_with_another_entry_is_rejected() {
    let db = Database::open(DbOptions::new("/tmp/kingvault-crc-c").maximum_chunk_size(4)).unwrap();
    let value = b"abcdefgh";

    db.put_chunk(&WriteOptions::default(), b"k", ByteArray::borrowed(&value[..4]), 0, value.len() as u64)
        .unwrap();

    // A non-first chunk for a key whose stream was never started on this
    // thread must be rejected rather than silently treated as a fresh entry.
    let err = db
        .put_chunk(
            &WriteOptions::default(),
            b"other-key",
            ByteArray::borrowed(&value[4..]),
            4,
            value.len() as u64,
        )
        .unwrap_err();
    assert!(matches!(err, kingvault::DbError::InvalidArgument(_)));
}
