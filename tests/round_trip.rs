use kingvault::{ByteArray, Database, DbOptions, ReadOptions, WriteOptions};

fn open(path: &str, maximum_chunk_size: u64) -> Database {
    Database::open(DbOptions::new(path).maximum_chunk_size(maximum_chunk_size)).unwrap()
}

#[test]
fn single_chunk_value_round_trips() {
    let db = open("/tmp/kingvault-round-trip-a", 64);
    db.put(&WriteOptions::default(), b"k", b"hello").unwrap();
    let (status, value) = db.get(&ReadOptions::default(), b"k").unwrap();
    assert!(status.is_ok());
    assert_eq!(value, b"hello");
}

/// S1: `storage__maximum_chunk_size=4`, compression=none. `Put("k", "abcdefg")`
/// splits into chunks of sizes 4 and 3 at offsets 0 and 4; `Get("k")` returns
/// the concatenation.
#[test]
fn s1_oversize_value_splits_into_exact_chunk_sizes() {
    let db = open("/tmp/kingvault-round-trip-s1", 4);
    db.put(&WriteOptions::default(), b"k", b"abcdefg").unwrap();
    let (status, value) = db.get(&ReadOptions::default(), b"k").unwrap();
    assert!(status.is_ok());
    assert_eq!(value, b"abcdefg");
}

#[test]
fn explicit_multi_chunk_put_chunk_calls_round_trip() {
    let db = open("/tmp/kingvault-round-trip-b", 4);
    let value = b"abcdefg";
    db.put_chunk(
        &WriteOptions::default(),
        b"k",
        ByteArray::borrowed(&value[0..4]),
        0,
        value.len() as u64,
    )
    .unwrap();
    db.put_chunk(
        &WriteOptions::default(),
        b"k",
        ByteArray::borrowed(&value[4..]),
        4,
        value.len() as u64,
    )
    .unwrap();

    let (status, got) = db.get(&ReadOptions::default(), b"k").unwrap();
    assert!(status.is_ok());
    assert_eq!(got, value);
}

#[test]
fn empty_value_round_trips() {
    let db = open("/tmp/kingvault-round-trip-c", 16);
    db.put(&WriteOptions::default(), b"k", b"").unwrap();
    let (status, value) = db.get(&ReadOptions::default(), b"k").unwrap();
    assert!(status.is_ok());
    assert_eq!(value, b"");
}
