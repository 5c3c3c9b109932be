//! Streaming CRC32 state for one in-flight entry.
//!
//! Built directly on [`crc32fast::Hasher`], the same primitive
//! `io_utils::CountingCrcWriter` wraps for MCAP's summary-section and
//! attachment checksums. `reset()` must be called exactly once per entry
//! before any `stream()` call; `finalize()` is called exactly once, on the
//! last chunk.

use crc32fast::Hasher;

#[derive(Default)]
pub struct CrcStream {
    hasher: Option<Hasher>,
}

impl CrcStream {
    pub fn new() -> Self {
        Self { hasher: None }
    }

    /// Begins a new entry's checksum.
    pub fn reset(&mut self) {
        self.hasher = Some(Hasher::new());
    }

    /// Folds `bytes` into the running checksum. Panics if called before
    /// `reset()` — a misuse that would otherwise silently checksum nothing.
    pub fn stream(&mut self, bytes: &[u8]) {
        self.hasher
            .as_mut()
            .expect("CrcStream::stream called before reset")
            .update(bytes);
    }

    /// Finalizes and returns the CRC32 for this entry.
    pub fn finalize(&mut self) -> u32 {
        self.hasher
            .take()
            .expect("CrcStream::finalize called before reset")
            .finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_crc32fast_direct() {
        let mut s = CrcStream::new();
        s.reset();
        s.stream(b"k");
        s.stream(b"abcdefg");
        let got = s.finalize();

        let mut h = Hasher::new();
        h.update(b"kabcdefg");
        assert_eq!(got, h.finalize());
    }

    #[test]
    fn reset_clears_prior_entry() {
        let mut s = CrcStream::new();
        s.reset();
        s.stream(b"first");
        let _ = s.finalize();

        s.reset();
        s.stream(b"second");
        let got = s.finalize();

        let mut h = Hasher::new();
        h.update(b"second");
        assert_eq!(got, h.finalize());
    }
}
