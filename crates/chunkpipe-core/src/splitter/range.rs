//! Byte range type and fixed-size chunk planning.

/// A byte range [start, end) (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl ByteRange {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Plans `ceil(total_size / chunk_size)` ranges of `chunk_size` bytes; the last
/// one may be shorter. Returns an empty vec if either argument is 0.
pub fn plan_chunks(total_size: u64, chunk_size: u64) -> Vec<ByteRange> {
    if total_size == 0 || chunk_size == 0 {
        return Vec::new();
    }

    let count = total_size.div_ceil(chunk_size);
    let mut out = Vec::with_capacity(count as usize);
    let mut offset = 0u64;
    while offset < total_size {
        let end = offset.saturating_add(chunk_size).min(total_size);
        out.push(ByteRange { start: offset, end });
        offset = end;
    }
    out
}
