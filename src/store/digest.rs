//! Content digest
//!
//! Running CRC32 over (table, key, value) triples, fed in table-name then key
//! order. Every field is length-prefixed so that `("ab", "c")` and
//! `("a", "bc")` hash differently.

/// Accumulates a CRC32 over table contents
pub(crate) struct Digest {
    hasher: crc32fast::Hasher,
    entries: u64,
}

impl Digest {
    pub(crate) fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
            entries: 0,
        }
    }

    /// Mark the start of a table's entries
    pub(crate) fn table(&mut self, name: &str) {
        self.field(name.as_bytes());
    }

    pub(crate) fn entry(&mut self, key: &[u8], value: &[u8]) {
        self.field(key);
        self.field(value);
        self.entries += 1;
    }

    /// Number of entries fed so far
    pub(crate) fn entries(&self) -> u64 {
        self.entries
    }

    pub(crate) fn finish(self) -> u32 {
        self.hasher.finalize()
    }

    fn field(&mut self, bytes: &[u8]) {
        self.hasher.update(&(bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }
}
