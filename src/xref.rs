//! Cross-reference layer (spec.md §4.C).

use std::collections::BTreeMap;

/// One entry in the cross-reference map, keyed by object number elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    /// On the free list. `next_generation` is the generation a future reallocation of
    /// this object number should use, per the classic xref table's free-list field.
    Free { next_generation: u16 },
    /// In-use at the given byte offset with the given generation.
    Normal { offset: u32, generation: u16 },
    /// Packed inside object stream `container`, at zero-based index `index`.
    Compressed { container: u32, index: u16 },
    /// Entry 0 in a table that has never been written (malformed producer); treated
    /// like `Free` but never reports a "next generation" hint.
    UnusableFree,
}

/// The flattened `object number -> entry` map assembled by walking the xref chain.
///
/// Sections are merged in *first-walked-wins* order (spec.md §9 "xref precedence"
/// open question): the primary xref (latest revision) is merged in first, and
/// `merge` only ever fills gaps, so earlier (closer to EOF) updates always win over
/// older `/Prev` sections for a repeated object number.
#[derive(Debug, Clone, Default)]
pub struct Xref {
    pub entries: BTreeMap<u32, XrefEntry>,
    pub size: u32,
}

impl Xref {
    pub fn new(size: u32) -> Xref {
        Xref {
            entries: BTreeMap::new(),
            size,
        }
    }

    pub fn get(&self, object_number: u32) -> Option<&XrefEntry> {
        self.entries.get(&object_number)
    }

    pub fn insert(&mut self, object_number: u32, entry: XrefEntry) {
        self.entries.entry(object_number).or_insert(entry);
    }

    /// Merges an earlier (`/Prev`) section into this one. Entries already present in
    /// `self` are untouched: the caller is expected to have parsed sections from the
    /// newest revision toward the oldest, so `self` always represents "what's been
    /// seen so far, newest first".
    pub fn merge(&mut self, older: Xref) {
        for (number, entry) in older.entries {
            self.entries.entry(number).or_insert(entry);
        }
        if older.size > self.size {
            self.size = older.size;
        }
    }

    pub fn max_id(&self) -> u32 {
        self.entries.keys().next_back().copied().unwrap_or(0)
    }
}
