//! Resource limits enforced across the reader core (spec.md §5).

/// Configurable resource ceilings. Exceeding any of these yields
/// [`crate::error::LimitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size, in bytes, a single stream may expand to after filter decoding.
    pub max_decompressed_size: usize,
    /// Maximum depth of indirect-reference resolution (`Document::resolve`).
    pub max_recursion_depth: u32,
    /// Maximum depth of `/Kids` nesting walked while locating a page.
    pub max_page_tree_depth: u32,
}

impl Default for Limits {
    fn default() -> Limits {
        Limits {
            max_decompressed_size: 256 * 1024 * 1024,
            max_recursion_depth: 256,
            max_page_tree_depth: 32,
        }
    }
}
