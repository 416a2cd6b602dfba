//! Configuration constants for table construction
//!
//! Sanity limits applied while validating loaded tables. They exist to
//! reject wildly malformed configuration data early, with a clear
//! `InvalidTable` error instead of pathological memory use later.

/// Maximum number of chapters any single book may declare.
///
/// Psalms tops out at 151 in the widest traditions; 200 leaves room for
/// unusual divisions without accepting garbage counts.
pub const MAX_CHAPTERS_PER_BOOK: u32 = 200;

/// Maximum number of verses any single chapter may declare.
///
/// Psalm 119 has 176 verses; 500 is far beyond any real chapter.
pub const MAX_VERSES_PER_CHAPTER: u32 = 500;

/// Maximum number of books one versification system or order may list.
///
/// The full catalogue (including front/back matter divisions) runs to a
/// few hundred entries.
pub const MAX_BOOKS_PER_SYSTEM: usize = 500;

/// Maximum registered name strings per language before the prefix index
/// is considered malformed input rather than a real naming table.
pub const MAX_NAMES_PER_LANGUAGE: usize = 50_000;
