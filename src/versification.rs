//! Versification system tables
//!
//! A versification system names how many chapters and verses each book
//! has, together with the historical irregularities that make systems
//! differ: omitted verses (numbers that do not exist in this system),
//! combined verses (one printed number covering a textual range), and
//! reordered verses (printed number and sequential position differ).
//!
//! # Example
//!
//! ```ignore
//! use bibleref_engine::VersificationTable;
//!
//! let table = VersificationTable::from_yaml_str(&registry, systems_yaml)?;
//! assert_eq!(table.chapter_count("KJV", gen)?, 50);
//! assert!(table.is_valid_verse("KJV", gen, 1, 31)?);
//! ```

use crate::config::{MAX_BOOKS_PER_SYSTEM, MAX_CHAPTERS_PER_BOOK, MAX_VERSES_PER_CHAPTER};
use crate::error::{EngineError, Result};
use crate::registry::BookRegistry;
use crate::types::BookCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One printed verse number covering a collapsed textual range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CombinedVerse {
    /// Printed number of the combined unit (the low end of the range)
    pub verse: u32,
    /// Last verse number the unit covers (inclusive)
    pub through: u32,
}

/// A verse whose sequential position differs from its printed number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ReorderedVerse {
    /// Printed verse number
    pub printed: u32,
    /// 1-based sequential content position within the chapter
    pub position: u32,
}

/// Configuration record for one chapter's shape
#[derive(Debug, Clone, Deserialize)]
pub struct ChapterRecord {
    /// Number of verses in the chapter
    pub verses: u32,
    /// Verse numbers that do not exist in this system
    #[serde(default)]
    pub omitted: Vec<u32>,
    /// Combined verse ranges
    #[serde(default)]
    pub combined: Vec<CombinedVerse>,
    /// Reordered verses
    #[serde(default)]
    pub reordered: Vec<ReorderedVerse>,
}

/// Configuration record for one book under one system
#[derive(Debug, Clone, Deserialize)]
pub struct BookShapeRecord {
    /// Book code
    pub book: BookCode,
    /// Chapters 1..=N in order
    pub chapters: Vec<ChapterRecord>,
}

/// Configuration record for one whole versification system
#[derive(Debug, Clone, Deserialize)]
pub struct VersificationSystemRecord {
    /// System name (e.g. "KJV", "Vulgate", "Original")
    pub system: String,
    /// Per-book shapes
    pub books: Vec<BookShapeRecord>,
}

/// Validated shape of one chapter under one system.
///
/// Irregularity vectors are kept sorted so the mapper can compare and
/// count them without re-sorting per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterShape {
    verse_count: u32,
    omitted: Vec<u32>,
    combined: Vec<CombinedVerse>,
    reordered: Vec<ReorderedVerse>,
}

impl ChapterShape {
    /// Number of verses in the chapter
    pub fn verse_count(&self) -> u32 {
        self.verse_count
    }

    /// Omitted verse numbers, sorted
    pub fn omitted(&self) -> &[u32] {
        &self.omitted
    }

    /// Combined ranges, sorted by printed number
    pub fn combined(&self) -> &[CombinedVerse] {
        &self.combined
    }

    /// Reordered verses, sorted by printed number
    pub fn reordered(&self) -> &[ReorderedVerse] {
        &self.reordered
    }

    /// Whether the printed number is omitted in this system
    pub fn is_omitted(&self, verse: u32) -> bool {
        self.omitted.binary_search(&verse).is_ok()
    }

    /// Count of omitted verses strictly below the given number
    pub fn omitted_before(&self, verse: u32) -> u32 {
        self.omitted.partition_point(|&v| v < verse) as u32
    }

    /// The combined range printed under exactly this number, if any
    pub fn combined_at(&self, verse: u32) -> Option<CombinedVerse> {
        self.combined
            .binary_search_by_key(&verse, |c| c.verse)
            .ok()
            .map(|index| self.combined[index])
    }

    /// The combined range whose span contains this number, if any
    pub fn combined_containing(&self, verse: u32) -> Option<CombinedVerse> {
        self.combined
            .iter()
            .copied()
            .find(|c| c.verse <= verse && verse <= c.through)
    }

    /// Content position for a reordered printed number, if listed
    pub fn reordered_position_of(&self, printed: u32) -> Option<u32> {
        self.reordered
            .binary_search_by_key(&printed, |r| r.printed)
            .ok()
            .map(|index| self.reordered[index].position)
    }

    /// Printed number occupying a content position, if reordering
    /// claims that position
    pub fn reordered_printed_at(&self, position: u32) -> Option<u32> {
        self.reordered
            .iter()
            .find(|r| r.position == position)
            .map(|r| r.printed)
    }

    /// Whether the two shapes carry identical irregularity sets.
    ///
    /// The common case across systems; when true, mapping within the
    /// chapter is the identity.
    pub fn same_irregularities(&self, other: &ChapterShape) -> bool {
        self.omitted == other.omitted
            && self.combined == other.combined
            && self.reordered == other.reordered
    }

    /// Whether any irregularity is annotated on this chapter
    pub fn is_regular(&self) -> bool {
        self.omitted.is_empty() && self.combined.is_empty() && self.reordered.is_empty()
    }

    /// Whether a printed verse number can be queried under this shape:
    /// within `1..=verse_count` and not omitted. Combined and reordered
    /// annotations always lie within that range. Verse 0 is
    /// chapter-introduction material and always valid.
    pub fn is_valid_verse(&self, verse: u32) -> bool {
        if verse == 0 {
            return true;
        }
        !self.is_omitted(verse) && verse <= self.verse_count
    }
}

#[derive(Debug)]
struct BookShape {
    chapters: Vec<ChapterShape>,
}

#[derive(Debug)]
struct SystemEntry {
    books: HashMap<BookCode, BookShape>,
}

/// All loaded versification systems, keyed by system name.
///
/// Built once from configuration, immutable afterwards; shared by every
/// reference-mapping operation for a system.
#[derive(Debug)]
pub struct VersificationTable {
    systems: HashMap<String, SystemEntry>,
    names: Vec<String>,
}

impl VersificationTable {
    /// Build the table from configuration records, checking every code
    /// against the registry.
    ///
    /// # Errors
    /// `InvalidTable` for duplicate system names or books, chapters with
    /// zero or oversized verse counts, and irregularity annotations that
    /// point outside their chapter.
    pub fn from_records(
        registry: &BookRegistry,
        records: Vec<VersificationSystemRecord>,
    ) -> Result<Self> {
        let mut systems = HashMap::with_capacity(records.len());
        let mut names = Vec::with_capacity(records.len());

        for record in records {
            let entry = Self::build_system(registry, &record)?;
            if systems.insert(record.system.clone(), entry).is_some() {
                return Err(EngineError::InvalidTable {
                    table: "versification".to_string(),
                    detail: format!("duplicate system name '{}'", record.system),
                });
            }
            names.push(record.system);
        }
        names.sort();

        debug!(systems = names.len(), "versification table built");
        Ok(Self { systems, names })
    }

    /// Parse system records from YAML text and build the table
    pub fn from_yaml_str(registry: &BookRegistry, yaml: &str) -> Result<Self> {
        let records: Vec<VersificationSystemRecord> = serde_yaml_ng::from_str(yaml)?;
        Self::from_records(registry, records)
    }

    /// Load system records from a YAML file and build the table
    pub fn from_yaml_file(registry: &BookRegistry, path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(registry, &yaml)
    }

    fn build_system(
        registry: &BookRegistry,
        record: &VersificationSystemRecord,
    ) -> Result<SystemEntry> {
        let invalid = |detail: String| EngineError::InvalidTable {
            table: "versification".to_string(),
            detail: format!("system '{}': {detail}", record.system),
        };

        if record.books.len() > MAX_BOOKS_PER_SYSTEM {
            return Err(invalid(format!("{} books over limit", record.books.len())));
        }

        let mut books = HashMap::with_capacity(record.books.len());
        for book_record in &record.books {
            let code = book_record.book;
            if !registry.contains(code) {
                return Err(invalid(format!("unknown code {code}")));
            }
            if book_record.chapters.is_empty() {
                return Err(invalid(format!("{code} has no chapters")));
            }
            if book_record.chapters.len() as u32 > MAX_CHAPTERS_PER_BOOK {
                return Err(invalid(format!("{code} chapter count over limit")));
            }

            let mut chapters = Vec::with_capacity(book_record.chapters.len());
            for (index, chapter) in book_record.chapters.iter().enumerate() {
                let shape = Self::build_chapter(chapter).map_err(|detail| {
                    invalid(format!("{code} chapter {}: {detail}", index + 1))
                })?;
                chapters.push(shape);
            }
            if books.insert(code, BookShape { chapters }).is_some() {
                return Err(invalid(format!("{code} listed twice")));
            }
        }
        Ok(SystemEntry { books })
    }

    fn build_chapter(record: &ChapterRecord) -> std::result::Result<ChapterShape, String> {
        if record.verses == 0 {
            return Err("verse count is 0".to_string());
        }
        if record.verses > MAX_VERSES_PER_CHAPTER {
            return Err(format!("verse count {} over limit", record.verses));
        }

        let mut omitted = record.omitted.clone();
        omitted.sort_unstable();
        omitted.dedup();
        if omitted.len() != record.omitted.len() {
            return Err("duplicate omitted verse numbers".to_string());
        }
        for &verse in &omitted {
            if verse == 0 || verse > record.verses {
                return Err(format!("omitted verse {verse} outside 1..={}", record.verses));
            }
        }

        let mut combined = record.combined.clone();
        combined.sort_unstable_by_key(|c| c.verse);
        for pair in combined.windows(2) {
            if pair[1].verse <= pair[0].through {
                return Err(format!(
                    "combined ranges {}-{} and {}-{} overlap",
                    pair[0].verse, pair[0].through, pair[1].verse, pair[1].through
                ));
            }
        }
        for c in &combined {
            if c.verse == 0 || c.through <= c.verse {
                return Err(format!("combined range {}-{} is not a range", c.verse, c.through));
            }
            if c.through > record.verses {
                return Err(format!(
                    "combined range end {} outside 1..={}",
                    c.through, record.verses
                ));
            }
            for &verse in &omitted {
                if c.verse <= verse && verse <= c.through {
                    return Err(format!(
                        "verse {verse} both omitted and inside combined range {}-{}",
                        c.verse, c.through
                    ));
                }
            }
        }

        let mut reordered = record.reordered.clone();
        reordered.sort_unstable_by_key(|r| r.printed);
        for pair in reordered.windows(2) {
            if pair[1].printed == pair[0].printed {
                return Err(format!("printed verse {} reordered twice", pair[0].printed));
            }
        }
        for r in &reordered {
            if r.printed == 0 || r.position == 0 {
                return Err("reordered entries are 1-based".to_string());
            }
            if r.printed > record.verses || r.position > record.verses {
                return Err(format!(
                    "reordered {}->{} outside 1..={}",
                    r.printed, r.position, record.verses
                ));
            }
        }
        // Reordering must permute its own printed numbers; a one-sided
        // set would let two printed numbers land on one position
        let mut positions: Vec<u32> = reordered.iter().map(|r| r.position).collect();
        positions.sort_unstable();
        let printed: Vec<u32> = reordered.iter().map(|r| r.printed).collect();
        if printed != positions {
            return Err("reordered printed numbers and positions are not the same set".to_string());
        }

        Ok(ChapterShape {
            verse_count: record.verses,
            omitted,
            combined,
            reordered,
        })
    }

    fn system(&self, system_name: &str) -> Result<&SystemEntry> {
        self.systems
            .get(system_name)
            .ok_or_else(|| EngineError::UnknownSystem(system_name.to_string()))
    }

    fn book(&self, system_name: &str, code: BookCode) -> Result<&BookShape> {
        self.system(system_name)?
            .books
            .get(&code)
            .ok_or_else(|| EngineError::UnknownBookInSystem {
                system: system_name.to_string(),
                book: code.to_string(),
            })
    }

    /// Validated shape of one chapter.
    ///
    /// # Errors
    /// `UnknownSystem` / `UnknownBookInSystem` / `UnknownChapter`.
    pub fn shape(&self, system_name: &str, code: BookCode, chapter: u32) -> Result<&ChapterShape> {
        let book = self.book(system_name, code)?;
        if chapter == 0 || chapter as usize > book.chapters.len() {
            return Err(EngineError::UnknownChapter {
                system: system_name.to_string(),
                book: code.to_string(),
                chapter,
            });
        }
        Ok(&book.chapters[chapter as usize - 1])
    }

    /// Number of chapters the book has under the system
    pub fn chapter_count(&self, system_name: &str, code: BookCode) -> Result<u32> {
        Ok(self.book(system_name, code)?.chapters.len() as u32)
    }

    /// Number of verses in the chapter under the system
    pub fn verse_count(&self, system_name: &str, code: BookCode, chapter: u32) -> Result<u32> {
        Ok(self.shape(system_name, code, chapter)?.verse_count)
    }

    /// Whether a verse number can be queried under the system: within
    /// the chapter's range and not omitted. No clamping.
    ///
    /// # Errors
    /// `UnknownSystem` / `UnknownBookInSystem` / `UnknownChapter` for
    /// coordinates the table does not cover at all.
    pub fn is_valid_verse(
        &self,
        system_name: &str,
        code: BookCode,
        chapter: u32,
        verse: u32,
    ) -> Result<bool> {
        Ok(self.shape(system_name, code, chapter)?.is_valid_verse(verse))
    }

    /// Total verses across all chapters of the book
    pub fn total_verse_count(&self, system_name: &str, code: BookCode) -> Result<u32> {
        Ok(self
            .book(system_name, code)?
            .chapters
            .iter()
            .map(|shape| shape.verse_count)
            .sum())
    }

    /// All (chapter, verse) pairs the system omits for the book
    pub fn omitted_verse_list(&self, system_name: &str, code: BookCode) -> Result<Vec<(u32, u32)>> {
        let book = self.book(system_name, code)?;
        let mut list = Vec::new();
        for (index, shape) in book.chapters.iter().enumerate() {
            for &verse in &shape.omitted {
                list.push((index as u32 + 1, verse));
            }
        }
        Ok(list)
    }

    /// Whether the system covers the book at all
    pub fn contains_book(&self, system_name: &str, code: BookCode) -> Result<bool> {
        Ok(self.system(system_name)?.books.contains_key(&code))
    }

    /// Whether the system name is loaded
    pub fn is_valid_system_name(&self, system_name: &str) -> bool {
        self.systems.contains_key(system_name)
    }

    /// Names of all loaded systems, sorted
    pub fn system_names(&self) -> &[String] {
        &self.names
    }
}
