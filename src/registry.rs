//! Canonical book catalogue
//!
//! The registry is the closed set of book identities every other table
//! is checked against. It is built once from configuration records and
//! immutable thereafter.
//!
//! # Example
//!
//! ```ignore
//! use bibleref_engine::BookRegistry;
//!
//! let registry = BookRegistry::from_yaml_str(books_yaml)?;
//! let meta = registry.lookup("GEN")?;
//! assert_eq!(meta.serial, 1);
//! ```

use crate::config::MAX_BOOKS_PER_SYSTEM;
use crate::error::{EngineError, Result};
use crate::types::{BookCode, Testament};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One configuration record for the book catalogue
#[derive(Debug, Clone, Deserialize)]
pub struct BookRecord {
    /// 3-character reference code (e.g. "GEN")
    pub code: String,
    /// Internal serial number; defines registry iteration order
    pub serial: u32,
    /// Testament / canon area
    pub testament: Testament,
    /// True for books printed without chapter numbers (e.g. Jude)
    #[serde(default)]
    pub single_chapter: bool,
    /// OSIS abbreviation, when one is assigned
    #[serde(default)]
    pub osis: Option<String>,
    /// USFM print-ordinal number (two characters, e.g. "01")
    #[serde(default)]
    pub usfm_number: Option<String>,
}

/// Metadata held for one book in the closed catalogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookMetadata {
    /// Validated book code
    pub code: BookCode,
    /// Internal serial number
    pub serial: u32,
    /// Testament / canon area
    pub testament: Testament,
    /// True for single-chapter books
    pub single_chapter: bool,
    /// OSIS abbreviation, when assigned
    pub osis: Option<String>,
    /// USFM print-ordinal number, when assigned
    pub usfm_number: Option<String>,
}

/// Closed catalogue of book identities, keyed by code and serial.
///
/// All lookups are O(1); `all()` iterates in serial order, which is the
/// registry's own order, not any publication order.
#[derive(Debug)]
pub struct BookRegistry {
    by_code: HashMap<BookCode, BookMetadata>,
    by_serial: HashMap<u32, BookCode>,
    by_osis: HashMap<String, BookCode>,
    ordered: Vec<BookCode>,
}

impl BookRegistry {
    /// Build the registry from configuration records.
    ///
    /// # Errors
    /// `InvalidTable` on duplicate codes, duplicate serials, duplicate
    /// OSIS abbreviations, or an oversized catalogue.
    pub fn from_records(records: Vec<BookRecord>) -> Result<Self> {
        if records.len() > MAX_BOOKS_PER_SYSTEM {
            return Err(EngineError::InvalidTable {
                table: "books".to_string(),
                detail: format!("{} records exceeds catalogue limit", records.len()),
            });
        }

        let mut by_code = HashMap::with_capacity(records.len());
        let mut by_serial = HashMap::with_capacity(records.len());
        let mut by_osis = HashMap::new();

        for record in records {
            let code = BookCode::parse(&record.code)?;
            if record.serial == 0 {
                return Err(EngineError::InvalidTable {
                    table: "books".to_string(),
                    detail: format!("{code} has serial 0; serials start at 1"),
                });
            }
            if let Some(previous) = by_serial.insert(record.serial, code) {
                return Err(EngineError::InvalidTable {
                    table: "books".to_string(),
                    detail: format!(
                        "serial {} assigned to both {previous} and {code}",
                        record.serial
                    ),
                });
            }
            if let Some(osis) = &record.osis {
                if let Some(previous) = by_osis.insert(osis.clone(), code) {
                    return Err(EngineError::InvalidTable {
                        table: "books".to_string(),
                        detail: format!(
                            "OSIS abbreviation '{osis}' assigned to both {previous} and {code}"
                        ),
                    });
                }
            }
            let metadata = BookMetadata {
                code,
                serial: record.serial,
                testament: record.testament,
                single_chapter: record.single_chapter,
                osis: record.osis,
                usfm_number: record.usfm_number,
            };
            if by_code.insert(code, metadata).is_some() {
                return Err(EngineError::InvalidTable {
                    table: "books".to_string(),
                    detail: format!("duplicate book code {code}"),
                });
            }
        }

        let mut ordered: Vec<BookCode> = by_code.keys().copied().collect();
        ordered.sort_by_key(|code| by_code[code].serial);

        debug!(books = ordered.len(), "book registry built");
        Ok(Self {
            by_code,
            by_serial,
            by_osis,
            ordered,
        })
    }

    /// Parse registry records from YAML text and build the registry
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let records: Vec<BookRecord> = serde_yaml_ng::from_str(yaml)?;
        Self::from_records(records)
    }

    /// Load registry records from a YAML file and build the registry
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Look up metadata for a raw code string.
    ///
    /// # Errors
    /// `UnknownBookCode` for any code outside the closed set. This is
    /// always caller error, never retried.
    pub fn lookup(&self, code_text: &str) -> Result<&BookMetadata> {
        let code = BookCode::parse(code_text)?;
        self.get(code)
    }

    /// Look up metadata for an already-validated code
    pub fn get(&self, code: BookCode) -> Result<&BookMetadata> {
        self.by_code
            .get(&code)
            .ok_or_else(|| EngineError::UnknownBookCode(code.to_string()))
    }

    /// Whether the code belongs to the closed set
    pub fn contains(&self, code: BookCode) -> bool {
        self.by_code.contains_key(&code)
    }

    /// All codes, ordered by internal serial number
    pub fn all(&self) -> &[BookCode] {
        &self.ordered
    }

    /// Code for an internal serial number, if assigned
    pub fn from_serial(&self, serial: u32) -> Option<BookCode> {
        self.by_serial.get(&serial).copied()
    }

    /// Code for an OSIS abbreviation, if assigned
    pub fn from_osis(&self, osis: &str) -> Option<BookCode> {
        self.by_osis.get(osis).copied()
    }

    /// Codes of all single-chapter books, in serial order
    pub fn single_chapter_books(&self) -> Vec<BookCode> {
        self.ordered
            .iter()
            .copied()
            .filter(|code| self.by_code[code].single_chapter)
            .collect()
    }

    /// Number of books in the catalogue
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether the catalogue is empty
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<BookRecord> {
        vec![
            BookRecord {
                code: "GEN".to_string(),
                serial: 1,
                testament: Testament::Old,
                single_chapter: false,
                osis: Some("Gen".to_string()),
                usfm_number: Some("01".to_string()),
            },
            BookRecord {
                code: "JDE".to_string(),
                serial: 65,
                testament: Testament::New,
                single_chapter: true,
                osis: Some("Jude".to_string()),
                usfm_number: Some("65".to_string()),
            },
        ]
    }

    #[test]
    fn test_lookup_known_code() {
        let registry = BookRegistry::from_records(sample_records()).unwrap();
        let meta = registry.lookup("GEN").unwrap();
        assert_eq!(meta.serial, 1);
        assert_eq!(meta.testament, Testament::Old);
        assert!(!meta.single_chapter);
    }

    #[test]
    fn test_lookup_unknown_code() {
        let registry = BookRegistry::from_records(sample_records()).unwrap();
        let err = registry.lookup("XYZ").unwrap_err();
        assert!(matches!(err, EngineError::UnknownBookCode(code) if code == "XYZ"));
    }

    #[test]
    fn test_lookup_malformed_code() {
        let registry = BookRegistry::from_records(sample_records()).unwrap();
        assert!(registry.lookup("Genesis").is_err());
        assert!(registry.lookup("").is_err());
    }

    #[test]
    fn test_all_ordered_by_serial() {
        let mut records = sample_records();
        records.reverse(); // Load order must not matter
        let registry = BookRegistry::from_records(records).unwrap();
        let codes: Vec<&str> = registry.all().iter().map(|c| c.as_str()).collect();
        assert_eq!(codes, vec!["GEN", "JDE"]);
    }

    #[test]
    fn test_from_serial_and_osis() {
        let registry = BookRegistry::from_records(sample_records()).unwrap();
        assert_eq!(registry.from_serial(65).map(|c| c.to_string()), Some("JDE".to_string()));
        assert_eq!(registry.from_serial(99), None);
        assert_eq!(registry.from_osis("Gen").map(|c| c.to_string()), Some("GEN".to_string()));
        assert_eq!(registry.from_osis("Genesis"), None);
    }

    #[test]
    fn test_single_chapter_books() {
        let registry = BookRegistry::from_records(sample_records()).unwrap();
        let books = registry.single_chapter_books();
        let singles: Vec<&str> = books.iter().map(|c| c.as_str()).collect();
        assert_eq!(singles, vec!["JDE"]);
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let mut records = sample_records();
        records.push(BookRecord {
            code: "GEN".to_string(),
            serial: 2,
            testament: Testament::Old,
            single_chapter: false,
            osis: None,
            usfm_number: None,
        });
        let err = BookRegistry::from_records(records).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTable { .. }));
    }

    #[test]
    fn test_duplicate_serial_rejected() {
        let mut records = sample_records();
        records[1].serial = 1;
        let err = BookRegistry::from_records(records).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTable { .. }));
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = r#"
- code: GEN
  serial: 1
  testament: old
  osis: Gen
- code: MAT
  serial: 40
  testament: new
"#;
        let registry = BookRegistry::from_yaml_str(yaml).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.lookup("MAT").unwrap().testament, Testament::New);
    }
}
