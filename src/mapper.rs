//! Cross-system reference mapping
//!
//! Translates a canonical reference valid under one versification
//! system into the equivalent reference(s) under another. One source
//! verse can correspond to zero, one, or several target verses when
//! combined or reordered verses are involved, so mapping returns a
//! sequence.
//!
//! Mapping works through 1-based content positions within a chapter:
//! a printed verse number is converted to its sequential position in
//! the source system (counting past omitted gaps, consulting explicit
//! position lookups for reordered verses, expanding combined ranges),
//! then each position is converted back to a printed number in the
//! target system by the inverse steps.

use crate::error::{EngineError, Result};
use crate::types::CanonicalReference;
use crate::versification::{ChapterShape, VersificationTable};
use std::sync::Arc;
use tracing::warn;

/// Maps canonical references between versification systems.
///
/// Holds a shared handle on the versification table; construction is
/// cheap and the mapper is freely shareable across threads.
pub struct ReferenceMapper {
    table: Arc<VersificationTable>,
}

impl ReferenceMapper {
    /// Create a mapper over a shared versification table
    pub fn new(table: Arc<VersificationTable>) -> Self {
        Self { table }
    }

    /// The underlying versification table
    pub fn table(&self) -> &VersificationTable {
        &self.table
    }

    /// Map a reference into another versification system.
    ///
    /// Chapter 0 and verse 0 denote introduction material and pass
    /// through unchanged, never subject to offset arithmetic.
    ///
    /// # Errors
    /// * `UnknownSystem` if either system name is not loaded.
    /// * `InvalidSourceReference` if the reference is not valid under
    ///   its own declared system; no partial computation is performed.
    /// * `MappingInconsistency` if a computed result fails target-side
    ///   validation, which indicates inconsistent configuration data.
    pub fn map(
        &self,
        reference: &CanonicalReference,
        to_system: &str,
    ) -> Result<Vec<CanonicalReference>> {
        if !self.table.is_valid_system_name(to_system) {
            return Err(EngineError::UnknownSystem(to_system.to_string()));
        }

        // Introduction material: retag only
        if reference.chapter == 0 || reference.verse == 0 {
            return Ok(vec![reference.retagged(to_system)]);
        }

        let invalid_source = || EngineError::InvalidSourceReference {
            system: reference.system.clone(),
            book: reference.book.to_string(),
            chapter: reference.chapter,
            verse: reference.verse,
        };

        let source = match self
            .table
            .shape(&reference.system, reference.book, reference.chapter)
        {
            Ok(shape) => shape,
            Err(EngineError::UnknownSystem(name)) => {
                return Err(EngineError::UnknownSystem(name));
            }
            Err(_) => return Err(invalid_source()),
        };
        if !source.is_valid_verse(reference.verse) {
            return Err(invalid_source());
        }

        let inconsistency = |detail: String| {
            warn!(
                reference = %reference,
                target = to_system,
                detail = %detail,
                "mapping inconsistency"
            );
            EngineError::MappingInconsistency {
                target: to_system.to_string(),
                book: reference.book.to_string(),
                chapter: reference.chapter,
                verse: reference.verse,
                detail,
            }
        };

        let target = self
            .table
            .shape(to_system, reference.book, reference.chapter)
            .map_err(|err| inconsistency(err.to_string()))?;

        // Common case: both systems shape the chapter identically
        if source.same_irregularities(target) {
            let mapped = reference.retagged(to_system);
            if !target.is_valid_verse(mapped.verse) {
                return Err(inconsistency(format!(
                    "identity-mapped verse {} out of target range",
                    mapped.verse
                )));
            }
            return Ok(vec![mapped]);
        }

        let mut printed = Vec::new();
        for position in source_positions(source, reference.verse) {
            let number = target_printed(target, position)
                .ok_or_else(|| inconsistency(format!("no target verse at position {position}")))?;
            if printed.last() != Some(&number) {
                printed.push(number);
            }
        }

        let mut mapped = Vec::with_capacity(printed.len());
        for number in printed {
            if !target.is_valid_verse(number) {
                return Err(inconsistency(format!(
                    "computed verse {number} is not valid in target"
                )));
            }
            mapped.push(CanonicalReference::new(
                reference.book,
                reference.chapter,
                number,
                to_system,
            ));
        }
        Ok(mapped)
    }
}

/// Content positions a printed source verse occupies.
///
/// A reordered printed number takes its position from the explicit
/// lookup (reordering is not monotonic, arithmetic offsets do not
/// apply); a combined head expands to the whole range's positions; a
/// plain number shifts down by the omitted verses printed before it.
fn source_positions(shape: &ChapterShape, verse: u32) -> Vec<u32> {
    let span = shape
        .combined_at(verse)
        .map(|c| c.through - c.verse)
        .unwrap_or(0);
    let base = match shape.reordered_position_of(verse) {
        Some(position) => position,
        None => verse - shape.omitted_before(verse),
    };
    (base..=base + span).collect()
}

/// Printed number occupying a content position in the target system,
/// if the shape can express it
fn target_printed(shape: &ChapterShape, position: u32) -> Option<u32> {
    if position == 0 {
        return None;
    }
    if let Some(printed) = shape.reordered_printed_at(position) {
        return Some(printed);
    }

    // Invert position = printed - omitted_before(printed), skipping
    // omitted numbers; bounded by the size of the omitted set
    let mut printed = position;
    for _ in 0..=shape.omitted().len() {
        let mut next = position + shape.omitted_before(printed);
        while shape.is_omitted(next) {
            next += 1;
        }
        if next == printed {
            // A range the target also combines collapses to its head
            if let Some(combined) = shape.combined_containing(printed) {
                return Some(combined.verse);
            }
            return Some(printed);
        }
        printed = next;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{BookRecord, BookRegistry};
    use crate::types::{BookCode, Testament};

    fn registry() -> BookRegistry {
        let records = ["GEN", "JHN", "RO3"]
            .iter()
            .enumerate()
            .map(|(index, code)| BookRecord {
                code: (*code).to_string(),
                serial: index as u32 + 1,
                testament: Testament::Old,
                single_chapter: false,
                osis: None,
                usfm_number: None,
            })
            .collect();
        BookRegistry::from_records(records).unwrap()
    }

    fn code(text: &str) -> BookCode {
        BookCode::parse(text).unwrap()
    }

    fn mapper() -> ReferenceMapper {
        let registry = registry();
        let yaml = r#"
- system: A
  books:
    - book: GEN
      chapters:
        - verses: 31
        - verses: 25
    - book: JHN
      chapters:
        - verses: 25
          omitted: [4]
        - verses: 30
          combined: [{ verse: 11, through: 13 }]
        - verses: 30
          reordered: [{ printed: 20, position: 22 }, { printed: 21, position: 20 }, { printed: 22, position: 21 }]
- system: B
  books:
    - book: GEN
      chapters:
        - verses: 31
        - verses: 25
    - book: JHN
      chapters:
        - verses: 25
        - verses: 30
        - verses: 30
"#;
        let table = VersificationTable::from_yaml_str(&registry, yaml).unwrap();
        ReferenceMapper::new(Arc::new(table))
    }

    fn reference(book: &str, chapter: u32, verse: u32, system: &str) -> CanonicalReference {
        CanonicalReference::new(code(book), chapter, verse, system)
    }

    // -------------------------------------------------------------------------
    // Identity and passthrough
    // -------------------------------------------------------------------------

    #[test]
    fn test_identity_mapping_for_regular_chapter() {
        let mapper = mapper();
        let mapped = mapper.map(&reference("GEN", 1, 31, "A"), "B").unwrap();
        assert_eq!(mapped, vec![reference("GEN", 1, 31, "B")]);
    }

    #[test]
    fn test_round_trip_is_identity_without_irregularities() {
        let mapper = mapper();
        let original = reference("GEN", 2, 7, "A");
        let there = mapper.map(&original, "B").unwrap();
        assert_eq!(there.len(), 1);
        let back = mapper.map(&there[0], "A").unwrap();
        assert_eq!(back, vec![original]);
    }

    #[test]
    fn test_intro_material_passes_through() {
        let mapper = mapper();
        let mapped = mapper.map(&reference("JHN", 0, 0, "A"), "B").unwrap();
        assert_eq!(mapped, vec![reference("JHN", 0, 0, "B")]);

        let mapped = mapper.map(&reference("JHN", 1, 0, "A"), "B").unwrap();
        assert_eq!(mapped, vec![reference("JHN", 1, 0, "B")]);
    }

    // -------------------------------------------------------------------------
    // Omitted verses
    // -------------------------------------------------------------------------

    #[test]
    fn test_omitted_in_source_shifts_later_verses() {
        let mapper = mapper();
        // A omits JHN 1:4; its printed 5 is content position 4
        let mapped = mapper.map(&reference("JHN", 1, 5, "A"), "B").unwrap();
        assert_eq!(mapped, vec![reference("JHN", 1, 4, "B")]);
    }

    #[test]
    fn test_omitted_in_target_shifts_the_other_way() {
        let mapper = mapper();
        let mapped = mapper.map(&reference("JHN", 1, 4, "B"), "A").unwrap();
        assert_eq!(mapped, vec![reference("JHN", 1, 5, "A")]);
    }

    #[test]
    fn test_verses_before_an_omission_are_unchanged() {
        let mapper = mapper();
        let mapped = mapper.map(&reference("JHN", 1, 3, "A"), "B").unwrap();
        assert_eq!(mapped, vec![reference("JHN", 1, 3, "B")]);
    }

    #[test]
    fn test_mapping_an_omitted_verse_is_invalid_source() {
        let mapper = mapper();
        let err = mapper.map(&reference("JHN", 1, 4, "A"), "B").unwrap_err();
        assert!(matches!(err, EngineError::InvalidSourceReference { .. }));
    }

    // -------------------------------------------------------------------------
    // Combined verses
    // -------------------------------------------------------------------------

    #[test]
    fn test_combined_head_expands_in_target() {
        let mapper = mapper();
        // A combines JHN 2:11-13 under the printed number 11
        let mapped = mapper.map(&reference("JHN", 2, 11, "A"), "B").unwrap();
        assert_eq!(
            mapped,
            vec![
                reference("JHN", 2, 11, "B"),
                reference("JHN", 2, 12, "B"),
                reference("JHN", 2, 13, "B"),
            ]
        );
    }

    #[test]
    fn test_expanded_verse_collapses_back_to_combined_head() {
        let mapper = mapper();
        for verse in 11..=13 {
            let mapped = mapper.map(&reference("JHN", 2, verse, "B"), "A").unwrap();
            assert_eq!(mapped, vec![reference("JHN", 2, 11, "A")]);
        }
    }

    #[test]
    fn test_verse_after_combined_range_keeps_its_number() {
        let mapper = mapper();
        // Numbering resumes after the collapsed range
        let mapped = mapper.map(&reference("JHN", 2, 14, "A"), "B").unwrap();
        assert_eq!(mapped, vec![reference("JHN", 2, 14, "B")]);
    }

    #[test]
    fn test_mid_range_query_in_combining_system() {
        let mapper = mapper();
        // 12 is valid in A (inside the combined range) and maps alone
        let mapped = mapper.map(&reference("JHN", 2, 12, "A"), "B").unwrap();
        assert_eq!(mapped, vec![reference("JHN", 2, 12, "B")]);
    }

    // -------------------------------------------------------------------------
    // Reordered verses
    // -------------------------------------------------------------------------

    #[test]
    fn test_reordered_source_uses_position_lookup() {
        let mapper = mapper();
        // A prints 20 at position 22, 21 at 20, 22 at 21
        assert_eq!(
            mapper.map(&reference("JHN", 3, 20, "A"), "B").unwrap(),
            vec![reference("JHN", 3, 22, "B")]
        );
        assert_eq!(
            mapper.map(&reference("JHN", 3, 21, "A"), "B").unwrap(),
            vec![reference("JHN", 3, 20, "B")]
        );
    }

    #[test]
    fn test_reordered_target_uses_inverse_lookup() {
        let mapper = mapper();
        assert_eq!(
            mapper.map(&reference("JHN", 3, 22, "B"), "A").unwrap(),
            vec![reference("JHN", 3, 20, "A")]
        );
        assert_eq!(
            mapper.map(&reference("JHN", 3, 20, "B"), "A").unwrap(),
            vec![reference("JHN", 3, 21, "A")]
        );
    }

    #[test]
    fn test_unreordered_neighbours_map_identically() {
        let mapper = mapper();
        assert_eq!(
            mapper.map(&reference("JHN", 3, 19, "A"), "B").unwrap(),
            vec![reference("JHN", 3, 19, "B")]
        );
        assert_eq!(
            mapper.map(&reference("JHN", 3, 23, "A"), "B").unwrap(),
            vec![reference("JHN", 3, 23, "B")]
        );
    }

    // -------------------------------------------------------------------------
    // Errors
    // -------------------------------------------------------------------------

    #[test]
    fn test_unknown_target_system() {
        let mapper = mapper();
        let err = mapper.map(&reference("GEN", 1, 1, "A"), "C").unwrap_err();
        assert!(matches!(err, EngineError::UnknownSystem(name) if name == "C"));
    }

    #[test]
    fn test_unknown_source_system() {
        let mapper = mapper();
        let err = mapper.map(&reference("GEN", 1, 1, "C"), "B").unwrap_err();
        assert!(matches!(err, EngineError::UnknownSystem(name) if name == "C"));
    }

    #[test]
    fn test_out_of_range_source_verse() {
        let mapper = mapper();
        let err = mapper.map(&reference("GEN", 1, 99, "A"), "B").unwrap_err();
        assert!(matches!(err, EngineError::InvalidSourceReference { .. }));
    }

    #[test]
    fn test_book_missing_from_source_system() {
        let mapper = mapper();
        let err = mapper.map(&reference("RO3", 1, 1, "A"), "B").unwrap_err();
        assert!(matches!(err, EngineError::InvalidSourceReference { .. }));
    }

    #[test]
    fn test_book_missing_from_target_is_inconsistency() {
        let registry = registry();
        let yaml = r#"
- system: A
  books:
    - book: GEN
      chapters:
        - verses: 31
- system: B
  books:
    - book: JHN
      chapters:
        - verses: 25
"#;
        let table = VersificationTable::from_yaml_str(&registry, yaml).unwrap();
        let mapper = ReferenceMapper::new(Arc::new(table));
        let err = mapper.map(&reference("GEN", 1, 1, "A"), "B").unwrap_err();
        assert!(matches!(err, EngineError::MappingInconsistency { .. }));
    }

    #[test]
    fn test_lossy_reordering_cannot_be_loaded() {
        // A one-sided reordered set would map printed 20 and printed 22
        // onto the same target verse; table construction refuses it
        let registry = registry();
        let yaml = r#"
- system: A
  books:
    - book: GEN
      chapters:
        - verses: 31
          reordered: [{ printed: 20, position: 22 }]
- system: B
  books:
    - book: GEN
      chapters:
        - verses: 31
"#;
        let err = VersificationTable::from_yaml_str(&registry, yaml).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTable { .. }));
    }

    #[test]
    fn test_target_too_short_is_inconsistency() {
        let registry = registry();
        let yaml = r#"
- system: A
  books:
    - book: GEN
      chapters:
        - verses: 31
- system: B
  books:
    - book: GEN
      chapters:
        - verses: 25
          omitted: [1]
"#;
        let table = VersificationTable::from_yaml_str(&registry, yaml).unwrap();
        let mapper = ReferenceMapper::new(Arc::new(table));
        // Position 31 has no printed number within B's 25 verses
        let err = mapper.map(&reference("GEN", 1, 31, "A"), "B").unwrap_err();
        assert!(matches!(err, EngineError::MappingInconsistency { .. }));
    }
}
