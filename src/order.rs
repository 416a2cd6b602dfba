//! Publication book-order tables
//!
//! A book order is the sequence in which one named publication tradition
//! prints its books. Orders legitimately exclude books, so absence from
//! an order (`Ok(None)`) is an expected outcome, distinct from asking
//! for an order that was never loaded (`UnknownOrderName`).

use crate::config::MAX_BOOKS_PER_SYSTEM;
use crate::error::{EngineError, Result};
use crate::registry::BookRegistry;
use crate::types::BookCode;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Configuration record for one named publication order
#[derive(Debug, Clone, Deserialize)]
pub struct BookOrderRecord {
    /// System name (e.g. a denominational canon)
    pub order: String,
    /// Codes in publication sequence
    pub books: Vec<BookCode>,
}

#[derive(Debug)]
struct OrderEntry {
    sequence: Vec<BookCode>,
    positions: HashMap<BookCode, u32>,
}

/// All loaded publication orders, keyed by system name
#[derive(Debug)]
pub struct BookOrderTable {
    orders: HashMap<String, OrderEntry>,
    names: Vec<String>,
}

impl BookOrderTable {
    /// Build the table from configuration records, checking every code
    /// against the registry.
    ///
    /// # Errors
    /// `InvalidTable` on duplicate order names, a code repeated within
    /// one order, or a code outside the registry's closed set.
    pub fn from_records(registry: &BookRegistry, records: Vec<BookOrderRecord>) -> Result<Self> {
        let mut orders = HashMap::with_capacity(records.len());
        let mut names = Vec::with_capacity(records.len());

        for record in records {
            if record.books.len() > MAX_BOOKS_PER_SYSTEM {
                return Err(EngineError::InvalidTable {
                    table: "book orders".to_string(),
                    detail: format!(
                        "order '{}' lists {} books, over the limit",
                        record.order,
                        record.books.len()
                    ),
                });
            }
            let mut positions = HashMap::with_capacity(record.books.len());
            for (index, code) in record.books.iter().enumerate() {
                if !registry.contains(*code) {
                    return Err(EngineError::InvalidTable {
                        table: "book orders".to_string(),
                        detail: format!("order '{}' lists unknown code {code}", record.order),
                    });
                }
                // Positions are 1-based, matching printed tables of contents
                if positions.insert(*code, index as u32 + 1).is_some() {
                    return Err(EngineError::InvalidTable {
                        table: "book orders".to_string(),
                        detail: format!("order '{}' lists {code} twice", record.order),
                    });
                }
            }
            let entry = OrderEntry {
                sequence: record.books,
                positions,
            };
            if orders.insert(record.order.clone(), entry).is_some() {
                return Err(EngineError::InvalidTable {
                    table: "book orders".to_string(),
                    detail: format!("duplicate order name '{}'", record.order),
                });
            }
            names.push(record.order);
        }
        names.sort();

        debug!(orders = names.len(), "book order table built");
        Ok(Self { orders, names })
    }

    /// Parse order records from YAML text and build the table
    pub fn from_yaml_str(registry: &BookRegistry, yaml: &str) -> Result<Self> {
        let records: Vec<BookOrderRecord> = serde_yaml_ng::from_str(yaml)?;
        Self::from_records(registry, records)
    }

    /// Load order records from a YAML file and build the table
    pub fn from_yaml_file(registry: &BookRegistry, path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(registry, &yaml)
    }

    fn entry(&self, order_name: &str) -> Result<&OrderEntry> {
        self.orders
            .get(order_name)
            .ok_or_else(|| EngineError::UnknownOrderName(order_name.to_string()))
    }

    /// 1-based position of a book within an order.
    ///
    /// `Ok(None)` means the order exists but excludes the book — an
    /// expected outcome, not an error.
    pub fn position_of(&self, order_name: &str, code: BookCode) -> Result<Option<u32>> {
        Ok(self.entry(order_name)?.positions.get(&code).copied())
    }

    /// The full publication sequence for an order
    pub fn sequence(&self, order_name: &str) -> Result<&[BookCode]> {
        Ok(&self.entry(order_name)?.sequence)
    }

    /// Whether the order includes the book
    pub fn contains(&self, order_name: &str, code: BookCode) -> Result<bool> {
        Ok(self.entry(order_name)?.positions.contains_key(&code))
    }

    /// Book at a 1-based position, if the order is that long
    pub fn book_at_position(&self, order_name: &str, position: u32) -> Result<Option<BookCode>> {
        let entry = self.entry(order_name)?;
        if position == 0 {
            return Ok(None);
        }
        Ok(entry.sequence.get(position as usize - 1).copied())
    }

    /// Book printed immediately after the given one, if any
    pub fn next_book(&self, order_name: &str, code: BookCode) -> Result<Option<BookCode>> {
        let entry = self.entry(order_name)?;
        match entry.positions.get(&code) {
            Some(position) => Ok(entry.sequence.get(*position as usize).copied()),
            None => Ok(None),
        }
    }

    /// Names of all loaded orders, sorted
    pub fn order_names(&self) -> &[String] {
        &self.names
    }
}
