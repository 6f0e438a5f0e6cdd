//! In-memory product catalog
//!
//! Holds the last successfully loaded table and answers barcode lookups
//! without touching the network. A reload replaces the table as a whole;
//! a failed reload leaves the previous table in place.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::price::{normalize_price, PriceCell};
use crate::sheets::{RawRow, RowSource};

/// One product as shown to the user
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub name: String,
    pub code: String,
    pub price: PriceCell,
}

impl ProductRecord {
    /// Build a record from a raw row; rows without a code are rejected
    pub fn from_raw(row: RawRow) -> Option<Self> {
        let code = row.code.trim();
        if code.is_empty() {
            return None;
        }
        Some(Self {
            name: row.name.trim().to_string(),
            code: code.to_string(),
            price: row.price,
        })
    }

    /// Price as a plain decimal number
    pub fn price_value(&self) -> f64 {
        normalize_price(&self.price)
    }
}

/// Result of a reload request that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The table was replaced and now holds this many records
    Loaded(usize),
    /// Another reload was still running; nothing was done
    AlreadyInProgress,
}

/// Point-in-time view of the catalog for status displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStatus {
    pub records: usize,
    pub loading: bool,
    pub loaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Table {
    records: Vec<ProductRecord>,
    loaded_at: Option<DateTime<Utc>>,
}

/// Clears the loading flag when the reload finishes or is dropped
struct LoadingGate<'a> {
    flag: &'a AtomicBool,
}

impl<'a> LoadingGate<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for LoadingGate<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Product table shared by the front ends
pub struct ProductCatalog {
    source: Box<dyn RowSource>,
    table: RwLock<Table>,
    loading: AtomicBool,
}

impl ProductCatalog {
    /// Create an empty catalog fed by `source`
    pub fn new(source: impl RowSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            table: RwLock::new(Table::default()),
            loading: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Table> {
        self.table.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Table> {
        self.table
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Load a fresh table from the source and swap it in.
    ///
    /// Only one reload runs at a time; a concurrent call returns
    /// [`ReloadOutcome::AlreadyInProgress`] without contacting the source.
    pub async fn reload(&self) -> Result<ReloadOutcome> {
        let Some(_gate) = LoadingGate::acquire(&self.loading) else {
            log::info!("Catalog reload already in progress, skipping");
            return Ok(ReloadOutcome::AlreadyInProgress);
        };

        match self.source.load().await {
            Ok(rows) => {
                let count = self.replace(rows);
                log::info!("Catalog loaded with {} products", count);
                Ok(ReloadOutcome::Loaded(count))
            }
            Err(e) => {
                log::warn!(
                    "Catalog reload failed, keeping {} existing products: {}",
                    self.len(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Replace the whole table with `rows`, discarding rows without a code.
    ///
    /// Returns the number of records now held.
    pub fn replace(&self, rows: Vec<RawRow>) -> usize {
        let total = rows.len();
        let records: Vec<ProductRecord> =
            rows.into_iter().filter_map(ProductRecord::from_raw).collect();
        let count = records.len();
        if count < total {
            log::debug!("Discarded {} rows with empty code", total - count);
        }

        let mut table = self.write();
        table.records = records;
        table.loaded_at = Some(Utc::now());
        count
    }

    /// Find the product for a scanned or typed code.
    ///
    /// An exact match on the trimmed code wins. Failing that, an all-digit
    /// query matches a stored code with the same numeric value, so leading
    /// zeros on either side do not matter. First match in sheet order wins.
    pub fn lookup(&self, query: &str) -> Option<ProductRecord> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }

        let table = self.read();
        let exact = table.records.iter().find(|r| r.code == query);
        let found = exact.or_else(|| {
            if !is_all_digits(query) {
                return None;
            }
            let wanted = query.parse::<f64>().ok()?;
            table
                .records
                .iter()
                .find(|r| numeric_code(&r.code) == Some(wanted))
        });

        match found {
            Some(record) => {
                log::debug!("Lookup {:?} matched {:?}", query, record.code);
                Some(record.clone())
            }
            None => {
                log::debug!("Lookup {:?} found nothing", query);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().records.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Time of the last successful load, if any
    pub fn last_loaded_at(&self) -> Option<DateTime<Utc>> {
        self.read().loaded_at
    }

    pub fn status(&self) -> CatalogStatus {
        let table = self.read();
        CatalogStatus {
            records: table.records.len(),
            loading: self.is_loading(),
            loaded_at: table.loaded_at,
        }
    }

    /// Copy of all records in sheet order
    pub fn records(&self) -> Vec<ProductRecord> {
        self.read().records.clone()
    }
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Numeric value of a stored code written as plain decimal text
fn numeric_code(code: &str) -> Option<f64> {
    let plain = code
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'));
    if !plain {
        return None;
    }
    code.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
#[path = "catalog_tests.rs"]
mod tests;
