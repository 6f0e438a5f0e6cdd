//! EAN Lookup - barcode price lookup backed by a Google Sheet
//!
//! Loads the product table (name, EAN, sale price) from a spreadsheet, keeps
//! it in memory and answers lookups for scanned or typed codes.

pub mod catalog;
pub mod config;
pub mod error;
pub mod price;
pub mod repl;
pub mod scanner;
pub mod sheets;
pub mod web;

pub use catalog::{CatalogStatus, ProductCatalog, ProductRecord, ReloadOutcome};
pub use config::SheetConfig;
pub use error::{LoadError, Result, ScannerError};
pub use price::{format_price, normalize_price, PriceCell, PriceFormat};
pub use scanner::{BarcodeScanner, FacingMode, LineScanner, Torch};
pub use sheets::{RawRow, RowSource, SheetLoader};
