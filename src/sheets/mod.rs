//! Google Sheets product table loader
//!
//! Fetches the gviz query endpoint of the configured spreadsheet and projects
//! its rows into `(name, code, price)` triples.

mod gviz;
mod handler;
mod loader;

use async_trait::async_trait;

use crate::error::Result;
use crate::price::PriceCell;

pub use gviz::{project_rows, unwrap_callback};
pub use handler::{HandlerRegistry, HandlerStats, PendingHandler};
pub use loader::SheetLoader;

/// One projected sheet row: column 0 = name, 1 = code, 2 = sale price
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub name: String,
    pub code: String,
    pub price: PriceCell,
}

/// Anything able to deliver the full product table
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn load(&self) -> Result<Vec<RawRow>>;
}

#[async_trait]
impl RowSource for SheetLoader {
    async fn load(&self) -> Result<Vec<RawRow>> {
        SheetLoader::load(self).await
    }
}
