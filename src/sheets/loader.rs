//! Async product sheet loader

use super::gviz::project_rows;
use super::handler::HandlerRegistry;
use super::RawRow;
use crate::config::SheetConfig;
use crate::error::{LoadError, Result};

/// Loads the full product table from the configured spreadsheet
#[derive(Debug, Clone)]
pub struct SheetLoader {
    client: reqwest::Client,
    config: SheetConfig,
    handlers: HandlerRegistry,
}

impl SheetLoader {
    pub fn new(config: SheetConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            handlers: HandlerRegistry::new(),
        }
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Fetch and project the whole table.
    ///
    /// The handler minted for this call is released on every exit path. If the
    /// timeout fires first, the in-flight request is dropped together with it.
    pub async fn load(&self) -> Result<Vec<RawRow>> {
        let pending = self.handlers.register();
        let url = self.config.query_url(pending.name());
        let timeout = self.config.timeout;

        log::info!("Fetching product sheet {}...", self.config.sheet_id);
        log::debug!("Sheet query URL: {}", url);

        let body = match tokio::time::timeout(timeout, self.fetch_body(&url)).await {
            Ok(result) => result?,
            Err(_) => {
                log::warn!(
                    "No response from product sheet after {:?}, giving up",
                    timeout
                );
                return Err(LoadError::Timeout(timeout));
            }
        };

        let payload = pending.deliver(&body)?;
        let rows = project_rows(&payload)?;

        log::info!("Fetched {} product rows", rows.len());
        Ok(rows)
    }

    async fn fetch_body(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", "ean_lookup/1.0")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LoadError::Connection(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
