//! Data source configuration

use std::time::Duration;

/// Identifier of the product spreadsheet the lookup is served from
pub const DEFAULT_SHEET_ID: &str = "1yaDHltfBgrRe2iLASRiokXcTpGQb1Uq2Vo3lQ3dVHlw";

/// Google Sheets host serving the gviz query endpoint
pub const DEFAULT_BASE_URL: &str = "https://docs.google.com";

/// Default time allowed for one sheet load
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounds accepted for the load timeout from the command line
pub const MIN_TIMEOUT_SECS: u64 = 10;
pub const MAX_TIMEOUT_SECS: u64 = 15;

/// Where and how to fetch the product table
#[derive(Debug, Clone, PartialEq)]
pub struct SheetConfig {
    pub sheet_id: String,
    /// Worksheet (tab) name; the first tab when `None`
    pub sheet_name: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            sheet_id: DEFAULT_SHEET_ID.to_string(),
            sheet_name: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SheetConfig {
    /// Config pointing at a different host (used against mock servers)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Build the gviz query URL whose response invokes `handler`
    pub fn query_url(&self, handler: &str) -> String {
        let mut url = format!(
            "{}/spreadsheets/d/{}/gviz/tq?tqx=responseHandler:{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.sheet_id),
            urlencoding::encode(handler)
        );
        if let Some(name) = &self.sheet_name {
            url.push_str("&sheet=");
            url.push_str(&urlencoding::encode(name));
        }
        url
    }
}

/// Clamp a user-supplied timeout into the accepted range
pub fn clamp_timeout_secs(secs: u64) -> Duration {
    let clamped = secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS);
    if clamped != secs {
        log::warn!(
            "Timeout of {}s is outside {}-{}s, using {}s",
            secs,
            MIN_TIMEOUT_SECS,
            MAX_TIMEOUT_SECS,
            clamped
        );
    }
    Duration::from_secs(clamped)
}
