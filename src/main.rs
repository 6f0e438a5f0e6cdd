//! EAN Lookup - barcode price lookup
//!
//! Loads the product sheet once at startup, then answers lookups from the
//! terminal (one code per line) and, optionally, over HTTP.

use clap::Parser;
use ean_lookup::config::{clamp_timeout_secs, DEFAULT_BASE_URL, DEFAULT_SHEET_ID};
use ean_lookup::{LineScanner, PriceFormat, ProductCatalog, SheetConfig, SheetLoader};
use std::sync::Arc;

/// Barcode price lookup backed by a Google Sheet
#[derive(Parser, Debug)]
#[command(name = "ean_lookup")]
#[command(version, about, long_about = None)]
struct Args {
    /// Spreadsheet identifier holding the product table
    #[arg(long, default_value = DEFAULT_SHEET_ID)]
    sheet_id: String,

    /// Worksheet (tab) name; defaults to the first tab
    #[arg(long)]
    sheet_name: Option<String>,

    /// Google Sheets host
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Seconds to wait for the sheet before giving up (10-15)
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Enable web UI on specified port (default: disabled)
    #[arg(long)]
    web_port: Option<u16>,

    /// Do not read codes from stdin
    #[arg(long, default_value_t = false)]
    no_repl: bool,

    /// Show prices with a decimal comma
    #[arg(long, default_value_t = false)]
    decimal_comma: bool,

    /// Currency prefix shown before prices, e.g. "R$"
    #[arg(long)]
    currency: Option<String>,
}

impl Args {
    fn sheet_config(&self) -> SheetConfig {
        SheetConfig {
            sheet_id: self.sheet_id.clone(),
            sheet_name: self.sheet_name.clone(),
            base_url: self.base_url.clone(),
            timeout: clamp_timeout_secs(self.timeout_secs),
        }
    }

    fn price_format(&self) -> PriceFormat {
        PriceFormat {
            decimal_comma: self.decimal_comma,
            currency_prefix: self.currency.clone(),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.sheet_config();
    let format = args.price_format();

    log::info!("Starting ean_lookup...");
    log::info!("Product sheet: {}", config.sheet_id);

    let catalog = Arc::new(ProductCatalog::new(SheetLoader::new(config)));

    // Front ends come up right away; lookups see an empty catalog until this lands
    tokio::spawn({
        let catalog = Arc::clone(&catalog);
        async move {
            if let Err(e) = catalog.reload().await {
                log::error!("Initial load failed: {}", e);
            }
        }
    });

    let web = args.web_port.map(|port| {
        let catalog = Arc::clone(&catalog);
        let format = format.clone();
        tokio::spawn(async move {
            if let Err(e) = ean_lookup::web::serve(catalog, format, port).await {
                log::error!("Web server error: {}", e);
                std::process::exit(1);
            }
        })
    });

    if !args.no_repl {
        let mut scanner = LineScanner::stdin();
        let mut stdout = tokio::io::stdout();
        if let Err(e) = ean_lookup::repl::run(&catalog, &mut scanner, &mut stdout, &format).await {
            log::error!("Terminal session failed: {}", e);
        }
        return;
    }

    match web {
        Some(_) => {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {}", e);
            }
            log::info!("Shutting down");
        }
        None => log::warn!("Nothing to serve: --no-repl given without --web-port"),
    }
}
