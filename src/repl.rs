//! Terminal front end
//!
//! Reads codes from a [`BarcodeScanner`] and prints the matching product.
//! Lines starting with `:` are commands.

use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::catalog::{ProductCatalog, ReloadOutcome};
use crate::price::PriceFormat;
use crate::scanner::{BarcodeScanner, FacingMode, Torch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Lookup(String),
    Refresh,
    Status,
    Torch,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    match line {
        "" => Command::Empty,
        ":refresh" | ":r" => Command::Refresh,
        ":status" | ":s" => Command::Status,
        ":torch" | ":t" => Command::Torch,
        ":help" | ":h" | ":?" => Command::Help,
        ":quit" | ":q" => Command::Quit,
        other if other.starts_with(':') => Command::Unknown(other.to_string()),
        code => Command::Lookup(code.to_string()),
    }
}

const HELP: &str = "Scan or type a barcode to look it up.\n\
    :refresh  reload the product sheet\n\
    :status   show catalog status\n\
    :torch    toggle the scanner torch\n\
    :quit     exit\n";

/// Reload started from the terminal, resolving to the message to print
type PendingReload<'a> = Pin<Box<dyn Future<Output = String> + Send + 'a>>;

/// Run the lookup loop until the scanner runs dry or `:quit` is entered.
///
/// `:refresh` runs alongside the loop; codes read meanwhile are answered
/// from the table currently held.
pub async fn run<S, W>(
    catalog: &ProductCatalog,
    scanner: &mut S,
    out: &mut W,
    format: &PriceFormat,
) -> std::io::Result<()>
where
    S: BarcodeScanner + ?Sized,
    W: AsyncWrite + Unpin + Send,
{
    if let Err(e) = scanner.start(FacingMode::Environment).await {
        log::error!("Failed to start scanner: {}", e);
        out.write_all(format!("Scanner error: {}\n", e).as_bytes())
            .await?;
        return Ok(());
    }

    let mut torch = Torch::default();
    let mut reload: Option<PendingReload<'_>> = None;

    loop {
        let line = tokio::select! {
            biased;
            reply = finish_reload(&mut reload) => {
                reload = None;
                write_reply(out, &reply).await?;
                continue;
            }
            line = scanner.next_code() => line,
        };

        let Some(line) = line else {
            // input is exhausted; report a reload that is still running
            if let Some(pending) = reload.take() {
                write_reply(out, &pending.await).await?;
            }
            break;
        };

        let reply = match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Lookup(code) => describe_lookup(catalog, &code, format),
            Command::Refresh if reload.is_some() => "A reload is already running\n".to_string(),
            Command::Refresh => {
                reload = Some(Box::pin(describe_reload(catalog)));
                "Reloading product sheet...\n".to_string()
            }
            Command::Status => describe_status(catalog),
            Command::Torch => match torch.toggle(&mut *scanner).await {
                Ok(true) => "Torch on\n".to_string(),
                Ok(false) => "Torch off\n".to_string(),
                Err(e) => format!("{}\n", e),
            },
            Command::Help => HELP.to_string(),
            Command::Unknown(cmd) => format!("Unknown command {} (try :help)\n", cmd),
        };
        write_reply(out, &reply).await?;
    }

    torch.release(&mut *scanner).await;
    scanner.stop().await;
    Ok(())
}

/// Wait for the running reload, or forever when there is none
async fn finish_reload(reload: &mut Option<PendingReload<'_>>) -> String {
    match reload.as_mut() {
        Some(pending) => pending.await,
        None => std::future::pending().await,
    }
}

async fn write_reply<W>(out: &mut W, reply: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin + Send,
{
    out.write_all(reply.as_bytes()).await?;
    out.flush().await
}

pub fn describe_lookup(catalog: &ProductCatalog, code: &str, format: &PriceFormat) -> String {
    match catalog.lookup(code) {
        Some(record) => {
            let name = if record.name.is_empty() {
                "(no name)"
            } else {
                record.name.as_str()
            };
            format!(
                "{}\n  EAN: {}\n  Price: {}\n",
                name,
                record.code,
                format.render(&record)
            )
        }
        None if catalog.is_empty() => {
            format!("Product not found ({}): catalog is empty, try :refresh\n", code)
        }
        None => format!("Product not found ({})\n", code),
    }
}

async fn describe_reload(catalog: &ProductCatalog) -> String {
    match catalog.reload().await {
        Ok(ReloadOutcome::Loaded(count)) => format!("Loaded {} products\n", count),
        Ok(ReloadOutcome::AlreadyInProgress) => "A reload is already running\n".to_string(),
        Err(e) => format!("{} (keeping {} products)\n", e, catalog.len()),
    }
}

fn describe_status(catalog: &ProductCatalog) -> String {
    let status = catalog.status();
    let loaded = status
        .loaded_at
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());
    format!(
        "{} products, last loaded {}{}\n",
        status.records,
        loaded,
        if status.loading { ", reload running" } else { "" }
    )
}
