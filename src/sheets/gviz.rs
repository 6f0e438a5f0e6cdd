//! gviz response unwrapping and row projection

use serde_json::Value;

use super::RawRow;
use crate::error::{LoadError, Result};
use crate::price::PriceCell;

const NAME_COLUMN: usize = 0;
const CODE_COLUMN: usize = 1;
const PRICE_COLUMN: usize = 2;

/// Strip the `handler(...);` wrapper and return the JSON argument.
///
/// gviz prefixes its responses with an anti-hijacking comment (`/*O_o*/`),
/// which is skipped. A wrapper calling any other name is rejected.
pub fn unwrap_callback<'a>(body: &'a str, handler: &str) -> Result<&'a str> {
    let mut rest = body.trim_start();
    while let Some(comment) = rest.strip_prefix("/*") {
        let end = comment
            .find("*/")
            .ok_or_else(|| LoadError::Format("unterminated comment before payload".into()))?;
        rest = comment[end + 2..].trim_start();
    }

    let open = rest
        .find('(')
        .ok_or_else(|| LoadError::Format("response is not a callback invocation".into()))?;
    let callee = rest[..open].trim();
    if callee != handler {
        return Err(LoadError::Format(format!(
            "response addressed to {:?}, expected {:?}",
            callee, handler
        )));
    }

    let args = rest[open + 1..].trim_end();
    let args = args.strip_suffix(';').unwrap_or(args).trim_end();
    let json = args
        .strip_suffix(')')
        .ok_or_else(|| LoadError::Format("callback invocation is not closed".into()))?;

    Ok(json.trim())
}

/// Project the rows of a gviz payload into [`RawRow`]s.
///
/// Only the top-level shape (`table.rows` as an array) can fail the load.
/// Rows without cell data or without a code are dropped individually.
pub fn project_rows(payload: &Value) -> Result<Vec<RawRow>> {
    if payload.get("status").and_then(Value::as_str) == Some("error") {
        return Err(LoadError::Format(gviz_errors(payload)));
    }

    let rows = payload
        .get("table")
        .and_then(|table| table.get("rows"))
        .ok_or_else(|| LoadError::Format("missing table.rows".into()))?
        .as_array()
        .ok_or_else(|| LoadError::Format("table.rows is not an array".into()))?;

    let mut projected = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        match project_row(row) {
            Some(raw) => projected.push(raw),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        log::debug!("Dropped {} sheet rows without cells or code", dropped);
    }

    Ok(projected)
}

fn project_row(row: &Value) -> Option<RawRow> {
    let cells = row.get("c")?.as_array()?;

    let code = cell_text(cells.get(CODE_COLUMN));
    if code.is_empty() {
        return None;
    }

    Some(RawRow {
        name: cell_text(cells.get(NAME_COLUMN)),
        code,
        price: cells
            .get(PRICE_COLUMN)
            .and_then(|cell| cell.get("v"))
            .map(PriceCell::from)
            .unwrap_or_default(),
    })
}

/// Trimmed text of a `{ "v": ... }` cell; anything unusable is empty
fn cell_text(cell: Option<&Value>) -> String {
    let value = match cell.and_then(|c| c.get("v")) {
        Some(v) => v,
        None => return String::new(),
    };

    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => number_text(n),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Render numbers the way the sheet shows them: integral values carry no
/// fraction, so a numeric EAN stays a plain digit string.
fn number_text(n: &serde_json::Number) -> String {
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    n.as_f64().map(|f| f.to_string()).unwrap_or_default()
}

fn gviz_errors(payload: &Value) -> String {
    let messages: Vec<String> = payload
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .filter_map(|e| {
                    e.get("detailed_message")
                        .or_else(|| e.get("message"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .collect()
        })
        .unwrap_or_default();

    if messages.is_empty() {
        "sheet query returned an error".to_string()
    } else {
        format!("sheet query returned an error: {}", messages.join("; "))
    }
}

#[cfg(test)]
#[path = "gviz_tests.rs"]
mod tests;
