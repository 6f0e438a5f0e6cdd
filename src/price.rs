//! Price cell normalization and display formatting
//!
//! Sheet cells may hold a plain number or a currency-formatted string such as
//! `"R$ 1.234,56"`. Normalization rules:
//!
//! - numbers pass through unchanged (NaN and infinities become 0)
//! - text keeps only digits, `,`, `.` and `-`; everything else (currency
//!   symbols, spaces, letters) is decoration and is dropped
//! - if a comma remains it is the decimal separator and dots are thousands
//!   separators; otherwise the text is parsed as a plain decimal
//! - empty, missing or unparsable values are 0

use crate::catalog::ProductRecord;

/// Raw price as delivered by the sheet, before normalization
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PriceCell {
    Number(f64),
    Text(String),
    #[default]
    Missing,
}

impl From<&serde_json::Value> for PriceCell {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) => n.as_f64().map_or(PriceCell::Missing, PriceCell::Number),
            serde_json::Value::String(s) => PriceCell::Text(s.clone()),
            _ => PriceCell::Missing,
        }
    }
}

/// Convert a price cell to a plain decimal number
pub fn normalize_price(cell: &PriceCell) -> f64 {
    match cell {
        PriceCell::Number(n) if n.is_finite() => *n,
        PriceCell::Number(_) => 0.0,
        PriceCell::Text(text) => parse_price_text(text),
        PriceCell::Missing => 0.0,
    }
}

fn parse_price_text(text: &str) -> f64 {
    let kept: String = text
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();

    let plain = if kept.contains(',') {
        kept.replace('.', "").replace(',', ".")
    } else {
        kept
    };

    match plain.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            if !text.trim().is_empty() {
                log::debug!("Unparsable price text {:?}, using 0", text);
            }
            0.0
        }
    }
}

/// Render a record's price with exactly two fractional digits and `.` as separator
pub fn format_price(record: &ProductRecord) -> String {
    let rendered = format!("{:.2}", record.price_value());
    // amounts that round to zero keep no sign
    if rendered == "-0.00" {
        "0.00".to_string()
    } else {
        rendered
    }
}

/// Display convention for prices shown to the user
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceFormat {
    /// Use `,` instead of `.` as the decimal separator
    pub decimal_comma: bool,
    /// Prefix such as `R$`, separated from the amount by a space
    pub currency_prefix: Option<String>,
}

impl PriceFormat {
    /// Brazilian real presentation: `R$ 3,50`
    pub fn brl() -> Self {
        Self {
            decimal_comma: true,
            currency_prefix: Some("R$".to_string()),
        }
    }

    pub fn render(&self, record: &ProductRecord) -> String {
        let mut amount = format_price(record);
        if self.decimal_comma {
            amount = amount.replace('.', ",");
        }
        match &self.currency_prefix {
            Some(prefix) => format!("{} {}", prefix, amount),
            None => amount,
        }
    }
}
