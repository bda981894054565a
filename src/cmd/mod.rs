pub mod delta;
pub mod regimes;
pub mod schema;
pub mod sweep;

use crate::tax::{read_regimes_json, RegimeSet};
use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Load and normalize a regime dataset file.
pub fn read_regimes(path: &Path) -> anyhow::Result<RegimeSet> {
    let file = File::open(path)
        .with_context(|| format!("failed to open regime dataset {}", path.display()))?;
    let regimes = read_regimes_json(BufReader::new(file))
        .with_context(|| format!("invalid regime dataset {}", path.display()))?;
    Ok(regimes)
}

pub fn write_csv<I, R, W>(records: I, writer: W) -> anyhow::Result<()>
where
    I: IntoIterator<Item = R>,
    R: serde::Serialize,
    W: std::io::Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records.into_iter() {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// £ with thousands separators, rounded to whole pounds.
pub fn format_gbp(amount: Decimal) -> String {
    let rounded = amount.round();
    let digits = rounded.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-£{}", grouped)
    } else {
        format!("£{}", grouped)
    }
}

pub fn format_pct(rate: Decimal) -> String {
    format!("{:.1}%", rate * dec!(100))
}

/// Ordinal label: 1 -> "1st", 2 -> "2nd", 11 -> "11th".
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
