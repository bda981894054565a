//! Regimes command - list the regimes in a dataset

use crate::cmd::{format_gbp, format_pct, read_regimes};
use clap::Args;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct RegimesCommand {
    /// JSON file containing the regime dataset
    #[arg(short, long)]
    regimes: PathBuf,
}

impl RegimesCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let regimes = read_regimes(&self.regimes)?;

        let rows: Vec<RegimeRow> = regimes
            .iter()
            .map(|regime| RegimeRow {
                name: regime.name.clone(),
                personal_allowance: format_gbp(regime.personal_allowance),
                income_tax_bands: regime.income_tax.len(),
                top_rate: format_pct(
                    regime
                        .income_tax
                        .last()
                        .map_or(Decimal::ZERO, |band| band.rate),
                ),
                ni_bands: regime.national_insurance.len(),
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        Ok(())
    }
}

#[derive(Debug, Tabled)]
struct RegimeRow {
    #[tabled(rename = "Regime")]
    name: String,
    #[tabled(rename = "Personal Allowance")]
    personal_allowance: String,
    #[tabled(rename = "Income Tax Bands")]
    income_tax_bands: usize,
    #[tabled(rename = "Top Rate")]
    top_rate: String,
    #[tabled(rename = "NI Bands")]
    ni_bands: usize,
}
