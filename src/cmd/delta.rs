//! Delta command - fiscal and behavioural impact of a policy change

use crate::cmd::{format_gbp, format_pct, ordinal, read_regimes};
use crate::tax::{
    estimate, read_elasticity_json, read_percentiles, DeltaConfig, DeltaReport, ElasticityTable,
};
use anyhow::Context;
use clap::Args;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct DeltaCommand {
    /// JSON file containing the regime dataset
    #[arg(short, long)]
    regimes: PathBuf,

    /// Regime in force before the change
    #[arg(short, long)]
    initial: String,

    /// Regime to model switching to
    #[arg(short, long)]
    proposed: String,

    /// CSV file of pre-uprated income percentiles (percentile,gross_income)
    #[arg(short = 'f', long)]
    percentiles: PathBuf,

    /// Uniform wage growth applied to the percentile incomes
    #[arg(long, default_value = "1.16")]
    wage_growth: Decimal,

    /// Gross income increment used to estimate marginal rates
    #[arg(long, default_value = "1000")]
    perturbation: Decimal,

    /// Taxpayer population represented by the percentiles
    #[arg(long, default_value = "37800000")]
    population: Decimal,

    /// JSON file with elasticity bands; defaults to the SFC table
    #[arg(long)]
    elasticity: Option<PathBuf>,

    /// Sensitivity factor applied to every elasticity coefficient
    #[arg(long, default_value = "1.0")]
    eti_sensitivity: Decimal,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

impl DeltaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let regimes = read_regimes(&self.regimes)?;
        let initial = regimes.get(&self.initial)?;
        let proposed = regimes.get(&self.proposed)?;

        let file = File::open(&self.percentiles).with_context(|| {
            format!("failed to open percentile file {}", self.percentiles.display())
        })?;
        let records = read_percentiles(BufReader::new(file)).with_context(|| {
            format!("invalid percentile file {}", self.percentiles.display())
        })?;

        let elasticity = match &self.elasticity {
            Some(path) => {
                let file = File::open(path).with_context(|| {
                    format!("failed to open elasticity table {}", path.display())
                })?;
                let bands = read_elasticity_json(BufReader::new(file))
                    .with_context(|| format!("invalid elasticity table {}", path.display()))?;
                ElasticityTable::new(bands, self.eti_sensitivity)?
            }
            None => ElasticityTable::scottish_fiscal_commission()
                .with_sensitivity(self.eti_sensitivity),
        };

        let config = DeltaConfig {
            wage_growth: self.wage_growth,
            perturbation: self.perturbation,
            taxpayer_population: self.population,
            elasticity,
        };
        let report = estimate(&records, initial, proposed, &config)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            self.print_table(&report);
        }
        Ok(())
    }

    fn print_table(&self, report: &DeltaReport) {
        let rows: Vec<DeltaRowView> = report
            .rows
            .iter()
            .map(|row| {
                let (dynamic_gross, dynamic_tax, dynamic_change) = match &row.response {
                    Some(response) => (
                        format_gbp(response.dynamic_gross_income),
                        format_gbp(response.dynamic_tax),
                        format_gbp(response.dynamic_tax - row.initial_tax),
                    ),
                    None => (
                        "undefined".to_string(),
                        "undefined".to_string(),
                        "undefined".to_string(),
                    ),
                };
                DeltaRowView {
                    percentile: ordinal(row.percentile),
                    gross: format_gbp(row.gross_income),
                    current_tax: format_gbp(row.initial_tax),
                    marginal_rate: format_pct(row.initial_marginal_rate),
                    static_tax: format_gbp(row.static_tax),
                    new_marginal_rate: format_pct(row.proposed_marginal_rate),
                    dynamic_gross,
                    dynamic_tax,
                    dynamic_change,
                }
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);

        println!();
        println!(
            "Calculated impact of '{}' compared to '{}':",
            self.proposed, self.initial
        );
        println!("Static estimate: £{:.1}bn", report.static_delta_bn);
        println!("Dynamic estimate: £{:.1}bn", report.dynamic_delta_bn);
    }
}

#[derive(Debug, Tabled)]
struct DeltaRowView {
    #[tabled(rename = "Percentile")]
    percentile: String,
    #[tabled(rename = "Gross Income")]
    gross: String,
    #[tabled(rename = "Current Tax")]
    current_tax: String,
    #[tabled(rename = "Marginal Rate")]
    marginal_rate: String,
    #[tabled(rename = "New Tax (static)")]
    static_tax: String,
    #[tabled(rename = "New Marginal Rate")]
    new_marginal_rate: String,
    #[tabled(rename = "Dynamic Gross")]
    dynamic_gross: String,
    #[tabled(rename = "New Tax (dynamic)")]
    dynamic_tax: String,
    #[tabled(rename = "Dynamic Tax Change")]
    dynamic_change: String,
}
