//! Sweep command - tax, NI and marginal rate across an income grid

use crate::cmd::{format_gbp, format_pct, read_regimes, write_csv};
use crate::tax::{sweep, AdjustmentOptions, IncomeRow, StudentLoan, SweepConfig};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct SweepCommand {
    /// JSON file containing the regime dataset
    #[arg(short, long)]
    regimes: PathBuf,

    /// Regime to sweep (e.g. "rUK 2024-25")
    #[arg(short = 'n', long)]
    regime: String,

    /// Gross income increment
    #[arg(long, default_value = "100")]
    step: Decimal,

    /// Largest gross income to evaluate
    #[arg(long, default_value = "180000")]
    max_income: Decimal,

    /// Include child benefit and its HICBC withdrawal
    #[arg(long)]
    child_benefit: bool,

    /// Number of children for child benefit and childcare
    #[arg(long, default_value_t = 3)]
    children: u32,

    /// Include student loan repayments
    #[arg(long)]
    student_loan: bool,

    /// Student loan repayment rate
    #[arg(long, default_value = "0.09")]
    student_loan_rate: Decimal,

    /// Student loan repayment threshold (plan 2)
    #[arg(long, default_value = "27295")]
    student_loan_threshold: Decimal,

    /// Include the childcare subsidy (dwarfs every other marginal rate effect)
    #[arg(long)]
    childcare: bool,

    /// Include the marriage allowance uplift
    #[arg(long)]
    marriage_allowance: bool,

    /// Output as CSV instead of formatted table
    #[arg(long)]
    csv: bool,
}

impl SweepCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let regimes = read_regimes(&self.regimes)?;
        let regime = regimes.get(&self.regime)?;

        let options = AdjustmentOptions {
            child_benefit: self.child_benefit,
            children: self.children,
            childcare: self.childcare,
            marriage_allowance: self.marriage_allowance,
            student_loan: self.student_loan.then(|| StudentLoan {
                threshold: self.student_loan_threshold,
                rate: self.student_loan_rate,
            }),
        };
        let config = SweepConfig {
            step: self.step,
            max_income: self.max_income,
        };
        let rows = sweep(regime, &options, &config)?;

        if self.csv {
            write_csv(rows.iter().map(SweepCsvRecord::from), io::stdout())
        } else {
            self.print_table(&rows);
            Ok(())
        }
    }

    fn print_table(&self, rows: &[IncomeRow]) {
        let rows: Vec<SweepRow> = rows
            .iter()
            .map(|row| SweepRow {
                gross: format_gbp(row.gross_income),
                income_tax: format_gbp(row.income_tax),
                national_insurance: format_gbp(row.national_insurance),
                total: format_gbp(row.total_tax),
                net: format_gbp(row.net_income),
                marginal_rate: format_pct(row.marginal_rate),
            })
            .collect();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }
}

#[derive(Debug, Tabled)]
struct SweepRow {
    #[tabled(rename = "Gross")]
    gross: String,
    #[tabled(rename = "Income Tax")]
    income_tax: String,
    #[tabled(rename = "NI")]
    national_insurance: String,
    #[tabled(rename = "Total")]
    total: String,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "Marginal Rate")]
    marginal_rate: String,
}

/// CSV record for sweep output
#[derive(Debug, Serialize)]
struct SweepCsvRecord {
    gross_income: String,
    income_tax: String,
    national_insurance: String,
    total_tax: String,
    net_income: String,
    marginal_rate: String,
}

impl From<&IncomeRow> for SweepCsvRecord {
    fn from(row: &IncomeRow) -> Self {
        SweepCsvRecord {
            gross_income: row.gross_income.to_string(),
            income_tax: row.income_tax.round_dp(2).to_string(),
            national_insurance: row.national_insurance.round_dp(2).to_string(),
            total_tax: row.total_tax.round_dp(2).to_string(),
            net_income: row.net_income.round_dp(2).to_string(),
            marginal_rate: row.marginal_rate.round_dp(4).to_string(),
        }
    }
}
