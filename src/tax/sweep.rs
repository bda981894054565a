//! Sweep generator: the tax position at every point of an income grid.

use super::bands::{evaluate, AdjustmentOptions};
use super::regime::{Schedule, TaxRegime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("sweep step must be positive, got {0}")]
    InvalidStep(Decimal),
}

/// Income grid: `0, step, 2*step, ... <= max_income` inclusive.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub step: Decimal,
    pub max_income: Decimal,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            step: dec!(100),
            max_income: dec!(180000),
        }
    }
}

/// One point of the sweep table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomeRow {
    pub gross_income: Decimal,
    pub income_tax: Decimal,
    pub national_insurance: Decimal,
    pub total_tax: Decimal,
    pub net_income: Decimal,
    /// Backward difference of total tax over one step; 0 at the first point.
    pub marginal_rate: Decimal,
}

/// Evaluate `regime` across the income grid.
///
/// NI is always computed without the optional adjustments. Rows come out in
/// ascending gross order; each marginal rate depends on the previous row's
/// total tax, so the loop is sequential by construction.
pub fn sweep(
    regime: &TaxRegime,
    options: &AdjustmentOptions,
    config: &SweepConfig,
) -> Result<Vec<IncomeRow>, SweepError> {
    if config.step <= Decimal::ZERO {
        return Err(SweepError::InvalidStep(config.step));
    }

    let ni_options = AdjustmentOptions::default();
    let mut rows: Vec<IncomeRow> = Vec::new();
    let mut gross = Decimal::ZERO;
    while gross <= config.max_income {
        let income_tax = evaluate(gross, regime, Schedule::IncomeTax, options);
        let national_insurance =
            evaluate(gross, regime, Schedule::NationalInsurance, &ni_options);
        let total_tax = income_tax + national_insurance;
        let marginal_rate = match rows.last() {
            Some(previous) => (total_tax - previous.total_tax) / config.step,
            None => Decimal::ZERO,
        };
        rows.push(IncomeRow {
            gross_income: gross,
            income_tax,
            national_insurance,
            total_tax,
            net_income: gross - total_tax,
            marginal_rate,
        });
        gross += config.step;
    }
    Ok(rows)
}
