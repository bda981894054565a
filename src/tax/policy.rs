//! Policy-delta estimator: revenue impact of switching tax regimes.
//!
//! Methodology, per income percentile:
//! 1. uprate the recorded gross income by the wage-growth factor;
//! 2. finite-difference the marginal rate under the current and proposed
//!    regimes;
//! 3. scale the percentage change in the marginal retention rate by the
//!    elasticity of taxable income at that income level;
//! 4. recompute tax at the behaviourally adjusted income.
//!
//! Assumes every percentile receives only employment income and uniform wage
//! growth across percentiles, so it is suited to modelling income tax
//! changes rather than NI changes.

use super::bands::{total_tax, AdjustmentOptions};
use super::elasticity::ElasticityTable;
use super::regime::TaxRegime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::io::Read;

const BILLION: Decimal = dec!(1_000_000_000);

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("marginal rate perturbation must be positive, got {0}")]
    InvalidPerturbation(Decimal),
    #[error("percentile row {row}: {source}")]
    Percentile { row: usize, source: csv::Error },
    #[error("percentile row {row}: gross income {income} is negative")]
    NegativeIncome { row: usize, income: Decimal },
}

/// One row of the pre-tax income percentile source data. Incomes are
/// pre-uprating; the estimator applies wage growth.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PercentileRecord {
    pub percentile: u32,
    pub gross_income: Decimal,
}

/// Read percentile records from CSV with columns `percentile,gross_income`.
/// A malformed row aborts the load with the offending row identified.
pub fn read_percentiles<R: Read>(reader: R) -> Result<Vec<PercentileRecord>, PolicyError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for (index, result) in rdr.deserialize().enumerate() {
        let row = index + 2; // the header occupies row 1
        let record: PercentileRecord =
            result.map_err(|source| PolicyError::Percentile { row, source })?;
        if record.gross_income < Decimal::ZERO {
            return Err(PolicyError::NegativeIncome {
                row,
                income: record.gross_income,
            });
        }
        records.push(record);
    }
    Ok(records)
}

/// Estimator configuration. All externally settable.
#[derive(Debug, Clone)]
pub struct DeltaConfig {
    /// Uniform wage growth applied to every percentile income
    pub wage_growth: Decimal,
    /// Gross income increment used to estimate marginal rates
    pub perturbation: Decimal,
    /// Taxpayer population represented by the percentiles
    pub taxpayer_population: Decimal,
    pub elasticity: ElasticityTable,
}

/// Behavioural adjustment for one percentile. Absent when the initial
/// marginal rate is exactly 100% and the retention change is undefined.
#[derive(Debug, Clone, Serialize)]
pub struct BehaviouralResponse {
    /// Fractional change in taxable income
    pub income_change: Decimal,
    pub dynamic_gross_income: Decimal,
    pub dynamic_tax: Decimal,
}

/// Tax position of one percentile before and after the policy change.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaRow {
    pub percentile: u32,
    /// Gross income after uprating
    pub gross_income: Decimal,
    pub initial_tax: Decimal,
    pub initial_marginal_rate: Decimal,
    /// Tax under the proposed regime at the unadjusted income
    pub static_tax: Decimal,
    pub proposed_marginal_rate: Decimal,
    pub response: Option<BehaviouralResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeltaReport {
    pub rows: Vec<DeltaRow>,
    /// Population-weighted revenue change at unadjusted incomes, in £bn
    pub static_delta_bn: Decimal,
    /// Population-weighted revenue change at adjusted incomes, in £bn
    pub dynamic_delta_bn: Decimal,
}

/// Estimate the revenue impact of replacing `initial` with `proposed`.
///
/// Both regimes are evaluated with no optional adjustments. Rows with an
/// undefined behavioural response contribute their static change to the
/// dynamic total; they do not abort the batch.
pub fn estimate(
    records: &[PercentileRecord],
    initial: &TaxRegime,
    proposed: &TaxRegime,
    config: &DeltaConfig,
) -> Result<DeltaReport, PolicyError> {
    if config.perturbation <= Decimal::ZERO {
        return Err(PolicyError::InvalidPerturbation(config.perturbation));
    }

    let options = AdjustmentOptions::default();
    // each percentile stands for 1% of the taxpayer population
    let weight = config.taxpayer_population / dec!(100) / BILLION;

    let mut rows = Vec::with_capacity(records.len());
    let mut static_delta_bn = Decimal::ZERO;
    let mut dynamic_delta_bn = Decimal::ZERO;

    for record in records {
        let gross = record.gross_income * config.wage_growth;

        let initial_tax = total_tax(gross, initial, &options);
        let initial_marginal_rate =
            marginal_rate(gross, initial, &options, config.perturbation, initial_tax);
        let initial_retention = Decimal::ONE - initial_marginal_rate;

        let static_tax = total_tax(gross, proposed, &options);
        let proposed_marginal_rate =
            marginal_rate(gross, proposed, &options, config.perturbation, static_tax);
        let proposed_retention = Decimal::ONE - proposed_marginal_rate;

        let response = if initial_retention.is_zero() {
            log::warn!(
                "percentile {}: initial marginal rate is 100%, behavioural response undefined",
                record.percentile
            );
            None
        } else {
            let retention_change = (proposed_retention - initial_retention) / initial_retention;
            let income_change = retention_change * config.elasticity.coefficient(gross);
            let dynamic_gross_income = gross * (Decimal::ONE + income_change);
            let dynamic_tax = total_tax(dynamic_gross_income, proposed, &options);
            Some(BehaviouralResponse {
                income_change,
                dynamic_gross_income,
                dynamic_tax,
            })
        };

        let dynamic_tax = response.as_ref().map_or(static_tax, |r| r.dynamic_tax);
        static_delta_bn += (static_tax - initial_tax) * weight;
        dynamic_delta_bn += (dynamic_tax - initial_tax) * weight;

        log::debug!(
            "percentile {}: gross {} tax {} -> static {} dynamic {}",
            record.percentile,
            gross,
            initial_tax,
            static_tax,
            dynamic_tax
        );

        rows.push(DeltaRow {
            percentile: record.percentile,
            gross_income: gross,
            initial_tax,
            initial_marginal_rate,
            static_tax,
            proposed_marginal_rate,
            response,
        });
    }

    Ok(DeltaReport {
        rows,
        static_delta_bn,
        dynamic_delta_bn,
    })
}

fn marginal_rate(
    gross: Decimal,
    regime: &TaxRegime,
    options: &AdjustmentOptions,
    perturbation: Decimal,
    tax_at_gross: Decimal,
) -> Decimal {
    (total_tax(gross + perturbation, regime, options) - tax_at_gross) / perturbation
}
