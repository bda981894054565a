//! Elasticity of taxable income: piecewise coefficients by income ceiling.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, thiserror::Error)]
pub enum ElasticityError {
    #[error("failed to parse elasticity table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("elasticity table has no bands")]
    Empty,
    #[error("elasticity band {index} ceiling {ceiling} is not above the previous band")]
    UnorderedCeiling { index: usize, ceiling: Decimal },
}

/// One piecewise step: applies to incomes up to and including `ceiling`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ElasticityBand {
    pub ceiling: Decimal,
    pub elasticity: Decimal,
}

/// Ordered elasticity bands with a sensitivity scalar applied uniformly.
#[derive(Debug, Clone)]
pub struct ElasticityTable {
    bands: Vec<ElasticityBand>,
    sensitivity: Decimal,
}

/// Read elasticity bands from JSON: `[{"ceiling": 50000, "elasticity": 0.015}, ...]`.
pub fn read_elasticity_json<R: Read>(reader: R) -> Result<Vec<ElasticityBand>, ElasticityError> {
    Ok(serde_json::from_reader(reader)?)
}

impl ElasticityTable {
    pub fn new(
        bands: Vec<ElasticityBand>,
        sensitivity: Decimal,
    ) -> Result<Self, ElasticityError> {
        if bands.is_empty() {
            return Err(ElasticityError::Empty);
        }
        for (index, pair) in bands.windows(2).enumerate() {
            if pair[1].ceiling <= pair[0].ceiling {
                return Err(ElasticityError::UnorderedCeiling {
                    index: index + 1,
                    ceiling: pair[1].ceiling,
                });
            }
        }
        Ok(ElasticityTable { bands, sensitivity })
    }

    /// Elasticities recommended by the Scottish Fiscal Commission (March
    /// 2018). Scottish figures will overstate responses for the rest of the
    /// UK, so estimates built on these lean conservative.
    pub fn scottish_fiscal_commission() -> Self {
        ElasticityTable {
            bands: vec![
                ElasticityBand {
                    ceiling: dec!(50000),
                    elasticity: dec!(0.015),
                },
                ElasticityBand {
                    ceiling: dec!(80000),
                    elasticity: dec!(0.10),
                },
                ElasticityBand {
                    ceiling: dec!(150000),
                    elasticity: dec!(0.20),
                },
                ElasticityBand {
                    ceiling: dec!(300000),
                    elasticity: dec!(0.35),
                },
                ElasticityBand {
                    ceiling: dec!(500000),
                    elasticity: dec!(0.55),
                },
                ElasticityBand {
                    ceiling: dec!(1_000_000_000),
                    elasticity: dec!(0.75),
                },
            ],
            sensitivity: Decimal::ONE,
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: Decimal) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Coefficient for `income`: the first band whose ceiling is >= income
    /// (ceilings are inclusive), falling back to the top band for incomes
    /// beyond every ceiling.
    pub fn coefficient(&self, income: Decimal) -> Decimal {
        let index = self
            .bands
            .partition_point(|band| band.ceiling < income)
            .min(self.bands.len() - 1);
        self.sensitivity * self.bands[index].elasticity
    }
}
