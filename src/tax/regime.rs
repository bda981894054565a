//! Tax regime dataset: raw JSON shape, load-time normalization, lookup.
//!
//! A dataset maps regime names (e.g. "rUK 2024-25") to configurations. Band
//! thresholds in the file apply to taxable income and the final band of each
//! schedule carries no threshold; normalization replaces that absence with an
//! explicit unbounded sentinel so the evaluator never has to special-case it.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// Upper bound given to the final band of each schedule during normalization.
/// No realistic income reaches it.
pub const UNBOUNDED: Decimal = dec!(1_000_000_000_000);

#[derive(Debug, thiserror::Error)]
pub enum RegimeError {
    #[error("failed to parse regime dataset: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("regime not found: {0}")]
    UnknownRegime(String),
    #[error("regime '{regime}' has an empty {schedule} schedule")]
    EmptySchedule {
        regime: String,
        schedule: &'static str,
    },
    #[error("regime '{regime}' {schedule} band {index} has no threshold but is not the final band")]
    UnboundedBandNotLast {
        regime: String,
        schedule: &'static str,
        index: usize,
    },
    #[error("regime '{regime}' final {schedule} band must not declare a threshold")]
    BoundedFinalBand {
        regime: String,
        schedule: &'static str,
    },
    #[error("regime '{regime}' {schedule} band {index} threshold {threshold} is not above the previous band")]
    UnorderedThreshold {
        regime: String,
        schedule: &'static str,
        index: usize,
        threshold: Decimal,
    },
}

/// Which band schedule of a regime to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    IncomeTax,
    NationalInsurance,
}

/// One marginal band as stored in the dataset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct RawBand {
    /// Upper threshold of the band; omitted on the final (unbounded) band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<f64>")]
    pub threshold: Option<Decimal>,
    /// Marginal rate applied within the band
    #[schemars(with = "f64")]
    pub rate: Decimal,
}

/// Weekly child benefit rates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct ChildBenefit {
    /// Weekly rate for the eldest child
    #[serde(rename = "1st")]
    #[schemars(with = "f64")]
    pub first: Decimal,
    /// Weekly rate for each further child
    #[schemars(with = "f64")]
    pub subsequent: Decimal,
}

/// Regime configuration as stored in the dataset file.
///
/// Field names follow the published dataset. All fields are required; a
/// missing field is a configuration error surfaced at parse time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RawRegime {
    #[serde(rename = "statutory personal allowance")]
    #[schemars(with = "f64")]
    pub personal_allowance: Decimal,
    /// Income above which the personal allowance is withdrawn
    #[serde(rename = "allowance withdrawal threshold")]
    #[schemars(with = "f64")]
    pub allowance_withdrawal_threshold: Decimal,
    /// Allowance withdrawn per pound of income above the threshold
    #[serde(rename = "allowance withdrawal rate")]
    #[schemars(with = "f64")]
    pub allowance_withdrawal_rate: Decimal,
    /// Fraction of the allowance transferable from a non-earning spouse
    #[serde(rename = "marriage allowance")]
    #[schemars(with = "f64")]
    pub marriage_allowance: Decimal,
    #[serde(rename = "marriage allowance max earnings")]
    #[schemars(with = "f64")]
    pub marriage_allowance_max_earnings: Decimal,
    #[serde(rename = "child benefit")]
    pub child_benefit: ChildBenefit,
    /// Income at which the High Income Child Benefit Charge starts
    #[serde(rename = "HICBC start")]
    #[schemars(with = "f64")]
    pub hicbc_start: Decimal,
    /// Income at which the child benefit is fully withdrawn
    #[serde(rename = "HICBC end")]
    #[schemars(with = "f64")]
    pub hicbc_end: Decimal,
    #[serde(rename = "childcare min earnings")]
    #[schemars(with = "f64")]
    pub childcare_min_earnings: Decimal,
    #[serde(rename = "childcare max earnings")]
    #[schemars(with = "f64")]
    pub childcare_max_earnings: Decimal,
    #[serde(rename = "childcare subsidy per child")]
    #[schemars(with = "f64")]
    pub childcare_subsidy_per_child: Decimal,
    #[serde(rename = "childcare max children")]
    pub childcare_max_children: u32,
    #[serde(rename = "income tax")]
    pub income_tax: Vec<RawBand>,
    #[serde(rename = "NI")]
    pub national_insurance: Vec<RawBand>,
}

/// One normalized marginal band. `upper` is always present; the final band
/// of a schedule carries [`UNBOUNDED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub upper: Decimal,
    pub rate: Decimal,
}

/// A normalized, immutable tax regime. Produced once at load time; never
/// mutated during evaluation.
#[derive(Debug, Clone)]
pub struct TaxRegime {
    pub name: String,
    pub personal_allowance: Decimal,
    pub allowance_withdrawal_threshold: Decimal,
    pub allowance_withdrawal_rate: Decimal,
    pub marriage_allowance: Decimal,
    pub marriage_allowance_max_earnings: Decimal,
    pub child_benefit: ChildBenefit,
    pub hicbc_start: Decimal,
    pub hicbc_end: Decimal,
    pub childcare_min_earnings: Decimal,
    pub childcare_max_earnings: Decimal,
    pub childcare_subsidy_per_child: Decimal,
    pub childcare_max_children: u32,
    pub income_tax: Vec<Band>,
    pub national_insurance: Vec<Band>,
}

impl TaxRegime {
    pub fn bands(&self, schedule: Schedule) -> &[Band] {
        match schedule {
            Schedule::IncomeTax => &self.income_tax,
            Schedule::NationalInsurance => &self.national_insurance,
        }
    }
}

/// Normalized regimes keyed by name. Iteration order is the name order.
#[derive(Debug, Clone)]
pub struct RegimeSet {
    regimes: BTreeMap<String, TaxRegime>,
}

/// Read a regime dataset (JSON) and normalize it.
pub fn read_regimes_json<R: Read>(reader: R) -> Result<RegimeSet, RegimeError> {
    let raw: BTreeMap<String, RawRegime> = serde_json::from_reader(reader)?;
    RegimeSet::normalize(raw)
}

impl RegimeSet {
    pub fn normalize(raw: BTreeMap<String, RawRegime>) -> Result<Self, RegimeError> {
        let mut regimes = BTreeMap::new();
        for (name, regime) in raw {
            let income_tax = normalize_schedule(&name, "income tax", &regime.income_tax)?;
            let national_insurance = normalize_schedule(&name, "NI", &regime.national_insurance)?;
            log::debug!(
                "normalized regime '{}': {} income tax bands, {} NI bands",
                name,
                income_tax.len(),
                national_insurance.len()
            );
            regimes.insert(
                name.clone(),
                TaxRegime {
                    name,
                    personal_allowance: regime.personal_allowance,
                    allowance_withdrawal_threshold: regime.allowance_withdrawal_threshold,
                    allowance_withdrawal_rate: regime.allowance_withdrawal_rate,
                    marriage_allowance: regime.marriage_allowance,
                    marriage_allowance_max_earnings: regime.marriage_allowance_max_earnings,
                    child_benefit: regime.child_benefit,
                    hicbc_start: regime.hicbc_start,
                    hicbc_end: regime.hicbc_end,
                    childcare_min_earnings: regime.childcare_min_earnings,
                    childcare_max_earnings: regime.childcare_max_earnings,
                    childcare_subsidy_per_child: regime.childcare_subsidy_per_child,
                    childcare_max_children: regime.childcare_max_children,
                    income_tax,
                    national_insurance,
                },
            );
        }
        Ok(RegimeSet { regimes })
    }

    pub fn get(&self, name: &str) -> Result<&TaxRegime, RegimeError> {
        self.regimes
            .get(name)
            .ok_or_else(|| RegimeError::UnknownRegime(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaxRegime> {
        self.regimes.values()
    }
}

fn normalize_schedule(
    regime: &str,
    schedule: &'static str,
    raw: &[RawBand],
) -> Result<Vec<Band>, RegimeError> {
    if raw.is_empty() {
        return Err(RegimeError::EmptySchedule {
            regime: regime.to_string(),
            schedule,
        });
    }

    let mut bands = Vec::with_capacity(raw.len());
    let mut last = Decimal::ZERO;
    for (index, band) in raw.iter().enumerate() {
        let is_final = index == raw.len() - 1;
        let upper = match band.threshold {
            Some(_) if is_final => {
                return Err(RegimeError::BoundedFinalBand {
                    regime: regime.to_string(),
                    schedule,
                })
            }
            Some(threshold) => {
                if threshold <= last {
                    return Err(RegimeError::UnorderedThreshold {
                        regime: regime.to_string(),
                        schedule,
                        index,
                        threshold,
                    });
                }
                threshold
            }
            None if is_final => UNBOUNDED,
            None => {
                return Err(RegimeError::UnboundedBandNotLast {
                    regime: regime.to_string(),
                    schedule,
                    index,
                })
            }
        };
        bands.push(Band {
            upper,
            rate: band.rate,
        });
        last = upper;
    }
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(income_tax: &str, ni: &str) -> String {
        format!(
            r#"{{
                "test": {{
                    "statutory personal allowance": 12570,
                    "allowance withdrawal threshold": 100000,
                    "allowance withdrawal rate": 0.5,
                    "marriage allowance": 0.1,
                    "marriage allowance max earnings": 50270,
                    "child benefit": {{"1st": 25.60, "subsequent": 16.95}},
                    "HICBC start": 60000,
                    "HICBC end": 80000,
                    "childcare min earnings": 9518,
                    "childcare max earnings": 100000,
                    "childcare subsidy per child": 6500,
                    "childcare max children": 2,
                    "income tax": {income_tax},
                    "NI": {ni}
                }}
            }}"#
        )
    }

    const IT: &str = r#"[{"threshold": 37700, "rate": 0.20}, {"threshold": 125140, "rate": 0.40}, {"rate": 0.45}]"#;
    const NI: &str = r#"[{"threshold": 12570, "rate": 0}, {"threshold": 50270, "rate": 0.08}, {"rate": 0.02}]"#;

    #[test]
    fn normalization_injects_unbounded_sentinel() {
        let set = read_regimes_json(dataset(IT, NI).as_bytes()).unwrap();
        let regime = set.get("test").unwrap();

        assert_eq!(regime.income_tax.len(), 3);
        assert_eq!(regime.income_tax[0].upper, dec!(37700));
        assert_eq!(regime.income_tax[1].upper, dec!(125140));
        assert_eq!(regime.income_tax[2].upper, UNBOUNDED);
        assert_eq!(regime.national_insurance[2].upper, UNBOUNDED);
    }

    #[test]
    fn child_benefit_rates_parsed_from_dataset_keys() {
        let set = read_regimes_json(dataset(IT, NI).as_bytes()).unwrap();
        let regime = set.get("test").unwrap();

        assert_eq!(regime.child_benefit.first, dec!(25.60));
        assert_eq!(regime.child_benefit.subsequent, dec!(16.95));
    }

    #[test]
    fn unknown_regime_rejected() {
        let set = read_regimes_json(dataset(IT, NI).as_bytes()).unwrap();
        assert!(matches!(
            set.get("Reform UK manifesto"),
            Err(RegimeError::UnknownRegime(_))
        ));
    }

    #[test]
    fn empty_schedule_rejected() {
        let err = read_regimes_json(dataset("[]", NI).as_bytes()).unwrap_err();
        assert!(matches!(err, RegimeError::EmptySchedule { schedule: "income tax", .. }));
    }

    #[test]
    fn unbounded_band_must_be_last() {
        let it = r#"[{"rate": 0.20}, {"rate": 0.40}]"#;
        let err = read_regimes_json(dataset(it, NI).as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RegimeError::UnboundedBandNotLast { index: 0, .. }
        ));
    }

    #[test]
    fn final_band_must_be_unbounded() {
        let it = r#"[{"threshold": 37700, "rate": 0.20}, {"threshold": 125140, "rate": 0.40}]"#;
        let err = read_regimes_json(dataset(it, NI).as_bytes()).unwrap_err();
        assert!(matches!(err, RegimeError::BoundedFinalBand { .. }));
    }

    #[test]
    fn thresholds_must_ascend() {
        let it = r#"[{"threshold": 37700, "rate": 0.20}, {"threshold": 37700, "rate": 0.40}, {"rate": 0.45}]"#;
        let err = read_regimes_json(dataset(it, NI).as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RegimeError::UnorderedThreshold { index: 1, .. }
        ));
    }

    #[test]
    fn band_missing_rate_rejected_at_parse() {
        let it = r#"[{"threshold": 37700}, {"rate": 0.40}]"#;
        let err = read_regimes_json(dataset(it, NI).as_bytes()).unwrap_err();
        assert!(matches!(err, RegimeError::Parse(_)));
    }
}
