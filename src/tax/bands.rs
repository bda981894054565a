//! Band evaluator: tax owed at a single gross income under one schedule.

use super::regime::{Schedule, TaxRegime};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Weeks per year used to annualise the weekly child benefit rates.
const WEEKS_PER_YEAR: Decimal = dec!(52);

/// Student loan repayment plan parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentLoan {
    pub threshold: Decimal,
    pub rate: Decimal,
}

/// Optional adjustments applied on top of the band walk. All default to off.
///
/// Child benefit and the childcare subsidy enter as negative tax, the
/// student loan surcharge as positive tax. None of them are technically
/// taxes, but the net position and marginal rates come out right.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdjustmentOptions {
    pub child_benefit: bool,
    pub children: u32,
    pub childcare: bool,
    pub marriage_allowance: bool,
    pub student_loan: Option<StudentLoan>,
}

/// Tax owed at `gross` under one schedule of `regime`.
///
/// Income tax applies the effective personal allowance and the gross-income
/// adjustments; NI taxes the full gross income and never sees either. Pure:
/// the regime is read-only and repeated calls give identical results.
/// Negative gross incomes are outside the contract.
pub fn evaluate(
    gross: Decimal,
    regime: &TaxRegime,
    schedule: Schedule,
    options: &AdjustmentOptions,
) -> Decimal {
    let taxable = match schedule {
        Schedule::IncomeTax => taxable_income(gross, regime, options),
        Schedule::NationalInsurance => gross,
    };

    let mut tax = Decimal::ZERO;
    let mut last_threshold = Decimal::ZERO;
    for band in regime.bands(schedule) {
        tax += (taxable.min(band.upper) - last_threshold) * band.rate;
        last_threshold = band.upper;
        if taxable <= band.upper {
            break;
        }
    }

    if schedule == Schedule::IncomeTax {
        tax += adjustments(gross, regime, options);
    }
    tax
}

/// Income tax plus employee NI at `gross`.
pub fn total_tax(gross: Decimal, regime: &TaxRegime, options: &AdjustmentOptions) -> Decimal {
    evaluate(gross, regime, Schedule::IncomeTax, options)
        + evaluate(gross, regime, Schedule::NationalInsurance, options)
}

/// Gross income less the effective personal allowance.
///
/// The withdrawal taper takes precedence over the marriage uplift: above the
/// withdrawal threshold the allowance shrinks (to zero at the floor), below
/// it the marriage allowance adds the transferred fraction when earnings sit
/// under the eligibility cap.
fn taxable_income(gross: Decimal, regime: &TaxRegime, options: &AdjustmentOptions) -> Decimal {
    let allowance = if gross > regime.allowance_withdrawal_threshold {
        (regime.personal_allowance
            - regime.allowance_withdrawal_rate * (gross - regime.allowance_withdrawal_threshold))
            .max(Decimal::ZERO)
    } else if options.marriage_allowance && gross < regime.marriage_allowance_max_earnings {
        regime.personal_allowance * (Decimal::ONE + regime.marriage_allowance)
    } else {
        regime.personal_allowance
    };
    (gross - allowance).max(Decimal::ZERO)
}

fn adjustments(gross: Decimal, regime: &TaxRegime, options: &AdjustmentOptions) -> Decimal {
    let mut adjustment = Decimal::ZERO;

    if options.child_benefit && options.children > 0 {
        let annual = WEEKS_PER_YEAR
            * (regime.child_benefit.first
                + regime.child_benefit.subsequent * Decimal::from(options.children - 1));
        if gross < regime.hicbc_start {
            adjustment -= annual;
        } else if gross > regime.hicbc_end {
            // fully withdrawn: no benefit, not an error
        } else {
            let withdrawn =
                (gross - regime.hicbc_start) / (regime.hicbc_end - regime.hicbc_start);
            adjustment -= annual * (Decimal::ONE - withdrawn);
        }
    }

    if options.childcare
        && options.children > 0
        && gross > regime.childcare_min_earnings
        && gross < regime.childcare_max_earnings
    {
        let subsidised = options.children.min(regime.childcare_max_children);
        adjustment -= regime.childcare_subsidy_per_child * Decimal::from(subsidised);
    }

    if let Some(loan) = options.student_loan {
        if gross > loan.threshold {
            adjustment += (gross - loan.threshold) * loan.rate;
        }
    }

    adjustment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::regime::{Band, ChildBenefit, UNBOUNDED};

    fn ruk_2024() -> TaxRegime {
        TaxRegime {
            name: "rUK 2024-25".to_string(),
            personal_allowance: dec!(12570),
            allowance_withdrawal_threshold: dec!(100000),
            allowance_withdrawal_rate: dec!(0.5),
            marriage_allowance: dec!(0.1),
            marriage_allowance_max_earnings: dec!(50270),
            child_benefit: ChildBenefit {
                first: dec!(25.60),
                subsequent: dec!(16.95),
            },
            hicbc_start: dec!(60000),
            hicbc_end: dec!(80000),
            childcare_min_earnings: dec!(9518),
            childcare_max_earnings: dec!(100000),
            childcare_subsidy_per_child: dec!(6500),
            childcare_max_children: 2,
            income_tax: vec![
                Band {
                    upper: dec!(37700),
                    rate: dec!(0.20),
                },
                Band {
                    upper: dec!(125140),
                    rate: dec!(0.40),
                },
                Band {
                    upper: UNBOUNDED,
                    rate: dec!(0.45),
                },
            ],
            national_insurance: vec![
                Band {
                    upper: dec!(12570),
                    rate: Decimal::ZERO,
                },
                Band {
                    upper: dec!(50270),
                    rate: dec!(0.08),
                },
                Band {
                    upper: UNBOUNDED,
                    rate: dec!(0.02),
                },
            ],
        }
    }

    fn income_tax(gross: Decimal, options: &AdjustmentOptions) -> Decimal {
        evaluate(gross, &ruk_2024(), Schedule::IncomeTax, options)
    }

    fn plan_two() -> StudentLoan {
        StudentLoan {
            threshold: dec!(27295),
            rate: dec!(0.09),
        }
    }

    #[test]
    fn income_tax_at_60k() {
        // taxable 47430: 37700 @ 20% + 9730 @ 40% = 7540 + 3892
        let tax = income_tax(dec!(60000), &AdjustmentOptions::default());
        assert_eq!(tax, dec!(11432.00));
    }

    #[test]
    fn income_below_allowance_untaxed() {
        assert_eq!(
            income_tax(dec!(10000), &AdjustmentOptions::default()),
            Decimal::ZERO
        );
    }

    #[test]
    fn allowance_tapered_above_withdrawal_threshold() {
        // allowance 12570 - 0.5 * 10000 = 7570, taxable 102430
        let tax = income_tax(dec!(110000), &AdjustmentOptions::default());
        assert_eq!(tax, dec!(33432.00));
    }

    #[test]
    fn allowance_floors_at_zero() {
        // 0.5 * 40000 far exceeds the allowance
        let tax = income_tax(dec!(140000), &AdjustmentOptions::default());
        // 37700 @ 20% + 87440 @ 40% + 14860 @ 45%
        assert_eq!(tax, dec!(49203.00));
    }

    #[test]
    fn marriage_allowance_uplift_below_earnings_cap() {
        let options = AdjustmentOptions {
            marriage_allowance: true,
            ..Default::default()
        };
        // allowance 12570 * 1.1 = 13827, taxable 16173
        assert_eq!(income_tax(dec!(30000), &options), dec!(3234.600));
    }

    #[test]
    fn marriage_allowance_ignored_above_earnings_cap() {
        let options = AdjustmentOptions {
            marriage_allowance: true,
            ..Default::default()
        };
        assert_eq!(income_tax(dec!(60000), &options), dec!(11432.00));
    }

    #[test]
    fn child_benefit_retained_in_full_below_hicbc_start() {
        let options = AdjustmentOptions {
            child_benefit: true,
            children: 3,
            ..Default::default()
        };
        // 52 * (25.60 + 2 * 16.95) = 3094
        let plain = income_tax(dec!(50000), &AdjustmentOptions::default());
        assert_eq!(income_tax(dec!(50000), &options), plain - dec!(3094));
    }

    #[test]
    fn child_benefit_tapers_across_hicbc_band() {
        let options = AdjustmentOptions {
            child_benefit: true,
            children: 3,
            ..Default::default()
        };
        let plain = income_tax(dec!(70000), &AdjustmentOptions::default());
        // halfway through the 60k..80k band: half the benefit kept
        assert_eq!(income_tax(dec!(70000), &options), plain - dec!(1547));
    }

    #[test]
    fn child_benefit_gone_above_hicbc_end() {
        let options = AdjustmentOptions {
            child_benefit: true,
            children: 3,
            ..Default::default()
        };
        let plain = income_tax(dec!(90000), &AdjustmentOptions::default());
        assert_eq!(income_tax(dec!(90000), &options), plain);
    }

    #[test]
    fn child_benefit_continuous_at_band_edges() {
        let options = AdjustmentOptions {
            child_benefit: true,
            children: 1,
            ..Default::default()
        };
        let regime = ruk_2024();
        // at the start of the band the full benefit is retained
        let at_start = evaluate(dec!(60000), &regime, Schedule::IncomeTax, &options);
        let just_below = evaluate(dec!(59999), &regime, Schedule::IncomeTax, &options);
        assert!((at_start - just_below).abs() < dec!(1));
        // at the end nothing is
        let at_end = evaluate(dec!(80000), &regime, Schedule::IncomeTax, &options);
        let just_above = evaluate(dec!(80001), &regime, Schedule::IncomeTax, &options);
        assert!((just_above - at_end).abs() < dec!(1));
    }

    #[test]
    fn childcare_subsidy_capped_at_max_children() {
        let options = AdjustmentOptions {
            childcare: true,
            children: 3,
            ..Default::default()
        };
        let plain = income_tax(dec!(50000), &AdjustmentOptions::default());
        // 3 children but only 2 subsidised
        assert_eq!(income_tax(dec!(50000), &options), plain - dec!(13000));
    }

    #[test]
    fn childcare_subsidy_outside_earnings_window() {
        let options = AdjustmentOptions {
            childcare: true,
            children: 2,
            ..Default::default()
        };
        let plain = income_tax(dec!(100000), &AdjustmentOptions::default());
        // the window is an open interval
        assert_eq!(income_tax(dec!(100000), &options), plain);
    }

    #[test]
    fn student_loan_above_threshold() {
        let options = AdjustmentOptions {
            student_loan: Some(plan_two()),
            ..Default::default()
        };
        let plain = income_tax(dec!(30000), &AdjustmentOptions::default());
        // (30000 - 27295) * 0.09
        assert_eq!(income_tax(dec!(30000), &options), plain + dec!(243.45));
    }

    #[test]
    fn student_loan_below_threshold() {
        let options = AdjustmentOptions {
            student_loan: Some(plan_two()),
            ..Default::default()
        };
        let plain = income_tax(dec!(25000), &AdjustmentOptions::default());
        assert_eq!(income_tax(dec!(25000), &options), plain);
    }

    #[test]
    fn ni_walks_gross_income_with_no_allowance() {
        let regime = ruk_2024();
        // 37700 @ 8% + 9730 @ 2%
        let ni = evaluate(
            dec!(60000),
            &regime,
            Schedule::NationalInsurance,
            &AdjustmentOptions::default(),
        );
        assert_eq!(ni, dec!(3210.60));
    }

    #[test]
    fn ni_never_sees_adjustments() {
        let regime = ruk_2024();
        let options = AdjustmentOptions {
            child_benefit: true,
            children: 3,
            childcare: true,
            marriage_allowance: true,
            student_loan: Some(plan_two()),
        };
        let with = evaluate(dec!(60000), &regime, Schedule::NationalInsurance, &options);
        let without = evaluate(
            dec!(60000),
            &regime,
            Schedule::NationalInsurance,
            &AdjustmentOptions::default(),
        );
        assert_eq!(with, without);
    }

    #[test]
    fn tax_is_monotonic_in_gross_income() {
        let regime = ruk_2024();
        let options = AdjustmentOptions::default();
        let mut previous = Decimal::ZERO;
        let mut gross = Decimal::ZERO;
        while gross <= dec!(200000) {
            let tax = total_tax(gross, &regime, &options);
            assert!(tax >= previous, "tax fell at gross {}", gross);
            previous = tax;
            gross += dec!(5000);
        }
    }

    #[test]
    fn evaluation_is_idempotent() {
        let regime = ruk_2024();
        let options = AdjustmentOptions {
            child_benefit: true,
            children: 2,
            ..Default::default()
        };
        let first = total_tax(dec!(65432), &regime, &options);
        let second = total_tax(dec!(65432), &regime, &options);
        assert_eq!(first, second);
    }
}
