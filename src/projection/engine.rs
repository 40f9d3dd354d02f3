//! Per-(policy, scenario) projection engine.

use super::cashflow::{ProjectionResult, YearlyCashFlow};
use crate::assumptions::{Assumptions, AssumptionMultipliers};
use crate::error::{LiveCalcError, LiveCalcResult};
use crate::policy::Policy;
use crate::scenario::Scenario;
use crate::udf::{UdfHost, UdfState};

const LIVES_FLOOR: f64 = 1e-10;

/// Configuration for a single projection run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectionConfig {
    pub multipliers: AssumptionMultipliers,
    /// Whether to build a year-by-year cash-flow trace.
    pub detailed_output: bool,
}

/// Projects one policy under one scenario, following the spec's cash-flow
/// ordering: mortality and lapse decrements after discounting the year's
/// rate, death benefit and expenses recognized at year end.
pub fn project_policy(
    policy: &Policy,
    scenario_index: usize,
    scenario: &Scenario,
    assumptions: &Assumptions,
    udf: Option<&UdfHost>,
    config: &ProjectionConfig,
) -> LiveCalcResult<ProjectionResult> {
    let horizon = policy.horizon();
    let mut trace = if config.detailed_output {
        Some(Vec::with_capacity(horizon as usize))
    } else {
        None
    };

    if horizon == 0 {
        return Ok(ProjectionResult {
            policy_id: policy.policy_id,
            scenario_index,
            npv: 0.0,
            trace,
            udf_calls: 0,
            udf_time: std::time::Duration::ZERO,
        });
    }

    let mut lives = 1.0_f64;
    let mut cumulative_discount = 1.0_f64;
    let mut npv = 0.0_f64;

    for year in 1..=horizon {
        let age = policy.attained_age(year);
        let base_qx = assumptions.mortality_rate(age, policy.gender, config.multipliers.mortality)?;
        let base_lapse = assumptions.lapse_rate(year, config.multipliers.lapse)?;
        let rate = scenario.rate(year)?;
        if 1.0 + rate <= 0.0 {
            return Err(LiveCalcError::ProjectionFailed {
                policy_id: policy.policy_id,
                scenario_index,
                reason: format!("year {year} rate {rate} makes the discount factor undefined"),
            });
        }

        let (qx, lapse_rate) = match udf {
            Some(host) if host.is_configured() => {
                let state = UdfState {
                    year,
                    lives,
                    interest_rate: rate,
                };
                let m_mort = host.adjust_mortality(policy, state);
                let m_lapse = host.adjust_lapse(policy, state);
                ((base_qx * m_mort).min(1.0), (base_lapse * m_lapse).min(1.0))
            }
            _ => (base_qx, base_lapse),
        };

        cumulative_discount /= 1.0 + rate;

        let lives_boy = lives;
        let deaths = lives_boy * qx;
        let lives_after_deaths = lives_boy - deaths;
        let lapses = lives_after_deaths * lapse_rate;

        let premium = lives_boy * policy.premium;
        let death_benefit = deaths * policy.sum_assured;
        let surrender_benefit = 0.0; // placeholder: no surrender-value modeling

        let expense_base = if year == 1 {
            assumptions
                .expenses
                .first_year_expense(policy.premium, config.multipliers.expense)
        } else {
            assumptions
                .expenses
                .renewal_expense(policy.premium, config.multipliers.expense)
        } * lives_boy;
        let claim_expense = deaths * assumptions.expenses.per_claim * config.multipliers.expense;
        let expenses_total = expense_base + claim_expense;

        let net = premium - death_benefit - surrender_benefit - expenses_total;
        let discounted = net * cumulative_discount;
        npv += discounted;

        if let Some(rows) = trace.as_mut() {
            rows.push(YearlyCashFlow {
                year,
                lives_in_force: lives_boy,
                premium,
                death_benefit,
                surrender_benefit,
                expenses: expenses_total,
                net_cash_flow: net,
                cumulative_discount_factor: cumulative_discount,
                discounted_cash_flow: discounted,
            });
        }

        lives = lives_after_deaths - lapses;
        if lives < LIVES_FLOOR {
            break;
        }
    }

    let (udf_calls, udf_time) = match udf {
        Some(host) if host.is_configured() => {
            let m = host.metrics();
            (m.calls, m.total_time)
        }
        _ => (0, std::time::Duration::ZERO),
    };

    Ok(ProjectionResult {
        policy_id: policy.policy_id,
        scenario_index,
        npv,
        trace,
        udf_calls,
        udf_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{ExpenseAssumptions, LapseTable, MortalityTable};
    use crate::policy::{Gender, ProductType, UnderwritingClass};

    fn flat_assumptions(qx: f64, lapse: f64) -> Assumptions {
        let mut male = vec![0.0; 121];
        let mut female = vec![0.0; 121];
        for i in 0..121 {
            male[i] = qx;
            female[i] = qx;
        }
        Assumptions::new(
            MortalityTable::new(male, female).unwrap(),
            LapseTable::new(vec![lapse; 50]).unwrap(),
            ExpenseAssumptions::new(0.0, 100.0, 0.0, 0.0).unwrap(),
        )
    }

    fn policy(term: u8) -> Policy {
        Policy::new(
            1,
            30,
            Gender::Male,
            100_000.0,
            1_000.0,
            term,
            ProductType::Term,
            UnderwritingClass::Standard,
        )
    }

    #[test]
    fn undefined_discount_factor_is_a_projection_failure() {
        let assumptions = flat_assumptions(0.01, 0.05);
        let mut rates = vec![0.04; 50];
        rates[0] = -1.5; // 1 + rate <= 0
        let scenario = Scenario::from_rates(rates).unwrap();
        let result = project_policy(
            &policy(5),
            3,
            &scenario,
            &assumptions,
            None,
            &ProjectionConfig::default(),
        );
        assert!(matches!(
            result,
            Err(LiveCalcError::ProjectionFailed { scenario_index: 3, .. })
        ));
    }

    #[test]
    fn zero_term_policy_has_zero_npv() {
        let assumptions = flat_assumptions(0.01, 0.05);
        let scenario = Scenario::from_rates(vec![0.04; 50]).unwrap();
        let result = project_policy(
            &policy(0),
            0,
            &scenario,
            &assumptions,
            None,
            &ProjectionConfig::default(),
        )
        .unwrap();
        assert_eq!(result.npv, 0.0);
    }

    #[test]
    fn s1_single_deterministic_projection() {
        // S1: mortality 0.01, lapse 0.05, expenses (0, 100, 0, 0), flat 4% rate.
        let assumptions = flat_assumptions(0.01, 0.05);
        let scenario = Scenario::from_rates(vec![0.04; 50]).unwrap();
        let result = project_policy(
            &policy(5),
            0,
            &scenario,
            &assumptions,
            None,
            &ProjectionConfig::default(),
        )
        .unwrap();

        let mut lives = 1.0_f64;
        let mut discount = 1.0_f64;
        let mut expected = 0.0_f64;
        for _ in 1..=5 {
            discount /= 1.04;
            let deaths = lives * 0.01;
            let premium = lives * 1000.0;
            let death_benefit = deaths * 100_000.0;
            let expense = lives * 100.0;
            let net = premium - death_benefit - expense;
            expected += net * discount;
            let after_deaths = lives - deaths;
            lives = after_deaths - after_deaths * 0.05;
        }

        assert!((result.npv - expected).abs() / expected.abs() < 1e-9);
    }

    #[test]
    fn lives_in_force_is_monotonically_non_increasing() {
        let assumptions = flat_assumptions(0.02, 0.1);
        let scenario = Scenario::from_rates(vec![0.03; 50]).unwrap();
        let mut config = ProjectionConfig::default();
        config.detailed_output = true;
        let result = project_policy(&policy(10), 0, &scenario, &assumptions, None, &config).unwrap();
        let trace = result.trace.unwrap();
        for pair in trace.windows(2) {
            assert!(pair[1].lives_in_force <= pair[0].lives_in_force);
        }
    }

    #[test]
    fn higher_mortality_lowers_npv() {
        let scenario = Scenario::from_rates(vec![0.04; 50]).unwrap();
        let base = flat_assumptions(0.01, 0.05);
        let stressed = flat_assumptions(0.02, 0.05);

        let base_result = project_policy(
            &policy(10),
            0,
            &scenario,
            &base,
            None,
            &ProjectionConfig::default(),
        )
        .unwrap();
        let stressed_result = project_policy(
            &policy(10),
            0,
            &scenario,
            &stressed,
            None,
            &ProjectionConfig::default(),
        )
        .unwrap();

        assert!(stressed_result.npv < base_result.npv);
    }
}
