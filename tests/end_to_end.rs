//! Integration tests against the public API, mirroring the documented
//! end-to-end scenarios for the valuation engine.

use approx::assert_relative_eq;
use livecalc::{
    run_valuation, AssumptionMultipliers, Assumptions, Gender, Policy, ProductType, Scenario,
    ScenarioGenerator, ScenarioSet, UnderwritingClass, ValuationConfig,
};

fn flat_assumptions(qx: f64, lapse: f64) -> Assumptions {
    Assumptions::new(
        livecalc::MortalityTable::new(vec![qx; 121], vec![qx; 121]).unwrap(),
        livecalc::LapseTable::new(vec![lapse; 50]).unwrap(),
        livecalc::ExpenseAssumptions::new(0.0, 100.0, 0.0, 0.0).unwrap(),
    )
}

fn policy(id: u64, term: u8) -> Policy {
    Policy::new(
        id,
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
fn s1_single_policy_matches_hand_computed_npv() {
    let assumptions = flat_assumptions(0.01, 0.05);
    let scenarios = ScenarioSet::new(vec![Scenario::from_rates(vec![0.04; 50]).unwrap()]);
    let result = run_valuation(
        &[policy(1, 5)],
        &assumptions,
        &scenarios,
        None,
        &ValuationConfig::default(),
        None,
    )
    .unwrap();

    let mut lives = 1.0_f64;
    let mut discount = 1.0_f64;
    let mut expected = 0.0_f64;
    for _ in 1..=5 {
        discount /= 1.04;
        let deaths = lives * 0.01;
        let net = lives * 1000.0 - deaths * 100_000.0 - lives * 100.0;
        expected += net * discount;
        let after_deaths = lives - deaths;
        lives = after_deaths - after_deaths * 0.05;
    }

    assert_relative_eq!(result.mean_npv, expected, max_relative = 1e-9);
    assert_eq!(result.scenarios_failed, 0);
}

#[test]
fn s2_zero_term_policy_contributes_zero() {
    let assumptions = flat_assumptions(0.01, 0.05);
    let scenarios = ScenarioSet::new(vec![Scenario::from_rates(vec![0.04; 50]).unwrap()]);
    let result = run_valuation(
        &[policy(1, 0)],
        &assumptions,
        &scenarios,
        None,
        &ValuationConfig::default(),
        None,
    )
    .unwrap();
    assert_eq!(result.mean_npv, 0.0);
}

#[test]
fn s3_zero_volatility_scenarios_are_flat() {
    let params = livecalc::GbmParams {
        initial_rate: 0.03,
        drift: 0.0,
        volatility: 0.0,
        min: 0.0,
        max: 0.2,
    };
    let set = ScenarioGenerator::generate(100, params, 42).unwrap();
    for scenario in set.iter() {
        for y in 1..=50 {
            assert_relative_eq!(scenario.rate(y).unwrap(), 0.03, epsilon = 1e-12);
        }
    }
}

#[test]
fn s4_same_seed_reproduces_bit_identical_scenarios() {
    let params = livecalc::GbmParams {
        initial_rate: 0.04,
        drift: 0.0,
        volatility: 0.015,
        min: 0.0,
        max: 0.2,
    };
    let a = ScenarioGenerator::generate(500, params, 7).unwrap();
    let b = ScenarioGenerator::generate(500, params, 7).unwrap();
    for (sa, sb) in a.iter().zip(b.iter()) {
        for y in 1..=50 {
            assert_eq!(sa.rate(y).unwrap().to_bits(), sb.rate(y).unwrap().to_bits());
        }
    }
}

#[test]
fn s5_higher_mortality_multiplier_lowers_mean_npv() {
    let assumptions = flat_assumptions(0.01, 0.05);
    let policies: Vec<Policy> = (1..=20).map(|id| policy(id, 15)).collect();
    let scenarios = ScenarioSet::new(
        (0..10)
            .map(|_| Scenario::from_rates(vec![0.03; 50]).unwrap())
            .collect(),
    );

    let baseline = run_valuation(
        &policies,
        &assumptions,
        &scenarios,
        None,
        &ValuationConfig::default(),
        None,
    )
    .unwrap();

    let stressed_config = ValuationConfig {
        multipliers: AssumptionMultipliers {
            mortality: 2.0,
            ..Default::default()
        },
        detailed_output: false,
    };
    let stressed = run_valuation(
        &policies,
        &assumptions,
        &scenarios,
        None,
        &stressed_config,
        None,
    )
    .unwrap();

    assert!(stressed.mean_npv < baseline.mean_npv);
}

#[test]
fn s6_one_bad_scenario_is_excluded_from_statistics() {
    let assumptions = flat_assumptions(0.01, 0.05);

    // Policy 17 has a 50-year horizon and is the only one that reaches the
    // corrupted rate year; every other policy's horizon is too short to
    // see it, so the failure is isolated to one (policy, scenario) pair.
    let mut policies: Vec<Policy> = (1..=20).map(|id| policy(id, 5)).collect();
    policies[16] = policy(17, 50);

    let good = Scenario::from_rates(vec![0.04; 50]).unwrap();
    let mut bad_rates = vec![0.04; 50];
    bad_rates[29] = -1.5; // undefined discount factor at year 30
    let bad = Scenario::from_rates(bad_rates).unwrap();

    let scenarios_with_fault = ScenarioSet::new(vec![good.clone(), good.clone(), bad]);
    let scenarios_baseline = ScenarioSet::new(vec![good.clone(), good.clone()]);

    let faulty = run_valuation(
        &policies,
        &assumptions,
        &scenarios_with_fault,
        None,
        &ValuationConfig::default(),
        None,
    )
    .unwrap();
    let baseline = run_valuation(
        &policies,
        &assumptions,
        &scenarios_baseline,
        None,
        &ValuationConfig::default(),
        None,
    )
    .unwrap();

    assert_eq!(faulty.scenarios_failed, 1);
    assert_eq!(faulty.scenario_npvs.len(), 3);
    assert_eq!(faulty.scenario_npvs[2], 0.0);
    assert_relative_eq!(faulty.mean_npv, baseline.mean_npv, max_relative = 1e-12);
}
