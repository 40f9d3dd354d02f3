//! Expense assumptions: four non-negative scalars with per-year derivations.

use crate::error::{LiveCalcError, LiveCalcResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpenseAssumptions {
    /// Per-policy acquisition expense, incurred in year 1 only.
    pub acquisition: f64,
    /// Per-policy maintenance expense, incurred in years 2+.
    pub maintenance: f64,
    /// Expense as a fraction of premium, every year.
    pub pct_of_premium: f64,
    /// Per-claim expense, incurred per death.
    pub per_claim: f64,
}

impl ExpenseAssumptions {
    pub fn new(
        acquisition: f64,
        maintenance: f64,
        pct_of_premium: f64,
        per_claim: f64,
    ) -> LiveCalcResult<Self> {
        if [acquisition, maintenance, pct_of_premium, per_claim]
            .iter()
            .any(|v| *v < 0.0)
        {
            return Err(LiveCalcError::DataMalformed(
                "expense assumptions must be non-negative".to_string(),
            ));
        }
        Ok(Self {
            acquisition,
            maintenance,
            pct_of_premium,
            per_claim,
        })
    }

    /// Per-policy expense base for year 1, excluding the per-claim term.
    pub fn first_year_expense(&self, premium: f64, multiplier: f64) -> f64 {
        (self.acquisition + self.maintenance + self.pct_of_premium * premium) * multiplier
    }

    /// Per-policy expense base for years 2+, excluding the per-claim term.
    pub fn renewal_expense(&self, premium: f64, multiplier: f64) -> f64 {
        (self.maintenance + self.pct_of_premium * premium) * multiplier
    }
}
