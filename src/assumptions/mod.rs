//! Actuarial assumption tables: mortality, lapse, and expenses.

mod expenses;
mod lapse;
mod loader;
mod mortality;

pub use expenses::ExpenseAssumptions;
pub use lapse::LapseTable;
pub use loader::{LoadedAssumptions, DEFAULT_ASSUMPTIONS_PATH};
pub use mortality::MortalityTable;

use crate::error::LiveCalcResult;
use crate::policy::Gender;
use std::path::Path;

/// Run-level scalar multipliers applied to the base assumption tables
/// before any UDF adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssumptionMultipliers {
    pub mortality: f64,
    pub lapse: f64,
    pub expense: f64,
}

impl Default for AssumptionMultipliers {
    fn default() -> Self {
        Self {
            mortality: 1.0,
            lapse: 1.0,
            expense: 1.0,
        }
    }
}

/// The full set of assumptions a valuation run consumes.
#[derive(Debug, Clone)]
pub struct Assumptions {
    pub mortality: MortalityTable,
    pub lapse: LapseTable,
    pub expenses: ExpenseAssumptions,
}

impl Assumptions {
    pub fn new(mortality: MortalityTable, lapse: LapseTable, expenses: ExpenseAssumptions) -> Self {
        Self {
            mortality,
            lapse,
            expenses,
        }
    }

    /// Load assumptions from CSV files in the default directory.
    pub fn from_csv() -> LiveCalcResult<Self> {
        Self::from_csv_path(Path::new(DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load assumptions from CSV files in a specific directory.
    pub fn from_csv_path(path: &Path) -> LiveCalcResult<Self> {
        let loaded = LoadedAssumptions::load_from(path)?;
        Ok(Self {
            mortality: loaded.mortality,
            lapse: loaded.lapse,
            expenses: loaded.expenses,
        })
    }

    pub fn mortality_rate(
        &self,
        age: u8,
        gender: Gender,
        multiplier: f64,
    ) -> LiveCalcResult<f64> {
        self.mortality.get(age, gender, multiplier)
    }

    pub fn lapse_rate(&self, year: u32, multiplier: f64) -> LiveCalcResult<f64> {
        self.lapse.get(year, multiplier)
    }
}
