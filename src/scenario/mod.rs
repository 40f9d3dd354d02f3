//! Economic scenarios: interest-rate paths used to discount projections.

mod generator;

pub use generator::{GbmParams, ScenarioGenerator};

use crate::error::{LiveCalcError, LiveCalcResult};

const YEARS: usize = 50;

/// A single interest-rate path, one rate per projection year 1..50.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    rates: Vec<f64>,
}

impl Scenario {
    pub fn from_rates(rates: Vec<f64>) -> LiveCalcResult<Self> {
        if rates.len() != YEARS {
            return Err(LiveCalcError::DataMalformed(format!(
                "scenario must have {YEARS} yearly rates, got {}",
                rates.len()
            )));
        }
        Ok(Self { rates })
    }

    /// Rate for projection year `y` (1-based).
    pub fn rate(&self, y: u32) -> LiveCalcResult<f64> {
        if y < 1 || y as usize > YEARS {
            return Err(LiveCalcError::OutOfRange(format!(
                "scenario year {y} outside [1, {YEARS}]"
            )));
        }
        Ok(self.rates[(y - 1) as usize])
    }

    /// Cumulative discount factor through year `y`:
    /// `Π_{k=1..y} 1 / (1 + rate(k))`.
    pub fn discount_factor(&self, y: u32) -> LiveCalcResult<f64> {
        if y < 1 || y as usize > YEARS {
            return Err(LiveCalcError::OutOfRange(format!(
                "scenario year {y} outside [1, {YEARS}]"
            )));
        }
        let mut factor = 1.0;
        for k in 1..=y {
            factor /= 1.0 + self.rates[(k - 1) as usize];
        }
        Ok(factor)
    }

    /// The raw 50-element rate vector, indexed by `year - 1`.
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }
}

/// An ordered collection of scenarios; index order is significant and is
/// preserved through to the reported per-scenario NPV vector.
#[derive(Debug, Clone, Default)]
pub struct ScenarioSet {
    scenarios: Vec<Scenario>,
}

impl ScenarioSet {
    pub fn new(scenarios: Vec<Scenario>) -> Self {
        Self { scenarios }
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Scenario> {
        self.scenarios.get(index)
    }
}
