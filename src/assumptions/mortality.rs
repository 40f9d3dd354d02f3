//! Mortality table: probability of death `qx` by attained age and gender.

use crate::error::{LiveCalcError, LiveCalcResult};

const MAX_AGE: usize = 120;
const TABLE_LEN: usize = MAX_AGE + 1;

/// Dense mortality grid covering ages 0 through 120 for both genders.
///
/// Values are stored row-major as `(age, gender)` where `gender` selects
/// between the male and female columns; every value lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MortalityTable {
    male: Vec<f64>,
    female: Vec<f64>,
}

impl MortalityTable {
    /// Build a table from two 121-length `qx` vectors (index = age).
    pub fn new(male: Vec<f64>, female: Vec<f64>) -> LiveCalcResult<Self> {
        if male.len() != TABLE_LEN || female.len() != TABLE_LEN {
            return Err(LiveCalcError::DataMalformed(format!(
                "mortality table must have {TABLE_LEN} ages per gender, got male={}, female={}",
                male.len(),
                female.len()
            )));
        }
        if male.iter().chain(female.iter()).any(|q| !(0.0..=1.0).contains(q)) {
            return Err(LiveCalcError::DataMalformed(
                "mortality rates must lie in [0, 1]".to_string(),
            ));
        }
        Ok(Self { male, female })
    }

    /// Build a table from a flat 242-value vector in (Male 0..120, Female
    /// 0..120) row-major order, as delivered by the resolver contract.
    pub fn from_flat(values: &[f64]) -> LiveCalcResult<Self> {
        if values.len() != 2 * TABLE_LEN {
            return Err(LiveCalcError::DataMalformed(format!(
                "expected {} flat mortality values, got {}",
                2 * TABLE_LEN,
                values.len()
            )));
        }
        let male = values[..TABLE_LEN].to_vec();
        let female = values[TABLE_LEN..].to_vec();
        Self::new(male, female)
    }

    /// `qx` for `age` and `gender`, with an optional run-level multiplier
    /// applied unclamped (callers on the UDF path clamp separately).
    pub fn get(&self, age: u8, gender: super::Gender, multiplier: f64) -> LiveCalcResult<f64> {
        if age as usize > MAX_AGE {
            return Err(LiveCalcError::OutOfRange(format!(
                "age {age} exceeds mortality table ceiling of {MAX_AGE}"
            )));
        }
        let base = match gender {
            super::Gender::Male => self.male[age as usize],
            super::Gender::Female => self.female[age as usize],
        };
        Ok(base * multiplier)
    }

    /// The raw 121-element male `qx` vector, indexed by age.
    pub fn male(&self) -> &[f64] {
        &self.male
    }

    /// The raw 121-element female `qx` vector, indexed by age.
    pub fn female(&self) -> &[f64] {
        &self.female
    }
}
