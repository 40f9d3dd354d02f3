//! Policy data structures for the in-force portfolio.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Gender of the policyholder, used to index into the mortality grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

/// Policy form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductType {
    Term,
    WholeLife,
    Endowment,
}

/// Underwriting class, exposed to UDFs via `attributes` lookup but not
/// otherwise used by the core projection math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnderwritingClass {
    Standard,
    Smoker,
    NonSmoker,
    Preferred,
    Substandard,
}

/// A single in-force life-insurance contract.
///
/// Immutable for the duration of a valuation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Unique policy identifier.
    pub policy_id: u64,

    /// Entry age, 0 through 120.
    pub entry_age: u8,

    pub gender: Gender,

    /// Non-negative sum assured (death benefit at face value).
    pub sum_assured: f64,

    /// Non-negative annual premium.
    pub premium: f64,

    /// Term in whole years, 0 through 50. A term of 0 is a degenerate
    /// policy with no projection years and NPV 0.
    pub term: u8,

    pub product_type: ProductType,

    pub underwriting_class: UnderwritingClass,

    /// Free-form string attributes consulted by UDFs. Not used by the
    /// core projection algorithm itself.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Policy {
    pub fn new(
        policy_id: u64,
        entry_age: u8,
        gender: Gender,
        sum_assured: f64,
        premium: f64,
        term: u8,
        product_type: ProductType,
        underwriting_class: UnderwritingClass,
    ) -> Self {
        Self {
            policy_id,
            entry_age,
            gender,
            sum_assured,
            premium,
            term,
            product_type,
            underwriting_class,
            attributes: HashMap::new(),
        }
    }

    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Attained age at projection year `y` (1-based), saturated at 120.
    pub fn attained_age(&self, y: u32) -> u8 {
        let raw = self.entry_age as u32 + y.saturating_sub(1);
        raw.min(120) as u8
    }

    /// Projection horizon in years, clipped to the table ceiling of 50.
    pub fn horizon(&self) -> u32 {
        (self.term as u32).min(50)
    }
}
