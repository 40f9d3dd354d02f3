//! Load policies from the normalized tabular shape described in the
//! external-interfaces contract: `policy_id, age, gender, sum_assured,
//! premium, term, product_type, underwriting_class[, arbitrary attrs...]`.

use super::{Gender, Policy, ProductType, UnderwritingClass};
use crate::error::{LiveCalcError, LiveCalcResult};
use csv::Reader;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    policy_id: u64,
    age: u8,
    gender: String,
    sum_assured: f64,
    premium: f64,
    term: u8,
    product_type: String,
    underwriting_class: String,
    #[serde(flatten)]
    attrs: HashMap<String, String>,
}

fn parse_gender(raw: &str) -> LiveCalcResult<Gender> {
    match raw {
        "M" | "Male" | "0" => Ok(Gender::Male),
        "F" | "Female" | "1" => Ok(Gender::Female),
        other => Err(LiveCalcError::DataMalformed(format!(
            "unknown gender: {other}"
        ))),
    }
}

fn parse_product_type(raw: &str) -> LiveCalcResult<ProductType> {
    match raw {
        "Term" | "0" => Ok(ProductType::Term),
        "WholeLife" | "1" => Ok(ProductType::WholeLife),
        "Endowment" | "2" => Ok(ProductType::Endowment),
        other => Err(LiveCalcError::DataMalformed(format!(
            "unknown product_type: {other}"
        ))),
    }
}

fn parse_underwriting_class(raw: &str) -> LiveCalcResult<UnderwritingClass> {
    match raw {
        "Standard" | "0" => Ok(UnderwritingClass::Standard),
        "Smoker" | "1" => Ok(UnderwritingClass::Smoker),
        "NonSmoker" | "2" => Ok(UnderwritingClass::NonSmoker),
        "Preferred" | "3" => Ok(UnderwritingClass::Preferred),
        "Substandard" | "4" => Ok(UnderwritingClass::Substandard),
        other => Err(LiveCalcError::DataMalformed(format!(
            "unknown underwriting_class: {other}"
        ))),
    }
}

impl CsvRow {
    fn into_policy(self) -> LiveCalcResult<Policy> {
        Ok(Policy {
            policy_id: self.policy_id,
            entry_age: self.age,
            gender: parse_gender(&self.gender)?,
            sum_assured: self.sum_assured,
            premium: self.premium,
            term: self.term,
            product_type: parse_product_type(&self.product_type)?,
            underwriting_class: parse_underwriting_class(&self.underwriting_class)?,
            attributes: self.attrs,
        })
    }
}

/// Load all policies from a CSV file at `path`.
pub fn load_policies<P: AsRef<Path>>(path: P) -> LiveCalcResult<Vec<Policy>> {
    let reader = Reader::from_path(path)?;
    load_policies_from_reader(reader.into_inner())
}

/// Load policies from any reader (string buffer, network stream, ...).
pub fn load_policies_from_reader<R: std::io::Read>(reader: R) -> LiveCalcResult<Vec<Policy>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut policies = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        policies.push(row.into_policy()?);
    }

    Ok(policies)
}
