//! CSV-based assumption loading.
//!
//! Loads the three assumption entities from individual CSV files in a
//! directory: `mortality.csv` (dense `age,male_qx,female_qx` grid),
//! `lapse.csv` (`year,rate`), and `expenses.csv` (single row of four
//! scalars).

use super::{ExpenseAssumptions, LapseTable, MortalityTable};
use crate::error::{LiveCalcError, LiveCalcResult};
use std::path::Path;

/// Default directory assumption CSVs are read from when no path is given.
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

fn load_mortality(path: &Path) -> LiveCalcResult<MortalityTable> {
    let mut reader = csv::Reader::from_path(path.join("mortality.csv"))?;
    let mut male = vec![0.0; 121];
    let mut female = vec![0.0; 121];

    for result in reader.records() {
        let record = result?;
        let age: usize = record[0]
            .parse()
            .map_err(|_| LiveCalcError::DataMalformed(format!("bad age in mortality.csv: {}", &record[0])))?;
        let male_qx: f64 = record[1]
            .parse()
            .map_err(|_| LiveCalcError::DataMalformed("bad male_qx in mortality.csv".to_string()))?;
        let female_qx: f64 = record[2]
            .parse()
            .map_err(|_| LiveCalcError::DataMalformed("bad female_qx in mortality.csv".to_string()))?;

        if age >= male.len() {
            return Err(LiveCalcError::DataMalformed(format!(
                "mortality.csv age {age} exceeds table ceiling"
            )));
        }
        male[age] = male_qx;
        female[age] = female_qx;
    }

    MortalityTable::new(male, female)
}

fn load_lapse(path: &Path) -> LiveCalcResult<LapseTable> {
    let mut reader = csv::Reader::from_path(path.join("lapse.csv"))?;
    let mut rates = vec![0.0; 50];

    for result in reader.records() {
        let record = result?;
        let year: usize = record[0]
            .parse()
            .map_err(|_| LiveCalcError::DataMalformed(format!("bad year in lapse.csv: {}", &record[0])))?;
        let rate: f64 = record[1]
            .parse()
            .map_err(|_| LiveCalcError::DataMalformed("bad rate in lapse.csv".to_string()))?;

        if year < 1 || year > rates.len() {
            return Err(LiveCalcError::DataMalformed(format!(
                "lapse.csv year {year} outside [1, {}]",
                rates.len()
            )));
        }
        rates[year - 1] = rate;
    }

    LapseTable::new(rates)
}

fn load_expenses(path: &Path) -> LiveCalcResult<ExpenseAssumptions> {
    let mut reader = csv::Reader::from_path(path.join("expenses.csv"))?;
    let record = reader
        .records()
        .next()
        .ok_or_else(|| LiveCalcError::DataMalformed("expenses.csv has no data row".to_string()))??;

    let parse = |i: usize, field: &str| -> LiveCalcResult<f64> {
        record[i]
            .parse()
            .map_err(|_| LiveCalcError::DataMalformed(format!("bad {field} in expenses.csv")))
    };

    ExpenseAssumptions::new(
        parse(0, "acquisition")?,
        parse(1, "maintenance")?,
        parse(2, "pct_of_premium")?,
        parse(3, "claim_expense")?,
    )
}

/// All three assumption tables, loaded from CSV files in `path`.
#[derive(Debug, Clone)]
pub struct LoadedAssumptions {
    pub mortality: MortalityTable,
    pub lapse: LapseTable,
    pub expenses: ExpenseAssumptions,
}

impl LoadedAssumptions {
    pub fn load_from(path: &Path) -> LiveCalcResult<Self> {
        Ok(Self {
            mortality: load_mortality(path)?,
            lapse: load_lapse(path)?,
            expenses: load_expenses(path)?,
        })
    }
}
