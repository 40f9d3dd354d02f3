//! Little-endian, fixed-width binary (de)serialization for the domain
//! entities that cross a process boundary as raw bytes rather than CSV/JSON.
//!
//! Every entity writes/reads as a flat record (or count-prefixed list of
//! records); there is no tagging, versioning, or variable-length encoding.
//! A reader that runs off the end of its input raises `TruncatedStream`
//! rather than panicking or silently zero-filling.

use crate::assumptions::{ExpenseAssumptions, LapseTable, MortalityTable};
use crate::error::{LiveCalcError, LiveCalcResult};
use crate::policy::{Gender, Policy, ProductType, UnderwritingClass};
use crate::scenario::{Scenario, ScenarioSet};

const POLICY_RECORD_LEN: usize = 32;
const MORTALITY_AGES: usize = 121;
const LAPSE_YEARS: usize = 50;
const SCENARIO_YEARS: usize = 50;

fn need(buf: &[u8], at: usize, len: usize) -> LiveCalcResult<()> {
    if buf.len() < at.saturating_add(len) {
        return Err(LiveCalcError::TruncatedStream {
            expected: at + len,
            got: buf.len(),
        });
    }
    Ok(())
}

/// A read cursor over a byte slice, bounds-checked on every read.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_u8(&mut self) -> LiveCalcResult<u8> {
        need(self.buf, self.pos, 1)?;
        let v = self.buf[self.pos];
        self.pos += 1;
        Ok(v)
    }

    fn read_u32(&mut self) -> LiveCalcResult<u32> {
        need(self.buf, self.pos, 4)?;
        let v = u32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        Ok(v)
    }

    fn read_u64(&mut self) -> LiveCalcResult<u64> {
        need(self.buf, self.pos, 8)?;
        let v = u64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        Ok(v)
    }

    fn read_f64(&mut self) -> LiveCalcResult<f64> {
        need(self.buf, self.pos, 8)?;
        let v = f64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        Ok(v)
    }

    fn skip(&mut self, n: usize) -> LiveCalcResult<()> {
        need(self.buf, self.pos, n)?;
        self.pos += n;
        Ok(())
    }

    fn read_f64_vec(&mut self, n: usize) -> LiveCalcResult<Vec<f64>> {
        (0..n).map(|_| self.read_f64()).collect()
    }
}

fn gender_code(g: Gender) -> u8 {
    match g {
        Gender::Male => 0,
        Gender::Female => 1,
    }
}

fn gender_from_code(code: u8) -> LiveCalcResult<Gender> {
    match code {
        0 => Ok(Gender::Male),
        1 => Ok(Gender::Female),
        other => Err(LiveCalcError::DataMalformed(format!(
            "unknown gender code: {other}"
        ))),
    }
}

fn product_type_code(p: ProductType) -> u8 {
    match p {
        ProductType::Term => 0,
        ProductType::WholeLife => 1,
        ProductType::Endowment => 2,
    }
}

fn product_type_from_code(code: u8) -> LiveCalcResult<ProductType> {
    match code {
        0 => Ok(ProductType::Term),
        1 => Ok(ProductType::WholeLife),
        2 => Ok(ProductType::Endowment),
        other => Err(LiveCalcError::DataMalformed(format!(
            "unknown product_type code: {other}"
        ))),
    }
}

fn underwriting_class_code(u: UnderwritingClass) -> u8 {
    match u {
        UnderwritingClass::Standard => 0,
        UnderwritingClass::Smoker => 1,
        UnderwritingClass::NonSmoker => 2,
        UnderwritingClass::Preferred => 3,
        UnderwritingClass::Substandard => 4,
    }
}

fn underwriting_class_from_code(code: u8) -> LiveCalcResult<UnderwritingClass> {
    match code {
        0 => Ok(UnderwritingClass::Standard),
        1 => Ok(UnderwritingClass::Smoker),
        2 => Ok(UnderwritingClass::NonSmoker),
        3 => Ok(UnderwritingClass::Preferred),
        4 => Ok(UnderwritingClass::Substandard),
        other => Err(LiveCalcError::DataMalformed(format!(
            "unknown underwriting_class code: {other}"
        ))),
    }
}

/// Encodes a single policy as a 32-byte record. `attributes` is not part of
/// the binary form; only the fixed actuarial fields cross this wire.
///
/// Layout: `policy_id:u64 | entry_age:u8 | gender:u8 | product_type:u8 |
/// underwriting_class:u8 | term:u8 | pad:3 | sum_assured:f64 | premium:f64`.
fn encode_policy(policy: &Policy, out: &mut Vec<u8>) {
    out.extend_from_slice(&policy.policy_id.to_le_bytes());
    out.push(policy.entry_age);
    out.push(gender_code(policy.gender));
    out.push(product_type_code(policy.product_type));
    out.push(underwriting_class_code(policy.underwriting_class));
    out.push(policy.term);
    out.extend_from_slice(&[0u8; 3]);
    out.extend_from_slice(&policy.sum_assured.to_le_bytes());
    out.extend_from_slice(&policy.premium.to_le_bytes());
}

fn decode_policy(cursor: &mut Cursor) -> LiveCalcResult<Policy> {
    let policy_id = cursor.read_u64()?;
    let entry_age = cursor.read_u8()?;
    let gender = gender_from_code(cursor.read_u8()?)?;
    let product_type = product_type_from_code(cursor.read_u8()?)?;
    let underwriting_class = underwriting_class_from_code(cursor.read_u8()?)?;
    let term = cursor.read_u8()?;
    cursor.skip(3)?;
    let sum_assured = cursor.read_f64()?;
    let premium = cursor.read_f64()?;
    Ok(Policy::new(
        policy_id,
        entry_age,
        gender,
        sum_assured,
        premium,
        term,
        product_type,
        underwriting_class,
    ))
}

/// Serializes a `uint32` count followed by one 32-byte record per policy.
pub fn serialize_policies(policies: &[Policy]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + policies.len() * POLICY_RECORD_LEN);
    out.extend_from_slice(&(policies.len() as u32).to_le_bytes());
    for policy in policies {
        encode_policy(policy, &mut out);
    }
    out
}

pub fn deserialize_policies(buf: &[u8]) -> LiveCalcResult<Vec<Policy>> {
    let mut cursor = Cursor::new(buf);
    let count = cursor.read_u32()? as usize;
    (0..count).map(|_| decode_policy(&mut cursor)).collect()
}

/// Serializes a mortality table as 242 `f64`s: 121 male `qx` followed by
/// 121 female `qx`, age-indexed. No count prefix; this is a single entity.
pub fn serialize_mortality_table(table: &MortalityTable) -> Vec<u8> {
    let mut out = Vec::with_capacity((2 * MORTALITY_AGES) * 8);
    for q in table.male().iter().chain(table.female().iter()) {
        out.extend_from_slice(&q.to_le_bytes());
    }
    out
}

pub fn deserialize_mortality_table(buf: &[u8]) -> LiveCalcResult<MortalityTable> {
    let mut cursor = Cursor::new(buf);
    let flat = cursor.read_f64_vec(2 * MORTALITY_AGES)?;
    MortalityTable::from_flat(&flat)
}

/// Serializes a lapse table as its raw 50 `f64` rates, year-indexed. No
/// count prefix.
pub fn serialize_lapse_table(table: &LapseTable) -> Vec<u8> {
    let mut out = Vec::with_capacity(LAPSE_YEARS * 8);
    for r in table.rates() {
        out.extend_from_slice(&r.to_le_bytes());
    }
    out
}

pub fn deserialize_lapse_table(buf: &[u8]) -> LiveCalcResult<LapseTable> {
    let mut cursor = Cursor::new(buf);
    let rates = cursor.read_f64_vec(LAPSE_YEARS)?;
    LapseTable::new(rates)
}

/// Serializes expense assumptions as 4 `f64`s: acquisition, maintenance,
/// pct_of_premium, per_claim, in that order. No count prefix.
pub fn serialize_expense_assumptions(expenses: &ExpenseAssumptions) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 * 8);
    out.extend_from_slice(&expenses.acquisition.to_le_bytes());
    out.extend_from_slice(&expenses.maintenance.to_le_bytes());
    out.extend_from_slice(&expenses.pct_of_premium.to_le_bytes());
    out.extend_from_slice(&expenses.per_claim.to_le_bytes());
    out
}

pub fn deserialize_expense_assumptions(buf: &[u8]) -> LiveCalcResult<ExpenseAssumptions> {
    let mut cursor = Cursor::new(buf);
    let acquisition = cursor.read_f64()?;
    let maintenance = cursor.read_f64()?;
    let pct_of_premium = cursor.read_f64()?;
    let per_claim = cursor.read_f64()?;
    ExpenseAssumptions::new(acquisition, maintenance, pct_of_premium, per_claim)
}

fn encode_scenario(scenario: &Scenario, out: &mut Vec<u8>) {
    for r in scenario.rates() {
        out.extend_from_slice(&r.to_le_bytes());
    }
}

fn decode_scenario(cursor: &mut Cursor) -> LiveCalcResult<Scenario> {
    let rates = cursor.read_f64_vec(SCENARIO_YEARS)?;
    Scenario::from_rates(rates)
}

/// Serializes a `uint32` count followed by one 50-`f64` record per scenario.
pub fn serialize_scenario_set(set: &ScenarioSet) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + set.len() * SCENARIO_YEARS * 8);
    out.extend_from_slice(&(set.len() as u32).to_le_bytes());
    for scenario in set.iter() {
        encode_scenario(scenario, &mut out);
    }
    out
}

pub fn deserialize_scenario_set(buf: &[u8]) -> LiveCalcResult<ScenarioSet> {
    let mut cursor = Cursor::new(buf);
    let count = cursor.read_u32()? as usize;
    let scenarios = (0..count)
        .map(|_| decode_scenario(&mut cursor))
        .collect::<LiveCalcResult<Vec<_>>>()?;
    Ok(ScenarioSet::new(scenarios))
}
