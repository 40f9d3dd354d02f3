//! Policy domain types: the in-force contracts a valuation runs over.

mod data;
mod loader;

pub use data::{Gender, Policy, ProductType, UnderwritingClass};
pub use loader::{load_policies, load_policies_from_reader};
