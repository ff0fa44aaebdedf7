pub mod types;
pub mod validation;

pub use types::{Budget, BudgetEntry, ContinuousFund, ContinuousFundEntry, GenesisState};
pub use validation::{validate_genesis, ValidationError};
