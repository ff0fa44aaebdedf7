pub mod contract;
pub mod distribution;
pub mod error;
pub mod execute;
pub mod genesis;
pub mod ledger;
pub mod msg;
pub mod query;
pub mod state;

pub use crate::error::ContractError;
