use cosmwasm_std::{CheckedMultiplyFractionError, DivideByZeroError, OverflowError, StdError};
use protocol_pool_common::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    DivideByZero(#[from] DivideByZeroError),

    #[error("{0}")]
    Fraction(#[from] CheckedMultiplyFractionError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("insufficient pool balance: need {needed}, have {available}")]
    InsufficientPool {
        needed: String,
        available: String,
    },

    #[error("invalid recipient address {address}: {reason}")]
    InvalidRecipient { address: String, reason: String },

    #[error("no continuous fund registered for {recipient}")]
    ContinuousFundNotFound { recipient: String },

    #[error("no budget registered for {recipient}")]
    BudgetNotFound { recipient: String },

    #[error("cannot migrate from {stored}: not a protocol pool")]
    MigrationMismatch { stored: String },
}
