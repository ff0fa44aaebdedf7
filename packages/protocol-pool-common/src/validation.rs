use cosmwasm_std::Decimal;
use thiserror::Error;

use crate::types::{BudgetEntry, ContinuousFundEntry, GenesisState};

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("recipient cannot be empty")]
    EmptyRecipient,

    #[error("invalid denom {denom}: {reason}")]
    InvalidDenom { denom: String, reason: String },

    #[error("continuous fund for {recipient}: cap amount cannot be zero")]
    ZeroCap { recipient: String },

    #[error("continuous fund for {recipient}: percentage cannot be zero")]
    ZeroPercentage { recipient: String },

    #[error("continuous fund for {recipient}: percentage {percentage} above one")]
    PercentageAboveOne {
        recipient: String,
        percentage: Decimal,
    },

    #[error("budget for {recipient}: total budget cannot be zero")]
    ZeroBudget { recipient: String },

    #[error("budget for {recipient}: tranches must be greater than zero")]
    ZeroTranches { recipient: String },

    #[error("budget for {recipient}: period length should be greater than zero")]
    ZeroPeriod { recipient: String },

    #[error("budget for {recipient}: claimed {claimed} exceeds total {total}")]
    OverClaimed {
        recipient: String,
        claimed: String,
        total: String,
    },

    #[error("budget for {recipient}: {left} tranches left out of {tranches}")]
    TranchesLeftOutOfRange {
        recipient: String,
        left: u64,
        tranches: u64,
    },

    #[error("budget for {recipient}: {left} left but {claimed}/{total} claimed")]
    InconsistentTerminalState {
        recipient: String,
        left: u64,
        claimed: String,
        total: String,
    },

    #[error("budget for {recipient}: schedule runs past the maximum timestamp")]
    ScheduleOverflow { recipient: String },
}

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Cosmos SDK denom rule: `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`.
pub fn validate_denom(denom: &str) -> Result<(), ValidationError> {
    let invalid = |reason: &str| ValidationError::InvalidDenom {
        denom: denom.to_string(),
        reason: reason.to_string(),
    };

    if denom.len() < 3 || denom.len() > 128 {
        return Err(invalid("length must be between 3 and 128"));
    }
    let mut chars = denom.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(invalid("must start with a letter"));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-');
    if !chars.all(allowed) {
        return Err(invalid("contains an unsupported character"));
    }
    Ok(())
}

pub fn validate_continuous_fund(entry: &ContinuousFundEntry) -> Result<(), ValidationError> {
    if entry.recipient.is_empty() {
        return Err(ValidationError::EmptyRecipient);
    }

    let fund = &entry.fund;
    if fund.cap.is_some_and(|cap| cap.is_zero()) {
        return Err(ValidationError::ZeroCap {
            recipient: entry.recipient.clone(),
        });
    }

    if fund.percentage.is_zero() {
        return Err(ValidationError::ZeroPercentage {
            recipient: entry.recipient.clone(),
        });
    }
    if fund.percentage > Decimal::one() {
        return Err(ValidationError::PercentageAboveOne {
            recipient: entry.recipient.clone(),
            percentage: fund.percentage,
        });
    }
    Ok(())
}

pub fn validate_budget(entry: &BudgetEntry) -> Result<(), ValidationError> {
    if entry.recipient.is_empty() {
        return Err(ValidationError::EmptyRecipient);
    }

    let budget = &entry.budget;
    if budget.total_budget.amount.is_zero() {
        return Err(ValidationError::ZeroBudget {
            recipient: entry.recipient.clone(),
        });
    }
    validate_denom(&budget.total_budget.denom)?;

    if budget.tranches == 0 {
        return Err(ValidationError::ZeroTranches {
            recipient: entry.recipient.clone(),
        });
    }
    if budget.period == 0 {
        return Err(ValidationError::ZeroPeriod {
            recipient: entry.recipient.clone(),
        });
    }

    if budget.claimed_amount > budget.total_budget.amount {
        return Err(ValidationError::OverClaimed {
            recipient: entry.recipient.clone(),
            claimed: budget.claimed_amount.to_string(),
            total: budget.total_budget.amount.to_string(),
        });
    }
    if budget.tranches_left > budget.tranches {
        return Err(ValidationError::TranchesLeftOutOfRange {
            recipient: entry.recipient.clone(),
            left: budget.tranches_left,
            tranches: budget.tranches,
        });
    }
    if (budget.tranches_left == 0) != (budget.claimed_amount == budget.total_budget.amount) {
        return Err(ValidationError::InconsistentTerminalState {
            recipient: entry.recipient.clone(),
            left: budget.tranches_left,
            claimed: budget.claimed_amount.to_string(),
            total: budget.total_budget.amount.to_string(),
        });
    }

    // Every remaining claim instant must be representable.
    let schedule_end = budget
        .period
        .checked_mul(NANOS_PER_SECOND)
        .and_then(|step| step.checked_mul(budget.tranches_left))
        .and_then(|span| budget.next_claim_from.nanos().checked_add(span));
    if schedule_end.is_none() {
        return Err(ValidationError::ScheduleOverflow {
            recipient: entry.recipient.clone(),
        });
    }
    Ok(())
}

/// Checks every record in `genesis`, stopping at the first invalid one.
pub fn validate_genesis(genesis: &GenesisState) -> Result<(), ValidationError> {
    for entry in &genesis.continuous_funds {
        validate_continuous_fund(entry)?;
    }
    for entry in &genesis.budgets {
        validate_budget(entry)?;
    }
    Ok(())
}
