use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Coin, Decimal, Timestamp, Uint128};

/// A perpetual stream of a percentage of pool inflow to one recipient.
#[cw_serde]
pub struct ContinuousFund {
    /// Fraction of each cycle's distributable inflow, in (0, 1].
    pub percentage: Decimal,
    /// Lifetime ceiling on `distributed`, in the pool denom.
    pub cap: Option<Uint128>,
    /// Streaming stops once block time reaches this instant.
    pub expiry: Option<Timestamp>,
    /// Cumulative amount paid to the recipient so far.
    #[serde(default)]
    pub distributed: Uint128,
}

impl ContinuousFund {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        matches!(self.expiry, Some(expiry) if now >= expiry)
    }

    /// Remaining room under the cap, or `None` when uncapped.
    pub fn headroom(&self) -> Option<Uint128> {
        self.cap.map(|cap| cap.saturating_sub(self.distributed))
    }
}

/// A fixed grant paid out in equal tranches, one per period.
#[cw_serde]
pub struct Budget {
    pub total_budget: Coin,
    pub claimed_amount: Uint128,
    pub start_time: Timestamp,
    pub next_claim_from: Timestamp,
    /// Seconds between tranches.
    pub period: u64,
    pub tranches: u64,
    pub tranches_left: u64,
}

impl Budget {
    /// A fresh budget whose first tranche is claimable at `start_time`.
    pub fn new(total_budget: Coin, start_time: Timestamp, period: u64, tranches: u64) -> Self {
        Budget {
            total_budget,
            claimed_amount: Uint128::zero(),
            start_time,
            next_claim_from: start_time,
            period,
            tranches,
            tranches_left: tranches,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.tranches_left == 0
    }

    pub fn unclaimed(&self) -> Uint128 {
        self.total_budget.amount.saturating_sub(self.claimed_amount)
    }
}

#[cw_serde]
pub struct ContinuousFundEntry {
    pub recipient: String,
    pub fund: ContinuousFund,
}

#[cw_serde]
pub struct BudgetEntry {
    pub recipient: String,
    pub budget: Budget,
}

/// Import/export form of the whole recipient ledger.
#[cw_serde]
#[derive(Default)]
pub struct GenesisState {
    pub continuous_funds: Vec<ContinuousFundEntry>,
    pub budgets: Vec<BudgetEntry>,
}

impl GenesisState {
    pub fn new(continuous_funds: Vec<ContinuousFundEntry>, budgets: Vec<BudgetEntry>) -> Self {
        GenesisState {
            continuous_funds,
            budgets,
        }
    }
}
