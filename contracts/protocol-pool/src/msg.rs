use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Coin, Timestamp, Uint128};
use protocol_pool_common::{Budget, BudgetEntry, ContinuousFund, ContinuousFundEntry, GenesisState};

use crate::state::{DistributionState, PoolConfig};

#[cw_serde]
pub struct InstantiateMsg {
    pub operator: String,
    /// Denom continuous funds are streamed in, e.g. "ustake"
    pub denom: String,
    #[serde(default)]
    pub prune_inert: bool,
    /// Recipient records to import before the first cycle.
    pub genesis: Option<GenesisState>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Run a distribution cycle at the current block time. Operator only.
    Distribute {},
    /// Remove a continuous fund. Admin only.
    CancelContinuousFund { recipient: String },
    /// Remove a budget, forfeiting its unclaimed tranches. Admin only.
    CancelBudget { recipient: String },
    /// Update configuration. Admin only.
    UpdateConfig {
        admin: Option<String>,
        operator: Option<String>,
        prune_inert: Option<bool>,
    },
}

pub struct UpdateConfigParams {
    pub admin: Option<String>,
    pub operator: Option<String>,
    pub prune_inert: Option<bool>,
}

/// Privileged calls made by the chain itself.
#[cw_serde]
pub enum SudoMsg {
    /// Once-per-block trigger for a distribution cycle.
    EndBlock {},
}

#[cw_serde]
#[derive(Default)]
pub struct MigrateMsg {
    /// Switch the pruning policy as part of the upgrade.
    pub prune_inert: Option<bool>,
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(PoolConfig)]
    Config {},
    #[returns(DistributionState)]
    DistributionState {},
    #[returns(Option<ContinuousFund>)]
    ContinuousFund { recipient: String },
    #[returns(ContinuousFundsResponse)]
    ContinuousFunds {
        start_after: Option<String>,
        limit: Option<u32>,
    },
    #[returns(Option<Budget>)]
    Budget { recipient: String },
    #[returns(BudgetsResponse)]
    Budgets {
        start_after: Option<String>,
        limit: Option<u32>,
    },
    #[returns(UnclaimedBudgetResponse)]
    UnclaimedBudget { recipient: String },
    #[returns(GenesisState)]
    ExportGenesis {},
}

#[cw_serde]
pub struct ContinuousFundsResponse {
    pub funds: Vec<ContinuousFundEntry>,
}

#[cw_serde]
pub struct BudgetsResponse {
    pub budgets: Vec<BudgetEntry>,
}

#[cw_serde]
pub struct UnclaimedBudgetResponse {
    pub total_budget: Coin,
    pub claimed_amount: Uint128,
    pub unclaimed_amount: Coin,
    /// `None` once every tranche has been paid
    pub next_claim_from: Option<Timestamp>,
    pub period: u64,
    pub tranches_left: u64,
}
