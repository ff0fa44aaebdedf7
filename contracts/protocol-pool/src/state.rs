use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};
use protocol_pool_common::{Budget, ContinuousFund};

pub const CONFIG: Item<PoolConfig> = Item::new("config");
pub const DISTRIBUTION_STATE: Item<DistributionState> = Item::new("distribution_state");

/// Recipient ledger: two independent stores over the same key space.
pub const CONTINUOUS_FUNDS: Map<&Addr, ContinuousFund> = Map::new("continuous_funds");
pub const BUDGETS: Map<&Addr, Budget> = Map::new("budgets");

#[cw_serde]
pub struct PoolConfig {
    pub admin: Addr,
    /// May trigger a cycle through `ExecuteMsg::Distribute`.
    pub operator: Addr,
    /// Denom that continuous funds are streamed in
    pub denom: String,
    /// Remove expired funds and exhausted budgets after each cycle
    pub prune_inert: bool,
}

#[cw_serde]
pub struct DistributionState {
    /// Pool balance (in `denom`) left after the last cycle. Inflow for the
    /// next cycle is whatever the balance has grown by since.
    pub tracked_balance: Uint128,
    pub total_streamed: Uint128,
    pub tranches_paid: u64,
    pub last_cycle_time: Option<Timestamp>,
}
