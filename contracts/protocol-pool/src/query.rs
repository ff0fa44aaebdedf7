use cosmwasm_std::{to_json_binary, Addr, Binary, Coin, Deps, Order, StdResult};
use cw_storage_plus::Bound;
use protocol_pool_common::{BudgetEntry, ContinuousFundEntry};

use crate::genesis::export_genesis;
use crate::msg::{BudgetsResponse, ContinuousFundsResponse, UnclaimedBudgetResponse};
use crate::state::{BUDGETS, CONFIG, CONTINUOUS_FUNDS, DISTRIBUTION_STATE};

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_distribution_state(deps: Deps) -> StdResult<Binary> {
    let state = DISTRIBUTION_STATE.load(deps.storage)?;
    to_json_binary(&state)
}

pub fn query_continuous_fund(deps: Deps, recipient: String) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&recipient)?;
    let fund = CONTINUOUS_FUNDS.may_load(deps.storage, &addr)?;
    to_json_binary(&fund)
}

pub fn query_continuous_funds(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_after: Option<Addr> = start_after
        .map(|addr| deps.api.addr_validate(&addr))
        .transpose()?;
    let start = start_after.as_ref().map(Bound::exclusive);

    let funds = CONTINUOUS_FUNDS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            item.map(|(recipient, fund)| ContinuousFundEntry {
                recipient: recipient.to_string(),
                fund,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&ContinuousFundsResponse { funds })
}

pub fn query_budget(deps: Deps, recipient: String) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&recipient)?;
    let budget = BUDGETS.may_load(deps.storage, &addr)?;
    to_json_binary(&budget)
}

pub fn query_budgets(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_after: Option<Addr> = start_after
        .map(|addr| deps.api.addr_validate(&addr))
        .transpose()?;
    let start = start_after.as_ref().map(Bound::exclusive);

    let budgets = BUDGETS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|item| {
            item.map(|(recipient, budget)| BudgetEntry {
                recipient: recipient.to_string(),
                budget,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&BudgetsResponse { budgets })
}

pub fn query_unclaimed_budget(deps: Deps, recipient: String) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&recipient)?;
    let budget = BUDGETS.load(deps.storage, &addr)?;

    let next_claim_from = if budget.is_exhausted() {
        None
    } else {
        Some(budget.next_claim_from.max(budget.start_time))
    };

    to_json_binary(&UnclaimedBudgetResponse {
        unclaimed_amount: Coin::new(budget.unclaimed(), budget.total_budget.denom.clone()),
        claimed_amount: budget.claimed_amount,
        total_budget: budget.total_budget,
        next_claim_from,
        period: budget.period,
        tranches_left: budget.tranches_left,
    })
}

pub fn query_export_genesis(deps: Deps) -> StdResult<Binary> {
    to_json_binary(&export_genesis(deps)?)
}
