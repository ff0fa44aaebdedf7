use cosmwasm_std::{Deps, DepsMut, Order, StdResult};
use protocol_pool_common::{BudgetEntry, ContinuousFundEntry, GenesisState};

use crate::error::ContractError;
use crate::state::{BUDGETS, CONTINUOUS_FUNDS};

/// Writes every genesis record into the recipient ledger.
/// Aborts on the first recipient that does not decode to a valid address.
pub fn init_genesis(deps: DepsMut, genesis: &GenesisState) -> Result<(), ContractError> {
    for entry in &genesis.continuous_funds {
        let recipient = deps.api.addr_validate(&entry.recipient)?;
        CONTINUOUS_FUNDS.save(deps.storage, &recipient, &entry.fund)?;
    }
    for entry in &genesis.budgets {
        let recipient = deps.api.addr_validate(&entry.recipient)?;
        BUDGETS.save(deps.storage, &recipient, &entry.budget)?;
    }
    Ok(())
}

pub fn export_genesis(deps: Deps) -> StdResult<GenesisState> {
    let continuous_funds = CONTINUOUS_FUNDS
        .range(deps.storage, None, None, Order::Ascending)
        .map(|item| {
            item.map(|(recipient, fund)| ContinuousFundEntry {
                recipient: recipient.to_string(),
                fund,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;

    let budgets = BUDGETS
        .range(deps.storage, None, None, Order::Ascending)
        .map(|item| {
            item.map(|(recipient, budget)| BudgetEntry {
                recipient: recipient.to_string(),
                budget,
            })
        })
        .collect::<StdResult<Vec<_>>>()?;

    Ok(GenesisState::new(continuous_funds, budgets))
}
