use cosmwasm_std::{
    entry_point, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult, Uint128,
};
use cw2::{get_contract_version, set_contract_version};
use protocol_pool_common::validation::{validate_denom, validate_genesis};

use crate::error::ContractError;
use crate::execute;
use crate::genesis::init_genesis;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, SudoMsg, UpdateConfigParams};
use crate::query;
use crate::state::{DistributionState, PoolConfig, CONFIG, DISTRIBUTION_STATE};

const CONTRACT_NAME: &str = "crates.io:protocol-pool";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[entry_point]
pub fn instantiate(
    mut deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    validate_denom(&msg.denom)?;

    let config = PoolConfig {
        admin: info.sender.clone(),
        operator: deps.api.addr_validate(&msg.operator)?,
        denom: msg.denom,
        prune_inert: msg.prune_inert,
    };
    CONFIG.save(deps.storage, &config)?;

    let state = DistributionState {
        tracked_balance: Uint128::zero(),
        total_streamed: Uint128::zero(),
        tranches_paid: 0,
        last_cycle_time: None,
    };
    DISTRIBUTION_STATE.save(deps.storage, &state)?;

    let genesis = msg.genesis.unwrap_or_default();
    validate_genesis(&genesis)?;
    init_genesis(deps.branch(), &genesis)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "protocol-pool")
        .add_attribute("admin", info.sender.to_string())
        .add_attribute(
            "continuous_funds",
            genesis.continuous_funds.len().to_string(),
        )
        .add_attribute("budgets", genesis.budgets.len().to_string()))
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Distribute {} => execute::distribute(deps, env, info),
        ExecuteMsg::CancelContinuousFund { recipient } => {
            execute::cancel_continuous_fund(deps, env, info, recipient)
        }
        ExecuteMsg::CancelBudget { recipient } => {
            execute::cancel_budget(deps, env, info, recipient)
        }
        ExecuteMsg::UpdateConfig {
            admin,
            operator,
            prune_inert,
        } => execute::update_config(
            deps,
            env,
            info,
            UpdateConfigParams {
                admin,
                operator,
                prune_inert,
            },
        ),
    }
}

#[entry_point]
pub fn sudo(deps: DepsMut, env: Env, msg: SudoMsg) -> Result<Response, ContractError> {
    match msg {
        SudoMsg::EndBlock {} => execute::end_block(deps, env),
    }
}

#[entry_point]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::DistributionState {} => query::query_distribution_state(deps),
        QueryMsg::ContinuousFund { recipient } => query::query_continuous_fund(deps, recipient),
        QueryMsg::ContinuousFunds { start_after, limit } => {
            query::query_continuous_funds(deps, start_after, limit)
        }
        QueryMsg::Budget { recipient } => query::query_budget(deps, recipient),
        QueryMsg::Budgets { start_after, limit } => query::query_budgets(deps, start_after, limit),
        QueryMsg::UnclaimedBudget { recipient } => query::query_unclaimed_budget(deps, recipient),
        QueryMsg::ExportGenesis {} => query::query_export_genesis(deps),
    }
}

/// Upgrades a deployed pool in place. Recipient records are kept as they are;
/// only the pruning policy may be switched on the way through.
#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, msg: MigrateMsg) -> Result<Response, ContractError> {
    let previous = get_contract_version(deps.storage)?;
    if previous.contract != CONTRACT_NAME {
        return Err(ContractError::MigrationMismatch {
            stored: previous.contract,
        });
    }
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = CONFIG.update(deps.storage, |mut config| -> StdResult<_> {
        if let Some(prune_inert) = msg.prune_inert {
            config.prune_inert = prune_inert;
        }
        Ok(config)
    })?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("previous_version", previous.version)
        .add_attribute("version", CONTRACT_VERSION)
        .add_attribute("prune_inert", config.prune_inert.to_string()))
}
