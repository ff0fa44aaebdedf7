use cosmwasm_std::{Addr, DepsMut, Env, Event, MessageInfo, Response};

use crate::distribution::{run_cycle, CycleContext, Treasury};
use crate::error::ContractError;
use crate::msg::UpdateConfigParams;
use crate::state::{BUDGETS, CONFIG, CONTINUOUS_FUNDS, DISTRIBUTION_STATE};

/// Once-per-block trigger from the chain.
pub fn end_block(deps: DepsMut, env: Env) -> Result<Response, ContractError> {
    run_distribution(deps, env, "end_block")
}

/// Manual trigger. Operator only.
pub fn distribute(deps: DepsMut, env: Env, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.operator {
        return Err(ContractError::Unauthorized {
            reason: "only operator can trigger distribution".to_string(),
        });
    }

    run_distribution(deps, env, "distribute")
}

/// Runs one cycle at the current block time and turns the staged transfers
/// into bank messages.
///
/// Continuous funds share whatever the pool balance has grown by since the
/// previous cycle. Any error reverts the whole call, transfers included.
fn run_distribution(deps: DepsMut, env: Env, action: &str) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut state = DISTRIBUTION_STATE.load(deps.storage)?;

    let mut treasury = Treasury::new(deps.querier, env.contract.address.clone());
    let balance = treasury.balance(&config.denom)?;
    let inflow = balance.saturating_sub(state.tracked_balance);

    let mut ctx = CycleContext {
        api: deps.api,
        treasury,
        denom: config.denom.clone(),
        now: env.block.time,
        inflow,
    };
    let report = run_cycle(deps.storage, &mut ctx, config.prune_inert)?;

    state.tracked_balance = balance.checked_sub(ctx.treasury.sent(&config.denom))?;
    state.total_streamed = state.total_streamed.checked_add(report.streamed)?;
    state.tranches_paid += report.tranches_paid;
    state.last_cycle_time = Some(env.block.time);
    DISTRIBUTION_STATE.save(deps.storage, &state)?;

    let mut response = Response::new()
        .add_messages(ctx.treasury.into_messages())
        .add_attribute("action", action)
        .add_attribute("inflow", inflow.to_string())
        .add_attribute("streamed", report.streamed.to_string())
        .add_attribute("tranches_paid", report.tranches_paid.to_string())
        .add_events(report.events)
        .add_event(
            Event::new("protocol_pool_cycle")
                .add_attribute("time", env.block.time.seconds().to_string())
                .add_attribute("inflow", inflow.to_string())
                .add_attribute("streamed", report.streamed.to_string())
                .add_attribute("tranches_paid", report.tranches_paid.to_string())
                .add_attribute("tracked_balance", state.tracked_balance.to_string()),
        );

    if !report.pruned_funds.is_empty() || !report.pruned_budgets.is_empty() {
        let join = |addrs: &[Addr]| {
            addrs
                .iter()
                .map(|a| a.as_str())
                .collect::<Vec<_>>()
                .join(",")
        };
        response = response.add_event(
            Event::new("protocol_pool_pruned")
                .add_attribute("continuous_funds", join(&report.pruned_funds))
                .add_attribute("budgets", join(&report.pruned_budgets)),
        );
    }

    Ok(response)
}

/// Remove a continuous fund. Admin only.
pub fn cancel_continuous_fund(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    recipient: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can cancel continuous funds".to_string(),
        });
    }

    let addr = deps.api.addr_validate(&recipient)?;
    let fund = CONTINUOUS_FUNDS
        .may_load(deps.storage, &addr)?
        .ok_or(ContractError::ContinuousFundNotFound {
            recipient: recipient.clone(),
        })?;
    CONTINUOUS_FUNDS.remove(deps.storage, &addr);

    Ok(Response::new()
        .add_attribute("action", "cancel_continuous_fund")
        .add_attribute("recipient", recipient.clone())
        .add_event(
            Event::new("protocol_pool_continuous_fund_cancelled")
                .add_attribute("recipient", recipient)
                .add_attribute("distributed", fund.distributed.to_string())
                .add_attribute("cancelled_at", env.block.time.seconds().to_string()),
        ))
}

/// Remove a budget along with its unclaimed remainder. Admin only.
pub fn cancel_budget(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    recipient: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can cancel budgets".to_string(),
        });
    }

    let addr = deps.api.addr_validate(&recipient)?;
    let budget = BUDGETS
        .may_load(deps.storage, &addr)?
        .ok_or(ContractError::BudgetNotFound {
            recipient: recipient.clone(),
        })?;
    BUDGETS.remove(deps.storage, &addr);

    Ok(Response::new()
        .add_attribute("action", "cancel_budget")
        .add_attribute("recipient", recipient.clone())
        .add_event(
            Event::new("protocol_pool_budget_cancelled")
                .add_attribute("recipient", recipient)
                .add_attribute("forfeited", budget.unclaimed().to_string())
                .add_attribute("tranches_left", budget.tranches_left.to_string())
                .add_attribute("cancelled_at", env.block.time.seconds().to_string()),
        ))
}

/// Update configuration. Admin only.
pub fn update_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    params: UpdateConfigParams,
) -> Result<Response, ContractError> {
    let UpdateConfigParams {
        admin,
        operator,
        prune_inert,
    } = params;

    let mut config = CONFIG.load(deps.storage)?;

    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: "only admin can update config".to_string(),
        });
    }

    if let Some(admin) = admin {
        config.admin = deps.api.addr_validate(&admin)?;
    }
    if let Some(op) = operator {
        config.operator = deps.api.addr_validate(&op)?;
    }
    if let Some(prune) = prune_inert {
        config.prune_inert = prune;
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attribute("action", "update_config"))
}
