//! The pool distribution engine.
//!
//! One call to [`run_cycle`] per block streams each continuous fund its share
//! of the cycle's inflow and releases at most one tranche per budget. The
//! first failing transfer aborts the whole cycle; nothing after it runs.

use std::collections::BTreeMap;

use cosmwasm_std::{
    Addr, Api, BankMsg, Coin, Event, QuerierWrapper, StdResult, Storage, Timestamp, Uint128,
    Uint64,
};
use protocol_pool_common::{Budget, ContinuousFund};

use crate::error::ContractError;
use crate::ledger::RecordCursor;
use crate::state::{BUDGETS, CONTINUOUS_FUNDS};

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Stages bank transfers out of the pool for a single cycle.
///
/// Balances are read from the bank module once per denom and then debited
/// locally, so a cycle can never promise more than the pool holds.
pub struct Treasury<'a> {
    querier: QuerierWrapper<'a>,
    pool: Addr,
    available: BTreeMap<String, Uint128>,
    sent: BTreeMap<String, Uint128>,
    transfers: Vec<BankMsg>,
}

impl<'a> Treasury<'a> {
    pub fn new(querier: QuerierWrapper<'a>, pool: Addr) -> Self {
        Treasury {
            querier,
            pool,
            available: BTreeMap::new(),
            sent: BTreeMap::new(),
            transfers: vec![],
        }
    }

    /// Pool balance still unspent this cycle.
    pub fn balance(&mut self, denom: &str) -> StdResult<Uint128> {
        if let Some(amount) = self.available.get(denom) {
            return Ok(*amount);
        }
        let amount = self.querier.query_balance(&self.pool, denom)?.amount;
        self.available.insert(denom.to_string(), amount);
        Ok(amount)
    }

    /// Moves `amount` from the pool to `recipient`. Zero amounts are a no-op.
    pub fn transfer(
        &mut self,
        api: &dyn Api,
        recipient: &Addr,
        amount: Coin,
    ) -> Result<(), ContractError> {
        if amount.amount.is_zero() {
            return Ok(());
        }

        api.addr_validate(recipient.as_str())
            .map_err(|e| ContractError::InvalidRecipient {
                address: recipient.to_string(),
                reason: e.to_string(),
            })?;

        let available = self.balance(&amount.denom)?;
        let remaining = available
            .checked_sub(amount.amount)
            .map_err(|_| ContractError::InsufficientPool {
                needed: amount.to_string(),
                available: Coin::new(available, amount.denom.clone()).to_string(),
            })?;

        self.available.insert(amount.denom.clone(), remaining);
        *self.sent.entry(amount.denom.clone()).or_default() += amount.amount;
        self.transfers.push(BankMsg::Send {
            to_address: recipient.to_string(),
            amount: vec![amount],
        });
        Ok(())
    }

    /// Total staged out of the pool this cycle in `denom`.
    pub fn sent(&self, denom: &str) -> Uint128 {
        self.sent.get(denom).copied().unwrap_or_default()
    }

    pub fn transfers(&self) -> &[BankMsg] {
        &self.transfers
    }

    pub fn into_messages(self) -> Vec<BankMsg> {
        self.transfers
    }
}

/// Everything one cycle reads besides the recipient stores.
pub struct CycleContext<'a> {
    pub api: &'a dyn Api,
    pub treasury: Treasury<'a>,
    /// Denom continuous funds are paid in
    pub denom: String,
    pub now: Timestamp,
    /// Pool inflow available for continuous funds this cycle
    pub inflow: Uint128,
}

#[derive(Debug, PartialEq)]
pub enum StreamOutcome {
    Expired,
    CapReached,
    NothingDue,
    Paid(Uint128),
}

/// Streams `fund`'s share of the cycle inflow to `recipient`.
///
/// On `Paid` the fund's `distributed` counter has been advanced and the
/// caller must persist it.
pub fn distribute_continuous(
    ctx: &mut CycleContext,
    recipient: &Addr,
    fund: &mut ContinuousFund,
) -> Result<StreamOutcome, ContractError> {
    if fund.is_expired(ctx.now) {
        return Ok(StreamOutcome::Expired);
    }

    let mut share = ctx.inflow.checked_mul_floor(fund.percentage)?;
    if let Some(headroom) = fund.headroom() {
        if headroom.is_zero() {
            return Ok(StreamOutcome::CapReached);
        }
        share = share.min(headroom);
    }
    if share.is_zero() {
        return Ok(StreamOutcome::NothingDue);
    }

    let distributed = fund.distributed.checked_add(share)?;
    ctx.treasury
        .transfer(ctx.api, recipient, Coin::new(share, ctx.denom.clone()))?;
    fund.distributed = distributed;

    Ok(StreamOutcome::Paid(share))
}

/// A tranche that has come due, and the budget as it stands once it is paid.
#[derive(Debug, PartialEq)]
pub struct Tranche {
    pub amount: Coin,
    pub updated: Budget,
}

/// Works out the tranche `budget` can release at `now`, if any.
///
/// Every tranche but the last is `total / tranches`; the last one pays
/// whatever is left so the tranches always add up to the total exactly.
pub fn next_tranche(now: Timestamp, budget: &Budget) -> Result<Option<Tranche>, ContractError> {
    if budget.is_exhausted() {
        return Ok(None);
    }
    if now < budget.start_time || now < budget.next_claim_from {
        return Ok(None);
    }

    let total = budget.total_budget.amount;
    let unclaimed = total.checked_sub(budget.claimed_amount)?;
    let amount = if budget.tranches_left == 1 {
        unclaimed
    } else {
        total
            .checked_div(Uint128::from(budget.tranches))?
            .min(unclaimed)
    };

    let mut updated = budget.clone();
    updated.claimed_amount = budget.claimed_amount.checked_add(amount)?;
    updated.tranches_left -= 1;
    updated.next_claim_from = advance_schedule(budget.next_claim_from, budget.period)?;

    Ok(Some(Tranche {
        amount: Coin::new(amount, budget.total_budget.denom.clone()),
        updated,
    }))
}

/// `from + period` seconds, erroring instead of wrapping past the end of time.
fn advance_schedule(from: Timestamp, period: u64) -> Result<Timestamp, ContractError> {
    let step = Uint64::new(period).checked_mul(Uint64::new(NANOS_PER_SECOND))?;
    let next = Uint64::new(from.nanos()).checked_add(step)?;
    Ok(Timestamp::from_nanos(next.u64()))
}

/// Pays out the due tranche of `budget`, if any. The transfer happens before
/// anything is returned, so a failed transfer leaves the budget untouched.
pub fn claim_budget(
    ctx: &mut CycleContext,
    recipient: &Addr,
    budget: &Budget,
) -> Result<Option<Tranche>, ContractError> {
    let Some(tranche) = next_tranche(ctx.now, budget)? else {
        return Ok(None);
    };
    ctx.treasury
        .transfer(ctx.api, recipient, tranche.amount.clone())?;
    Ok(Some(tranche))
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub streamed: Uint128,
    pub tranches_paid: u64,
    pub events: Vec<Event>,
    pub pruned_funds: Vec<Addr>,
    pub pruned_budgets: Vec<Addr>,
}

/// Runs one distribution cycle over every continuous fund, then every budget.
///
/// With `prune_inert`, expired funds and exhausted budgets seen during the
/// cycle are removed once both passes have finished.
pub fn run_cycle(
    storage: &mut dyn Storage,
    ctx: &mut CycleContext,
    prune_inert: bool,
) -> Result<CycleReport, ContractError> {
    let mut report = CycleReport::default();

    let mut funds = RecordCursor::new(CONTINUOUS_FUNDS);
    while let Some((recipient, mut fund)) = funds.next(storage)? {
        match distribute_continuous(ctx, &recipient, &mut fund)? {
            StreamOutcome::Paid(amount) => {
                CONTINUOUS_FUNDS.save(storage, &recipient, &fund)?;
                report.streamed += amount;
                report.events.push(
                    Event::new("protocol_pool_continuous_distribution")
                        .add_attribute("recipient", recipient.to_string())
                        .add_attribute("percentage", fund.percentage.to_string())
                        .add_attribute("amount", amount.to_string())
                        .add_attribute("distributed", fund.distributed.to_string()),
                );
            }
            StreamOutcome::Expired if prune_inert => report.pruned_funds.push(recipient),
            _ => {}
        }
    }

    let mut budgets = RecordCursor::new(BUDGETS);
    while let Some((recipient, budget)) = budgets.next(storage)? {
        let current = match claim_budget(ctx, &recipient, &budget)? {
            Some(Tranche { amount, updated }) => {
                BUDGETS.save(storage, &recipient, &updated)?;
                report.tranches_paid += 1;
                report.events.push(
                    Event::new("protocol_pool_budget_claim")
                        .add_attribute("recipient", recipient.to_string())
                        .add_attribute("amount", amount.to_string())
                        .add_attribute("claimed_amount", updated.claimed_amount.to_string())
                        .add_attribute("tranches_left", updated.tranches_left.to_string())
                        .add_attribute(
                            "next_claim_from",
                            updated.next_claim_from.seconds().to_string(),
                        ),
                );
                updated
            }
            None => budget,
        };
        if prune_inert && current.is_exhausted() {
            report.pruned_budgets.push(recipient);
        }
    }

    for recipient in &report.pruned_funds {
        CONTINUOUS_FUNDS.remove(storage, recipient);
    }
    for recipient in &report.pruned_budgets {
        BUDGETS.remove(storage, recipient);
    }

    Ok(report)
}
