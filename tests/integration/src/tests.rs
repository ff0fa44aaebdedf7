//! Integration tests for the protocol pool.
//!
//! These tests drive the contract through its `instantiate` / `sudo` /
//! `execute` / `query` entry points across many blocks, using
//! `cosmwasm_std::testing` mocks. Bank messages are not executed by the
//! mocks, so the harness settles them against the pool balance itself.
//!
//! Run:
//! ```bash
//! cargo test -p protocol-pool-integration-tests
//! ```

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    coin, coins, from_json, Addr, BankMsg, CosmosMsg, Decimal, Env, MemoryStorage, OwnedDeps,
    Response, Timestamp, Uint128,
};
use protocol_pool::contract::{execute, instantiate, query, sudo};
use protocol_pool::msg::{
    BudgetsResponse, ContinuousFundsResponse, ExecuteMsg, InstantiateMsg, QueryMsg, SudoMsg,
    UnclaimedBudgetResponse,
};
use protocol_pool::state::DistributionState;
use protocol_pool::ContractError;
use protocol_pool_common::{Budget, BudgetEntry, ContinuousFund, ContinuousFundEntry, GenesisState};
use serde::de::DeserializeOwned;

// ─── Constants ───

const DENOM: &str = "ustake";

// ─── Harness ───

/// A pool contract plus the bank balance it holds.
struct Pool {
    deps: OwnedDeps<MemoryStorage, MockApi, MockQuerier>,
    env: Env,
    balance: u128,
}

impl Pool {
    fn new(genesis: Option<GenesisState>, prune_inert: bool) -> Self {
        let mut deps = mock_dependencies();
        let admin = deps.api.addr_make("admin");
        let msg = InstantiateMsg {
            operator: deps.api.addr_make("operator").to_string(),
            denom: DENOM.to_string(),
            prune_inert,
            genesis,
        };
        instantiate(deps.as_mut(), mock_env(), message_info(&admin, &[]), msg).unwrap();

        Pool {
            deps,
            env: mock_env(),
            balance: 0,
        }
    }

    fn addr(&self, name: &str) -> Addr {
        self.deps.api.addr_make(name)
    }

    fn deposit(&mut self, amount: u128) {
        self.balance += amount;
    }

    fn advance(&mut self, seconds: u64) {
        self.env.block.time = self.env.block.time.plus_seconds(seconds);
        self.env.block.height += 1;
    }

    fn try_end_block(&mut self) -> Result<Response, ContractError> {
        self.deps
            .querier
            .bank
            .update_balance(&self.env.contract.address, coins(self.balance, DENOM));
        let res = sudo(self.deps.as_mut(), self.env.clone(), SudoMsg::EndBlock {})?;
        for (_, amount) in payouts(&res) {
            self.balance -= amount;
        }
        Ok(res)
    }

    fn end_block(&mut self) -> Response {
        self.try_end_block().unwrap()
    }

    fn query<T: DeserializeOwned>(&self, msg: QueryMsg) -> T {
        from_json(query(self.deps.as_ref(), self.env.clone(), msg).unwrap()).unwrap()
    }

    fn state(&self) -> DistributionState {
        self.query(QueryMsg::DistributionState {})
    }
}

/// Every `BankMsg::Send` in `res`, as (recipient, amount).
fn payouts(res: &Response) -> Vec<(String, u128)> {
    res.messages
        .iter()
        .filter_map(|m| match &m.msg {
            CosmosMsg::Bank(BankMsg::Send { to_address, amount }) => {
                Some((to_address.clone(), amount[0].amount.u128()))
            }
            _ => None,
        })
        .collect()
}

fn fund_entry(
    recipient: &Addr,
    percent: u64,
    cap: Option<u128>,
    expiry: Option<Timestamp>,
) -> ContinuousFundEntry {
    ContinuousFundEntry {
        recipient: recipient.to_string(),
        fund: ContinuousFund {
            percentage: Decimal::percent(percent),
            cap: cap.map(Uint128::new),
            expiry,
            distributed: Uint128::zero(),
        },
    }
}

fn budget_entry(
    recipient: &Addr,
    total: u128,
    start: Timestamp,
    period: u64,
    tranches: u64,
) -> BudgetEntry {
    BudgetEntry {
        recipient: recipient.to_string(),
        budget: Budget::new(coin(total, DENOM), start, period, tranches),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_budget_pays_out_in_tranches() {
    let api = MockApi::default();
    let grantee = api.addr_make("grantee");
    let start = mock_env().block.time;
    let genesis = GenesisState::new(vec![], vec![budget_entry(&grantee, 100, start, 10, 3)]);

    let mut pool = Pool::new(Some(genesis), false);
    pool.deposit(100);

    // One cycle every 5 seconds: a tranche comes due every other cycle.
    let mut paid = vec![];
    for _ in 0..6 {
        let res = pool.end_block();
        paid.extend(payouts(&res).into_iter().map(|(_, amount)| amount));
        pool.advance(5);
    }
    assert_eq!(paid, vec![33, 33, 34]);

    let unclaimed: UnclaimedBudgetResponse = pool.query(QueryMsg::UnclaimedBudget {
        recipient: grantee.to_string(),
    });
    assert_eq!(unclaimed.claimed_amount, Uint128::new(100));
    assert_eq!(unclaimed.unclaimed_amount, coin(0, DENOM));
    assert_eq!(unclaimed.tranches_left, 0);
    assert_eq!(unclaimed.next_claim_from, None);

    let state = pool.state();
    assert_eq!(state.tranches_paid, 3);
    assert_eq!(state.tracked_balance, Uint128::zero());
    assert_eq!(pool.balance, 0);
}

#[test]
fn test_continuous_fund_cap_is_reached() {
    let api = MockApi::default();
    let streamer = api.addr_make("streamer");
    let genesis = GenesisState::new(vec![fund_entry(&streamer, 50, Some(40), None)], vec![]);

    let mut pool = Pool::new(Some(genesis), false);

    let mut paid = vec![];
    for _ in 0..3 {
        pool.deposit(50);
        let res = pool.end_block();
        paid.push(payouts(&res));
        pool.advance(1);
    }

    assert_eq!(paid[0], vec![(streamer.to_string(), 25)]);
    assert_eq!(paid[1], vec![(streamer.to_string(), 15)]);
    assert!(paid[2].is_empty());

    let fund: Option<ContinuousFund> = pool.query(QueryMsg::ContinuousFund {
        recipient: streamer.to_string(),
    });
    assert_eq!(fund.unwrap().distributed, Uint128::new(40));

    let state = pool.state();
    assert_eq!(state.total_streamed, Uint128::new(40));
    assert_eq!(state.tracked_balance, Uint128::new(110));
}

#[test]
fn test_stream_shares_only_new_inflow() {
    let api = MockApi::default();
    let streamer = api.addr_make("streamer");
    let genesis = GenesisState::new(vec![fund_entry(&streamer, 10, None, None)], vec![]);

    let mut pool = Pool::new(Some(genesis), false);

    pool.deposit(1_000);
    let res = pool.end_block();
    assert_eq!(payouts(&res), vec![(streamer.to_string(), 100)]);
    assert_eq!(res.attributes[1].value, "1000");

    // No new funds: nothing to stream, whatever sits in the pool.
    pool.advance(5);
    let res = pool.end_block();
    assert!(payouts(&res).is_empty());
    assert_eq!(res.attributes[1].value, "0");

    pool.advance(5);
    pool.deposit(500);
    let res = pool.end_block();
    assert_eq!(payouts(&res), vec![(streamer.to_string(), 50)]);

    assert_eq!(pool.state().total_streamed, Uint128::new(150));
}

#[test]
fn test_cycle_is_idempotent_within_a_block() {
    let api = MockApi::default();
    let streamer = api.addr_make("streamer");
    let grantee = api.addr_make("grantee");
    let start = mock_env().block.time;
    let genesis = GenesisState::new(
        vec![fund_entry(&streamer, 20, None, None)],
        vec![budget_entry(&grantee, 90, start, 10, 3)],
    );

    let mut pool = Pool::new(Some(genesis), false);
    pool.deposit(200);

    let res = pool.end_block();
    assert_eq!(
        payouts(&res),
        vec![(streamer.to_string(), 40), (grantee.to_string(), 30)]
    );

    let budget_before: Option<Budget> = pool.query(QueryMsg::Budget {
        recipient: grantee.to_string(),
    });

    let res = pool.end_block();
    assert!(payouts(&res).is_empty());

    let budget_after: Option<Budget> = pool.query(QueryMsg::Budget {
        recipient: grantee.to_string(),
    });
    assert_eq!(budget_before, budget_after);
    assert_eq!(pool.state().tranches_paid, 1);
}

#[test]
fn test_budget_waits_for_start_time() {
    let api = MockApi::default();
    let grantee = api.addr_make("grantee");
    let start = mock_env().block.time.plus_seconds(100);
    let genesis = GenesisState::new(vec![], vec![budget_entry(&grantee, 60, start, 30, 2)]);

    let mut pool = Pool::new(Some(genesis), false);
    pool.deposit(60);

    let res = pool.end_block();
    assert!(payouts(&res).is_empty());

    let unclaimed: UnclaimedBudgetResponse = pool.query(QueryMsg::UnclaimedBudget {
        recipient: grantee.to_string(),
    });
    assert_eq!(unclaimed.next_claim_from, Some(start));
    assert_eq!(unclaimed.unclaimed_amount, coin(60, DENOM));

    pool.advance(99);
    assert!(payouts(&pool.end_block()).is_empty());

    pool.advance(1);
    assert_eq!(
        payouts(&pool.end_block()),
        vec![(grantee.to_string(), 30)]
    );

    pool.advance(30);
    assert_eq!(
        payouts(&pool.end_block()),
        vec![(grantee.to_string(), 30)]
    );
}

#[test]
fn test_expired_fund_stops_streaming() {
    let api = MockApi::default();
    let streamer = api.addr_make("streamer");
    let expiry = mock_env().block.time.plus_seconds(10);
    let genesis = GenesisState::new(vec![fund_entry(&streamer, 50, None, Some(expiry))], vec![]);

    let mut pool = Pool::new(Some(genesis), false);

    pool.deposit(100);
    assert_eq!(
        payouts(&pool.end_block()),
        vec![(streamer.to_string(), 50)]
    );

    pool.advance(9);
    pool.deposit(100);
    assert_eq!(
        payouts(&pool.end_block()),
        vec![(streamer.to_string(), 50)]
    );

    // Expiry is inclusive.
    pool.advance(1);
    pool.deposit(100);
    assert!(payouts(&pool.end_block()).is_empty());

    // Without pruning the record stays in place.
    let fund: Option<ContinuousFund> = pool.query(QueryMsg::ContinuousFund {
        recipient: streamer.to_string(),
    });
    assert!(fund.is_some());
}

#[test]
fn test_overcommitted_pool_fails_cycle() {
    let api = MockApi::default();
    let funds = (0..5)
        .map(|i| fund_entry(&api.addr_make(&format!("fund{i}")), 30, None, None))
        .collect();
    let genesis = GenesisState::new(funds, vec![]);

    let mut pool = Pool::new(Some(genesis), false);
    pool.deposit(100);

    let err = pool.try_end_block().unwrap_err();
    assert!(matches!(err, ContractError::InsufficientPool { .. }));
}

#[test]
fn test_prune_inert_removes_finished_records() {
    let api = MockApi::default();
    let streamer = api.addr_make("streamer");
    let grantee = api.addr_make("grantee");
    let now = mock_env().block.time;
    let genesis = GenesisState::new(
        vec![fund_entry(&streamer, 10, None, Some(now.plus_seconds(5)))],
        vec![budget_entry(&grantee, 50, now, 10, 1)],
    );

    let mut pool = Pool::new(Some(genesis), true);
    pool.deposit(150);

    let res = pool.end_block();
    assert_eq!(
        payouts(&res),
        vec![(streamer.to_string(), 15), (grantee.to_string(), 50)]
    );
    let pruned = res
        .events
        .iter()
        .find(|e| e.ty == "protocol_pool_pruned")
        .unwrap();
    assert!(pruned
        .attributes
        .iter()
        .any(|a| a.key == "budgets" && a.value == grantee.to_string()));

    let budget: Option<Budget> = pool.query(QueryMsg::Budget {
        recipient: grantee.to_string(),
    });
    assert!(budget.is_none());

    pool.advance(5);
    pool.end_block();
    let fund: Option<ContinuousFund> = pool.query(QueryMsg::ContinuousFund {
        recipient: streamer.to_string(),
    });
    assert!(fund.is_none());
}

#[test]
fn test_export_import_round_trip() {
    let api = MockApi::default();
    let streamer = api.addr_make("streamer");
    let grantee = api.addr_make("grantee");
    let start = mock_env().block.time;
    let genesis = GenesisState::new(
        vec![fund_entry(&streamer, 25, Some(1_000), None)],
        vec![budget_entry(&grantee, 100, start, 10, 3)],
    );

    let mut pool = Pool::new(Some(genesis), false);
    pool.deposit(400);
    pool.end_block();

    let exported: GenesisState = pool.query(QueryMsg::ExportGenesis {});
    assert_eq!(exported.continuous_funds.len(), 1);
    assert_eq!(
        exported.continuous_funds[0].fund.distributed,
        Uint128::new(100)
    );
    assert_eq!(exported.budgets[0].budget.tranches_left, 2);

    let mut restored = Pool::new(Some(exported.clone()), false);
    let reexported: GenesisState = restored.query(QueryMsg::ExportGenesis {});
    assert_eq!(reexported, exported);

    // The imported budget resumes from where it stopped.
    restored.deposit(67);
    restored.advance(5);
    assert!(payouts(&restored.end_block())
        .iter()
        .all(|(to, _)| *to != grantee.to_string()));
    restored.advance(5);
    let res = restored.end_block();
    assert!(payouts(&res).contains(&(grantee.to_string(), 33)));
}

#[test]
fn test_paginated_queries() {
    let api = MockApi::default();
    let recipients: Vec<Addr> = (0..3).map(|i| api.addr_make(&format!("r{i}"))).collect();
    let start = mock_env().block.time;
    let genesis = GenesisState::new(
        recipients
            .iter()
            .map(|r| fund_entry(r, 10, None, None))
            .collect(),
        recipients
            .iter()
            .map(|r| budget_entry(r, 10, start, 1, 1))
            .collect(),
    );
    let pool = Pool::new(Some(genesis), false);

    let page: ContinuousFundsResponse = pool.query(QueryMsg::ContinuousFunds {
        start_after: None,
        limit: Some(2),
    });
    assert_eq!(page.funds.len(), 2);

    let rest: ContinuousFundsResponse = pool.query(QueryMsg::ContinuousFunds {
        start_after: Some(page.funds[1].recipient.clone()),
        limit: Some(2),
    });
    assert_eq!(rest.funds.len(), 1);

    let mut seen: Vec<String> = page
        .funds
        .iter()
        .chain(rest.funds.iter())
        .map(|e| e.recipient.clone())
        .collect();
    seen.sort();
    let mut expected: Vec<String> = recipients.iter().map(|r| r.to_string()).collect();
    expected.sort();
    assert_eq!(seen, expected);

    let budgets: BudgetsResponse = pool.query(QueryMsg::Budgets {
        start_after: None,
        limit: None,
    });
    assert_eq!(budgets.budgets.len(), 3);
}

#[test]
fn test_admin_cancel_stops_payouts() {
    let api = MockApi::default();
    let streamer = api.addr_make("streamer");
    let grantee = api.addr_make("grantee");
    let start = mock_env().block.time;
    let genesis = GenesisState::new(
        vec![fund_entry(&streamer, 50, None, None)],
        vec![budget_entry(&grantee, 100, start, 10, 2)],
    );

    let mut pool = Pool::new(Some(genesis), false);
    pool.deposit(200);
    assert_eq!(payouts(&pool.end_block()).len(), 2);

    let admin = pool.addr("admin");
    for msg in [
        ExecuteMsg::CancelContinuousFund {
            recipient: streamer.to_string(),
        },
        ExecuteMsg::CancelBudget {
            recipient: grantee.to_string(),
        },
    ] {
        execute(
            pool.deps.as_mut(),
            pool.env.clone(),
            message_info(&admin, &[]),
            msg,
        )
        .unwrap();
    }

    pool.advance(10);
    pool.deposit(100);
    assert!(payouts(&pool.end_block()).is_empty());

    let exported: GenesisState = pool.query(QueryMsg::ExportGenesis {});
    assert_eq!(exported, GenesisState::default());
}

#[test]
fn test_operator_trigger_matches_end_block() {
    let api = MockApi::default();
    let grantee = api.addr_make("grantee");
    let start = mock_env().block.time;
    let genesis = GenesisState::new(vec![], vec![budget_entry(&grantee, 100, start, 10, 4)]);

    let mut pool = Pool::new(Some(genesis), false);
    pool.deposit(100);
    pool.deps
        .querier
        .bank
        .update_balance(&pool.env.contract.address, coins(100, DENOM));

    let operator = pool.addr("operator");
    let res = execute(
        pool.deps.as_mut(),
        pool.env.clone(),
        message_info(&operator, &[]),
        ExecuteMsg::Distribute {},
    )
    .unwrap();
    assert_eq!(payouts(&res), vec![(grantee.to_string(), 25)]);
    assert_eq!(pool.state().last_cycle_time, Some(pool.env.block.time));
}

#[test]
fn test_genesis_import_defaults_distributed_counter() {
    let api = MockApi::default();
    let streamer = api.addr_make("streamer");
    let genesis: GenesisState = serde_json::from_value(serde_json::json!({
        "continuous_funds": [{
            "recipient": streamer.to_string(),
            "fund": { "percentage": "0.3", "cap": null, "expiry": null }
        }],
        "budgets": []
    }))
    .unwrap();

    let mut pool = Pool::new(Some(genesis), false);
    pool.deposit(10);
    assert_eq!(
        payouts(&pool.end_block()),
        vec![(streamer.to_string(), 3)]
    );

    let fund: Option<ContinuousFund> = pool.query(QueryMsg::ContinuousFund {
        recipient: streamer.to_string(),
    });
    assert_eq!(fund.unwrap().distributed, Uint128::new(3));
}
