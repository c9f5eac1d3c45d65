//! End-to-end tests for the royalty pipeline.
//!
//! A snapshot is classified and priced with the off-chain crates, turned into
//! `distribute` messages, and those messages are executed against the contract
//! entry points using `cosmwasm_std::testing` mocks.
//!
//! Run:
//! ```bash
//! cargo test -p royalty-integration-tests
//! ```

use std::str::FromStr;

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    coins, from_json, BankMsg, CosmosMsg, Env, MemoryStorage, OwnedDeps, Response, Uint128,
};
use royalty_common::{KnownAddresses, OwnershipRecord, PayoutPlan};
use royalty_distributor::msg::{ExecuteMsg, InstantiateMsg, QueryMsg};
use royalty_distributor::state::{DistributionRecord, DistributionState};
use royalty_distributor::ContractError;
use royalty_ops::config::GasPrice;
use royalty_ops::distributor::{plan_distribution, BatchDistributor, TxSink, UnsignedTxWriter};
use royalty_ops::tx::{GasSettings, TxMsg, UnsignedTx};

type TestDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

const SUPPLY: u32 = 12;
const POOL: u128 = 1_000_003;
const CONTRACT: &str = "royalty-contract";

// ─── Helpers ───

fn known(api: &MockApi) -> KnownAddresses {
    KnownAddresses {
        unminted: api.addr_make("unminted").to_string(),
        marketplace_a_custody: api.addr_make("escrow_a").to_string(),
        marketplace_b_custody: api.addr_make("escrow_b").to_string(),
        protocol_wallet: api.addr_make("protocol").to_string(),
    }
}

/// 12 tokens: 4 held by custodial wallets, 8 by five holders.
fn snapshot(api: &MockApi) -> OwnershipRecord {
    let owners = [
        "alice", "unminted", "bob", "alice", "escrow_a", "carol", "dave", "protocol", "erin",
        "alice", "escrow_b", "bob",
    ];
    owners
        .iter()
        .enumerate()
        .map(|(i, name)| (i as u32 + 1, api.addr_make(name).to_string()))
        .collect()
}

fn setup_contract(pool: u128) -> TestDeps {
    let mut deps = mock_dependencies();
    let owner = deps.api.addr_make("owner");
    let msg = InstantiateMsg {
        owner: owner.to_string(),
        nft_count: SUPPLY,
        denom: None,
    };
    royalty_distributor::contract::instantiate(
        deps.as_mut(),
        mock_env(),
        message_info(&owner, &[]),
        msg,
    )
    .unwrap();

    let contract = mock_env().contract.address;
    deps.querier
        .bank
        .update_balance(contract.as_str(), coins(pool, "uluna"));
    deps
}

fn execute_tx_msg(deps: &mut TestDeps, env: Env, msg: &TxMsg) -> Result<Response, ContractError> {
    let execute_msg: ExecuteMsg = match msg {
        TxMsg::ExecuteContract { msg, contract, .. } => {
            assert_eq!(contract, CONTRACT);
            serde_json::from_value(msg.clone()).unwrap()
        }
        other => panic!("expected an execute message, got {other:?}"),
    };
    let owner = deps.api.addr_make("owner");
    royalty_distributor::contract::execute(deps.as_mut(), env, message_info(&owner, &[]), execute_msg)
}

fn bank_total(responses: &[Response]) -> Uint128 {
    responses
        .iter()
        .flat_map(|res| res.messages.iter())
        .map(|sub| match &sub.msg {
            CosmosMsg::Bank(BankMsg::Send { amount, .. }) => amount[0].amount,
            other => panic!("unexpected message {other:?}"),
        })
        .sum()
}

fn plan(deps: &TestDeps, record: &OwnershipRecord) -> PayoutPlan {
    plan_distribution(record, &known(&deps.api), SUPPLY, Uint128::new(POOL)).unwrap()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_snapshot_to_bank_sends() {
    let mut deps = setup_contract(POOL);
    let record = snapshot(&deps.api);
    let plan = plan(&deps, &record);

    // 8 eligible tokens: floor(1_000_003 / 8) = 125_000, 3 left over
    assert_eq!(plan.per_token_share, Uint128::new(125_000));
    assert_eq!(plan.total, Uint128::new(1_000_000));
    assert_eq!(plan.remainder, Uint128::new(3));
    let alice = deps.api.addr_make("alice").to_string();
    assert_eq!(plan.recipients[0].addr, alice);
    assert_eq!(plan.recipients[0].amount, Uint128::new(375_000));
    assert_eq!(plan.recipients.len(), 5);

    let messages = BatchDistributor::new(CONTRACT, deps.api.addr_make("owner").to_string())
        .with_chunk_size(2)
        .messages(1, &record.digest(), &plan.recipients)
        .unwrap();
    assert_eq!(messages.len(), 3);

    let env = mock_env();
    let responses: Vec<Response> = messages
        .iter()
        .map(|msg| execute_tx_msg(&mut deps, env.clone(), msg).unwrap())
        .collect();
    assert_eq!(bank_total(&responses), plan.total);

    // recipients are paid in plan order across chunks
    let paid: Vec<String> = responses
        .iter()
        .flat_map(|res| res.messages.iter())
        .map(|sub| match &sub.msg {
            CosmosMsg::Bank(BankMsg::Send { to_address, .. }) => to_address.clone(),
            other => panic!("unexpected message {other:?}"),
        })
        .collect();
    let planned: Vec<String> = plan.recipients.iter().map(|r| r.addr.clone()).collect();
    assert_eq!(paid, planned);

    let res = royalty_distributor::contract::query(
        deps.as_ref(),
        mock_env(),
        QueryMsg::Distribution { epoch: 1 },
    )
    .unwrap();
    let record_on_chain: Option<DistributionRecord> = from_json(res).unwrap();
    let record_on_chain = record_on_chain.unwrap();
    assert_eq!(record_on_chain.snapshot_digest, record.digest());
    assert_eq!(record_on_chain.chunks, 3);
    assert_eq!(record_on_chain.recipients, 5);
    assert_eq!(record_on_chain.amount, plan.total);

    let res =
        royalty_distributor::contract::query(deps.as_ref(), mock_env(), QueryMsg::State {}).unwrap();
    let state: DistributionState = from_json(res).unwrap();
    assert_eq!(state.last_epoch, Some(1));
    assert_eq!(state.total_distributed, plan.total);
}

#[test]
fn test_rerun_in_later_transaction_is_rejected() {
    let mut deps = setup_contract(POOL);
    let record = snapshot(&deps.api);
    let plan = plan(&deps, &record);
    let distributor = BatchDistributor::new(CONTRACT, deps.api.addr_make("owner").to_string());

    let messages = distributor.messages(1, &record.digest(), &plan.recipients).unwrap();
    for msg in &messages {
        execute_tx_msg(&mut deps, mock_env(), msg).unwrap();
    }

    // an operator re-running the same distribution pays nothing twice
    let mut later = mock_env();
    later.block.height += 10;
    let err = execute_tx_msg(&mut deps, later.clone(), &messages[0]).unwrap_err();
    assert!(matches!(
        err,
        ContractError::EpochAlreadyDistributed { epoch: 1, last_epoch: 1 }
    ));

    // a fresh epoch in the later transaction goes through
    let next = distributor.messages(2, &record.digest(), &plan.recipients).unwrap();
    let res = execute_tx_msg(&mut deps, later, &next[0]).unwrap();
    assert_eq!(bank_total(&[res]), plan.total);
}

#[test]
fn test_custody_change_fails_before_any_message() {
    let deps = setup_contract(POOL);
    let mut record = snapshot(&deps.api);
    // token outside the collection pushes the total past the supply
    record.insert(SUPPLY + 1, deps.api.addr_make("mallory").to_string());

    let err = plan_distribution(&record, &known(&deps.api), SUPPLY, Uint128::new(POOL)).unwrap_err();
    assert!(
        format!("{err:?}").contains("SupplyMismatch"),
        "expected supply mismatch, got: {err:?}"
    );
}

#[test]
fn test_unsigned_tx_file_round_trip() {
    let deps = setup_contract(POOL);
    let record = snapshot(&deps.api);
    let plan = plan(&deps, &record);
    let messages = BatchDistributor::new(CONTRACT, deps.api.addr_make("owner").to_string())
        .with_chunk_size(2)
        .messages(7, &record.digest(), &plan.recipients)
        .unwrap();

    let path = std::env::temp_dir().join(format!("royalty-unsigned-{}.json", std::process::id()));
    let gas = GasSettings::new(GasPrice::from_str("0.15uusd").unwrap());
    let mut writer = UnsignedTxWriter::new(path.clone(), gas);
    writer.submit(messages.clone()).unwrap();

    let written: UnsignedTx =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(written.body.messages, messages);
    // 3 messages * 300_000 * 1.4
    assert_eq!(written.auth_info.fee.gas_limit.u64(), 1_260_000);
    assert_eq!(written.auth_info.fee.amount[0].amount, Uint128::new(189_000));
}

#[test]
fn test_snapshot_file_format() {
    let api = MockApi::default();
    let record = snapshot(&api);
    let json = serde_json::to_string_pretty(&record).unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["1"], api.addr_make("alice").to_string());
    assert_eq!(value.as_object().unwrap().len(), SUPPLY as usize);

    let back: OwnershipRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);
    assert_eq!(back.digest(), record.digest());
}
