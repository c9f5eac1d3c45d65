use cosmwasm_std::{
    coins, to_json_binary, BankMsg, DepsMut, Env, Event, MessageInfo, Response, Uint128, WasmMsg,
};
use royalty_common::types::Recipient;

use crate::error::ContractError;
use crate::msg::{AssetInfo, MarketplaceExecuteMsg};
use crate::state::{DistributionRecord, CONFIG, DISTRIBUTIONS, DISTRIBUTION_STATE};

pub struct DistributeParams {
    pub epoch: u64,
    pub snapshot_digest: String,
    pub recipients: Vec<Recipient>,
}

pub struct UpdateConfigParams {
    pub owner: Option<String>,
    pub nft_count: Option<u32>,
}

/// Snapshot digests are hex-encoded sha256.
pub fn validate_snapshot_digest(digest: &str) -> Result<(), ContractError> {
    if digest.len() != 64 {
        return Err(ContractError::InvalidSnapshotDigest {
            reason: format!("expected 64 hex chars, got {}", digest.len()),
        });
    }
    if !digest.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ContractError::InvalidSnapshotDigest {
            reason: "not hex".to_string(),
        });
    }
    Ok(())
}

/// Pay one chunk of recipients. Owner only.
///
/// Epoch rules:
/// 1. `epoch` above the last recorded epoch opens a new distribution and pins
///    the current block height and tx index to it.
/// 2. `epoch` equal to the last one is a further chunk of that distribution and
///    is only accepted from the pinned transaction, with the same snapshot.
/// 3. Anything else is a replay and fails, including a continuation from an
///    env without transaction info.
///
/// A non-zero `nft_count` caps the recipients of one epoch, since every
/// recipient holds at least one token.
pub fn distribute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    params: DistributeParams,
) -> Result<Response, ContractError> {
    let DistributeParams {
        epoch,
        snapshot_digest,
        recipients,
    } = params;

    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {
            reason: "only owner can distribute".to_string(),
        });
    }

    if recipients.is_empty() {
        return Err(ContractError::NoRecipients);
    }
    validate_snapshot_digest(&snapshot_digest)?;

    let mut chunk_total = Uint128::zero();
    let mut sends = Vec::with_capacity(recipients.len());
    for recipient in &recipients {
        deps.api.addr_validate(&recipient.addr)?;
        if recipient.amount.is_zero() {
            return Err(ContractError::ZeroAmount {
                addr: recipient.addr.clone(),
            });
        }
        chunk_total += recipient.amount;
        sends.push(BankMsg::Send {
            to_address: recipient.addr.clone(),
            amount: coins(recipient.amount.u128(), &config.denom),
        });
    }

    let available = deps
        .querier
        .query_balance(env.contract.address.as_str(), &config.denom)?
        .amount;
    if available < chunk_total {
        return Err(ContractError::InsufficientFunds {
            needed: chunk_total,
            available,
            denom: config.denom,
        });
    }

    let tx_index = env.transaction.as_ref().map(|tx| tx.index);
    let mut state = DISTRIBUTION_STATE.load(deps.storage)?;

    let record = match state.last_epoch {
        Some(last_epoch) if epoch < last_epoch => {
            return Err(ContractError::EpochAlreadyDistributed { epoch, last_epoch });
        }
        Some(last_epoch) if epoch == last_epoch => {
            let mut record = DISTRIBUTIONS.load(deps.storage, epoch)?;
            // a continuation needs a known tx index to prove it is the same tx
            let same_tx = tx_index.is_some()
                && record.tx_index == tx_index
                && record.block_height == env.block.height;
            if !same_tx {
                return Err(ContractError::EpochAlreadyDistributed { epoch, last_epoch });
            }
            if record.snapshot_digest != snapshot_digest {
                return Err(ContractError::SnapshotMismatch {
                    epoch,
                    expected: record.snapshot_digest,
                    got: snapshot_digest,
                });
            }
            record.chunks += 1;
            record.recipients += recipients.len() as u32;
            record.amount += chunk_total;
            record
        }
        _ => {
            state.last_epoch = Some(epoch);
            DistributionRecord {
                epoch,
                snapshot_digest: snapshot_digest.clone(),
                block_height: env.block.height,
                tx_index,
                chunks: 1,
                recipients: recipients.len() as u32,
                amount: chunk_total,
                distributed_at: env.block.time,
            }
        }
    };
    if config.nft_count > 0 && record.recipients > config.nft_count {
        return Err(ContractError::TooManyRecipients {
            epoch,
            recipients: record.recipients,
            nft_count: config.nft_count,
        });
    }
    DISTRIBUTIONS.save(deps.storage, epoch, &record)?;

    state.total_distributed += chunk_total;
    state.total_payouts += recipients.len() as u64;
    DISTRIBUTION_STATE.save(deps.storage, &state)?;

    Ok(Response::new()
        .add_messages(sends)
        .add_attribute("action", "distribute")
        .add_attribute("epoch", epoch.to_string())
        .add_attribute("recipients", recipients.len().to_string())
        .add_attribute("amount", chunk_total.to_string())
        .add_event(
            Event::new("royalty_distributed")
                .add_attribute("epoch", epoch.to_string())
                .add_attribute("chunk", record.chunks.to_string())
                .add_attribute("snapshot_digest", snapshot_digest)
                .add_attribute("recipients", recipients.len().to_string())
                .add_attribute("amount", chunk_total.to_string())
                .add_attribute("denom", config.denom)
                .add_attribute("epoch_total", record.amount.to_string()),
        ))
}

/// Withdraw royalties held for this contract by a marketplace rewards
/// contract. Owner only.
pub fn withdraw_marketplace(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    address: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {
            reason: "only owner can withdraw marketplace royalties".to_string(),
        });
    }
    if amount.is_zero() {
        return Err(ContractError::ZeroWithdraw);
    }

    let marketplace = deps.api.addr_validate(&address)?;
    let withdraw = WasmMsg::Execute {
        contract_addr: marketplace.to_string(),
        msg: to_json_binary(&MarketplaceExecuteMsg::Withdraw {
            asset_info: AssetInfo::NativeToken {
                denom: config.denom.clone(),
            },
            amount,
        })?,
        funds: vec![],
    };

    Ok(Response::new()
        .add_message(withdraw)
        .add_attribute("action", "withdraw_marketplace")
        .add_attribute("marketplace", marketplace)
        .add_attribute("amount", amount.to_string())
        .add_attribute("denom", config.denom))
}

/// Update configuration. Owner only.
pub fn update_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    params: UpdateConfigParams,
) -> Result<Response, ContractError> {
    let UpdateConfigParams { owner, nft_count } = params;

    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.owner {
        return Err(ContractError::Unauthorized {
            reason: "only owner can update config".to_string(),
        });
    }

    if let Some(owner) = owner {
        config.owner = deps.api.addr_validate(&owner)?;
    }
    if let Some(count) = nft_count {
        config.nft_count = count;
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_config")
        .add_attribute("owner", config.owner)
        .add_attribute("nft_count", config.nft_count.to_string()))
}
