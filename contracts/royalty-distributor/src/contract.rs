#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult, Uint128};
use cw2::{get_contract_version, set_contract_version};

use crate::error::ContractError;
use crate::execute::{self, DistributeParams, UpdateConfigParams};
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg};
use crate::query;
use crate::state::{Config, DistributionState, CONFIG, DISTRIBUTION_STATE};

pub const CONTRACT_NAME: &str = "crates.io:royalty-distributor";
pub const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_DENOM: &str = "uluna";

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = Config {
        owner: deps.api.addr_validate(&msg.owner)?,
        nft_count: msg.nft_count,
        denom: msg.denom.unwrap_or_else(|| DEFAULT_DENOM.to_string()),
    };
    CONFIG.save(deps.storage, &config)?;

    DISTRIBUTION_STATE.save(
        deps.storage,
        &DistributionState {
            last_epoch: None,
            total_distributed: Uint128::zero(),
            total_payouts: 0,
        },
    )?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "royalty-distributor")
        .add_attribute("owner", config.owner)
        .add_attribute("sender", info.sender))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::Distribute {
            epoch,
            snapshot_digest,
            recipients,
        } => execute::distribute(
            deps,
            env,
            info,
            DistributeParams {
                epoch,
                snapshot_digest,
                recipients,
            },
        ),
        ExecuteMsg::WithdrawMarketplace { address, amount } => {
            execute::withdraw_marketplace(deps, env, info, address, amount)
        }
        ExecuteMsg::UpdateConfig { owner, nft_count } => execute::update_config(
            deps,
            env,
            info,
            UpdateConfigParams { owner, nft_count },
        ),
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::State {} => query::query_state(deps),
        QueryMsg::Distribution { epoch } => query::query_distribution(deps, epoch),
        QueryMsg::DistributionHistory { start_after, limit } => {
            query::query_distribution_history(deps, start_after, limit)
        }
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
