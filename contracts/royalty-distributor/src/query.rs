use cosmwasm_std::{to_json_binary, Binary, Deps, Order, StdResult};
use cw_storage_plus::Bound;

use crate::msg::DistributionHistoryResponse;
use crate::state::{CONFIG, DISTRIBUTIONS, DISTRIBUTION_STATE};

const DEFAULT_HISTORY_LIMIT: u32 = 20;
const MAX_HISTORY_LIMIT: u32 = 100;

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_state(deps: Deps) -> StdResult<Binary> {
    let state = DISTRIBUTION_STATE.load(deps.storage)?;
    to_json_binary(&state)
}

pub fn query_distribution(deps: Deps, epoch: u64) -> StdResult<Binary> {
    let record = DISTRIBUTIONS.may_load(deps.storage, epoch)?;
    to_json_binary(&record)
}

pub fn query_distribution_history(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).min(MAX_HISTORY_LIMIT) as usize;

    let distributions = DISTRIBUTIONS
        .range(deps.storage, start_after.map(Bound::exclusive), None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, record)| record))
        .collect::<StdResult<Vec<_>>>()?;

    to_json_binary(&DistributionHistoryResponse { distributions })
}
