use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

pub const CONFIG: Item<Config> = Item::new("config");
pub const DISTRIBUTION_STATE: Item<DistributionState> = Item::new("distribution_state");
pub const DISTRIBUTIONS: Map<u64, DistributionRecord> = Map::new("distributions");

#[cw_serde]
pub struct Config {
    pub owner: Addr,
    /// Total supply of the collection. When non-zero, bounds the number of
    /// recipients a single epoch may pay.
    pub nft_count: u32,
    pub denom: String,
}

#[cw_serde]
pub struct DistributionState {
    /// Highest epoch ever opened. A new distribution must use a higher one.
    pub last_epoch: Option<u64>,
    pub total_distributed: Uint128,
    pub total_payouts: u64,
}

/// One distribution epoch. Every chunk of the epoch is folded into the same
/// record, which also pins the transaction that opened it.
#[cw_serde]
pub struct DistributionRecord {
    pub epoch: u64,
    pub snapshot_digest: String,
    pub block_height: u64,
    pub tx_index: Option<u32>,
    pub chunks: u32,
    pub recipients: u32,
    pub amount: Uint128,
    pub distributed_at: Timestamp,
}
