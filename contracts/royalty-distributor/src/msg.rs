use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Uint128;
use royalty_common::types::Recipient;

use crate::state::{Config, DistributionRecord, DistributionState};

#[cw_serde]
pub struct InstantiateMsg {
    pub owner: String,
    pub nft_count: u32,
    /// Payout denom. Defaults to `uluna`.
    pub denom: Option<String>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Pay one chunk of recipients from the contract balance. Owner only.
    ///
    /// All chunks of a distribution carry the same `epoch` and must arrive in
    /// the same transaction; a later transaction can only open a higher epoch.
    Distribute {
        epoch: u64,
        /// Hex sha256 of the ownership snapshot the payouts were computed from.
        snapshot_digest: String,
        recipients: Vec<Recipient>,
    },
    /// Pull royalties accrued for this contract out of a marketplace rewards
    /// contract. Owner only.
    WithdrawMarketplace { address: String, amount: Uint128 },
    /// Update configuration. Owner only.
    UpdateConfig {
        owner: Option<String>,
        nft_count: Option<u32>,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(Config)]
    Config {},
    #[returns(DistributionState)]
    State {},
    #[returns(Option<DistributionRecord>)]
    Distribution { epoch: u64 },
    #[returns(DistributionHistoryResponse)]
    DistributionHistory {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
pub struct DistributionHistoryResponse {
    pub distributions: Vec<DistributionRecord>,
}

/// Asset descriptor understood by the marketplace rewards contract.
#[cw_serde]
pub enum AssetInfo {
    NativeToken { denom: String },
}

/// Execute messages sent to the marketplace rewards contract.
#[cw_serde]
pub enum MarketplaceExecuteMsg {
    Withdraw { asset_info: AssetInfo, amount: Uint128 },
}

/// Queries understood by the marketplace rewards contract.
/// `Balance` returns the amount held for `address` as a decimal string.
#[cw_serde]
pub enum MarketplaceQueryMsg {
    Balance { address: String, asset_info: AssetInfo },
}
