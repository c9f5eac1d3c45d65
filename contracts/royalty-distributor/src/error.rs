use cosmwasm_std::{StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("distribute called with no recipients")]
    NoRecipients,

    #[error("payout to {addr} has zero amount")]
    ZeroAmount { addr: String },

    #[error("epoch {epoch} already distributed (last epoch: {last_epoch})")]
    EpochAlreadyDistributed { epoch: u64, last_epoch: u64 },

    #[error("epoch {epoch} was opened for snapshot {expected}, got {got}")]
    SnapshotMismatch {
        epoch: u64,
        expected: String,
        got: String,
    },

    #[error("invalid snapshot digest: {reason}")]
    InvalidSnapshotDigest { reason: String },

    #[error("insufficient funds: need {needed}{denom}, have {available}{denom}")]
    InsufficientFunds {
        needed: Uint128,
        available: Uint128,
        denom: String,
    },

    #[error("epoch {epoch} would pay {recipients} recipients but the collection has {nft_count} tokens")]
    TooManyRecipients {
        epoch: u64,
        recipients: u32,
        nft_count: u32,
    },

    #[error("withdraw amount must be greater than zero")]
    ZeroWithdraw,
}
