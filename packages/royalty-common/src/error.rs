use cosmwasm_std::Uint128;
use thiserror::Error;

use crate::types::TokenId;

/// Consistency failures raised by the snapshot/payout pipeline.
/// Every variant aborts a distribution run.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PipelineError {
    #[error("classified {classified} tokens but expected supply is {expected}")]
    SupplyMismatch { expected: u32, classified: usize },

    #[error("snapshot is missing {} token ids (first: {})", .missing.len(), .missing.first().copied().unwrap_or_default())]
    IncompleteSnapshot { missing: Vec<TokenId> },

    #[error("no eligible tokens to divide the reward pool across")]
    NoEligibleTokens,

    #[error("reward pool of {reward_pool} is less than one unit per eligible token ({eligible_tokens})")]
    PoolBelowShare {
        reward_pool: Uint128,
        eligible_tokens: u64,
    },

    #[error("chunk size must be at least 1, got {size}")]
    InvalidChunkSize { size: usize },
}
