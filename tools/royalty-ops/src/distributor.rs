use std::fs;
use std::path::PathBuf;

use cosmwasm_std::Uint128;
use royalty_common::{
    chunk_recipients, classify, compute_payouts, CustodyClass, KnownAddresses, OwnershipRecord,
    PayoutPlan, PipelineError, Recipient, DEFAULT_CHUNK_SIZE,
};
use royalty_distributor::msg::ExecuteMsg;
use tracing::info;

use crate::error::OpsError;
use crate::tx::{GasSettings, TxMsg, UnsignedTx};

/// Classify `record`, split `reward_pool` across eligible tokens, and log the
/// breakdown. A pool too small to pay every eligible token at least one unit
/// fails here, since the contract rejects zero-amount payouts.
pub fn plan_distribution(
    record: &OwnershipRecord,
    known: &KnownAddresses,
    expected_supply: u32,
    reward_pool: Uint128,
) -> Result<PayoutPlan, OpsError> {
    let partition = classify(record, known, expected_supply)?;
    for (class, count) in partition.counts() {
        info!(class = class.as_str(), count, "classified tokens");
    }

    let plan = compute_payouts(partition.eligible(), reward_pool)?;
    info!(
        eligible = partition.count(CustodyClass::Eligible),
        per_token_share = %plan.per_token_share,
        addresses = plan.recipients.len(),
        "computed payouts"
    );
    info!(
        pool = %plan.reward_pool,
        total = %plan.total,
        remainder = %plan.remainder,
        "payout totals"
    );
    if plan.per_token_share.is_zero() {
        return Err(PipelineError::PoolBelowShare {
            reward_pool: plan.reward_pool,
            eligible_tokens: plan.eligible_tokens,
        }
        .into());
    }
    Ok(plan)
}

/// Turns a recipient list into chunked `distribute` messages for one epoch.
#[derive(Clone, Debug)]
pub struct BatchDistributor {
    pub contract: String,
    pub sender: String,
    pub chunk_size: usize,
}

impl BatchDistributor {
    pub fn new(contract: impl Into<String>, sender: impl Into<String>) -> Self {
        BatchDistributor {
            contract: contract.into(),
            sender: sender.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// One message per chunk, in recipient order. Every message carries the
    /// same epoch and digest so the contract accepts them as one distribution.
    pub fn messages(
        &self,
        epoch: u64,
        snapshot_digest: &str,
        recipients: &[Recipient],
    ) -> Result<Vec<TxMsg>, OpsError> {
        chunk_recipients(recipients, self.chunk_size)?
            .into_iter()
            .map(|chunk| {
                TxMsg::execute(
                    &self.sender,
                    &self.contract,
                    &ExecuteMsg::Distribute {
                        epoch,
                        snapshot_digest: snapshot_digest.to_string(),
                        recipients: chunk,
                    },
                )
            })
            .collect()
    }
}

/// Where a finished transaction ends up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Submission {
    /// Unsigned transaction written for an external signer.
    Written { path: PathBuf, messages: usize },
}

/// Accepts all messages of one transaction; they succeed or fail together.
pub trait TxSink {
    fn submit(&mut self, messages: Vec<TxMsg>) -> Result<Submission, OpsError>;
}

/// Writes an unsigned transaction JSON for `tx sign`.
pub struct UnsignedTxWriter {
    pub path: PathBuf,
    pub gas: GasSettings,
    pub memo: String,
}

impl UnsignedTxWriter {
    pub fn new(path: impl Into<PathBuf>, gas: GasSettings) -> Self {
        UnsignedTxWriter {
            path: path.into(),
            gas,
            memo: String::new(),
        }
    }

    pub fn build(&self, messages: Vec<TxMsg>) -> Result<UnsignedTx, OpsError> {
        let fee = self.gas.fee(messages.len())?;
        Ok(UnsignedTx::new(messages, self.memo.clone(), fee))
    }
}

impl TxSink for UnsignedTxWriter {
    fn submit(&mut self, messages: Vec<TxMsg>) -> Result<Submission, OpsError> {
        if messages.is_empty() {
            return Err(OpsError::Config("refusing to write an empty transaction".to_string()));
        }
        let count = messages.len();
        let tx = self.build(messages)?;
        let json = serde_json::to_string_pretty(&tx).map_err(|source| OpsError::FileFormat {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| OpsError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!(
            path = %self.path.display(),
            messages = count,
            gas_limit = %tx.auth_info.fee.gas_limit,
            "wrote unsigned transaction"
        );
        Ok(Submission::Written {
            path: self.path.clone(),
            messages: count,
        })
    }
}
