use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::PipelineError;
use crate::types::TokenId;

/// Owner of every token in the collection at snapshot time.
///
/// Entries are kept ordered by token id. Later writes for the same id replace
/// earlier ones, so merging sources in fetch order (primary indexer, then
/// marketplace A, then marketplace B) yields the final owner.
///
/// Serializes as a flat JSON object: `{ "1": "terra1...", "2": "terra1..." }`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct OwnershipRecord {
    owners: BTreeMap<TokenId, String>,
}

impl OwnershipRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the owner of `token_id`, returning the previous owner if any.
    pub fn insert(&mut self, token_id: TokenId, owner: impl Into<String>) -> Option<String> {
        self.owners.insert(token_id, owner.into())
    }

    /// Merge `entries` into the record with last-write-wins semantics.
    /// Returns how many existing owners were replaced by a different address.
    pub fn merge<I, S>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (TokenId, S)>,
        S: Into<String>,
    {
        let mut replaced = 0;
        for (token_id, owner) in entries {
            let owner = owner.into();
            if let Some(previous) = self.owners.insert(token_id, owner.clone()) {
                if previous != owner {
                    replaced += 1;
                }
            }
        }
        replaced
    }

    pub fn owner_of(&self, token_id: TokenId) -> Option<&str> {
        self.owners.get(&token_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &str)> {
        self.owners.iter().map(|(id, owner)| (*id, owner.as_str()))
    }

    /// All token ids currently owned by `owner`, ascending.
    pub fn tokens_owned_by(&self, owner: &str) -> Vec<TokenId> {
        self.owners
            .iter()
            .filter(|(_, o)| o.as_str() == owner)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Token ids in `1..=supply` with no recorded owner.
    pub fn missing(&self, supply: u32) -> Vec<TokenId> {
        (1..=supply)
            .filter(|id| !self.owners.contains_key(id))
            .collect()
    }

    /// Fails unless every id in `1..=supply` has exactly one owner and no id
    /// falls outside that range.
    pub fn ensure_complete(&self, supply: u32) -> Result<(), PipelineError> {
        let missing = self.missing(supply);
        if !missing.is_empty() {
            return Err(PipelineError::IncompleteSnapshot { missing });
        }
        if self.owners.len() != supply as usize {
            return Err(PipelineError::SupplyMismatch {
                expected: supply,
                classified: self.owners.len(),
            });
        }
        Ok(())
    }

    /// `sha256( for each entry in id order: id_be_u32 || owner_len_be_u32 || owner )`, hex.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (id, owner) in &self.owners {
            hasher.update(id.to_be_bytes());
            hasher.update((owner.len() as u32).to_be_bytes());
            hasher.update(owner.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

impl FromIterator<(TokenId, String)> for OwnershipRecord {
    fn from_iter<T: IntoIterator<Item = (TokenId, String)>>(iter: T) -> Self {
        OwnershipRecord {
            owners: iter.into_iter().collect(),
        }
    }
}
