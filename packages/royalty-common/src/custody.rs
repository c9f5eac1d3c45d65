use std::collections::BTreeMap;

use cosmwasm_schema::cw_serde;

use crate::error::PipelineError;
use crate::snapshot::OwnershipRecord;
use crate::types::{CustodyClass, TokenId};

/// Wallets that hold tokens on behalf of someone else. Tokens owned by any of
/// these are not eligible for payouts.
#[cw_serde]
pub struct KnownAddresses {
    pub unminted: String,
    pub marketplace_a_custody: String,
    pub marketplace_b_custody: String,
    pub protocol_wallet: String,
}

impl KnownAddresses {
    pub fn class_of(&self, owner: &str) -> CustodyClass {
        if owner == self.unminted {
            CustodyClass::Unminted
        } else if owner == self.marketplace_a_custody {
            CustodyClass::MarketplaceACustody
        } else if owner == self.marketplace_b_custody {
            CustodyClass::MarketplaceBCustody
        } else if owner == self.protocol_wallet {
            CustodyClass::ProtocolWallet
        } else {
            CustodyClass::Eligible
        }
    }
}

/// A snapshot split by custody class. Each class keeps its `(token, owner)`
/// entries in ascending token order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustodyPartition {
    classes: BTreeMap<CustodyClass, Vec<(TokenId, String)>>,
}

impl CustodyPartition {
    pub fn entries(&self, class: CustodyClass) -> &[(TokenId, String)] {
        self.classes.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, class: CustodyClass) -> usize {
        self.entries(class).len()
    }

    pub fn eligible(&self) -> &[(TokenId, String)] {
        self.entries(CustodyClass::Eligible)
    }

    pub fn total(&self) -> usize {
        self.classes.values().map(Vec::len).sum()
    }

    /// Per-class counts in declaration order, including empty classes.
    pub fn counts(&self) -> Vec<(CustodyClass, usize)> {
        CustodyClass::ALL
            .iter()
            .map(|class| (*class, self.count(*class)))
            .collect()
    }
}

/// Partition every token of `record` into exactly one custody class.
///
/// `record` must hold exactly the ids `1..=expected_supply`; a partial or
/// corrupt snapshot never reaches the payout math, even when a stray id
/// outside the range keeps the count right.
pub fn classify(
    record: &OwnershipRecord,
    known: &KnownAddresses,
    expected_supply: u32,
) -> Result<CustodyPartition, PipelineError> {
    record.ensure_complete(expected_supply)?;

    let mut partition = CustodyPartition::default();
    for (token_id, owner) in record.iter() {
        partition
            .classes
            .entry(known.class_of(owner))
            .or_default()
            .push((token_id, owner.to_string()));
    }
    Ok(partition)
}
