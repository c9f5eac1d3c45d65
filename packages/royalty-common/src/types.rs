use cosmwasm_schema::cw_serde;
use cosmwasm_std::Uint128;

/// Identifier of one NFT in the collection, `1..=total_supply`.
pub type TokenId = u32;

/// Custody category of a token, derived from its owner address.
#[cw_serde]
#[derive(Copy, Eq, PartialOrd, Ord, Hash)]
pub enum CustodyClass {
    /// Still held by the minting wallet.
    Unminted,
    /// Held in escrow by marketplace A's custody contract.
    MarketplaceACustody,
    /// Held in escrow by marketplace B's custody contract.
    MarketplaceBCustody,
    /// Held by the project's own wallet.
    ProtocolWallet,
    /// Held by a regular holder; qualifies for payouts.
    Eligible,
}

impl CustodyClass {
    pub const ALL: [CustodyClass; 5] = [
        CustodyClass::Unminted,
        CustodyClass::MarketplaceACustody,
        CustodyClass::MarketplaceBCustody,
        CustodyClass::ProtocolWallet,
        CustodyClass::Eligible,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CustodyClass::Unminted => "unminted",
            CustodyClass::MarketplaceACustody => "marketplace_a_custody",
            CustodyClass::MarketplaceBCustody => "marketplace_b_custody",
            CustodyClass::ProtocolWallet => "protocol_wallet",
            CustodyClass::Eligible => "eligible",
        }
    }
}

/// A single payout: `amount` of the reward denom to `addr`.
#[cw_serde]
#[derive(Eq)]
pub struct Recipient {
    pub addr: String,
    pub amount: Uint128,
}

impl Recipient {
    pub fn new(addr: impl Into<String>, amount: impl Into<Uint128>) -> Self {
        Recipient {
            addr: addr.into(),
            amount: amount.into(),
        }
    }
}
