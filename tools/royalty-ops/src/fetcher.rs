use std::collections::BTreeMap;

use royalty_common::{OwnershipRecord, TokenId};
use tracing::{info, warn};

use crate::error::OpsError;
use crate::indexer::OwnerIndex;
use crate::listings::ListingSource;
use crate::retry::RetryPolicy;

pub const DEFAULT_BATCH_SIZE: u32 = 500;
pub const DEFAULT_PAGE_SIZE: usize = 500;

#[derive(Clone, Debug)]
pub struct SnapshotConfig {
    pub nft_contract: String,
    pub total_supply: u32,
    pub batch_size: u32,
    pub page_size: usize,
    /// Escrow contract of marketplace A; tokens it holds are re-queried
    /// against it for the actual lister.
    pub marketplace_a_custody: String,
    pub retry: RetryPolicy,
}

impl SnapshotConfig {
    pub fn new(
        nft_contract: impl Into<String>,
        total_supply: u32,
        marketplace_a_custody: impl Into<String>,
    ) -> Self {
        SnapshotConfig {
            nft_contract: nft_contract.into(),
            total_supply,
            batch_size: DEFAULT_BATCH_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            marketplace_a_custody: marketplace_a_custody.into(),
            retry: RetryPolicy::default(),
        }
    }

    fn validate(&self) -> Result<(), OpsError> {
        if self.total_supply == 0 {
            return Err(OpsError::Config("total supply must be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(OpsError::Config("batch size must be positive".to_string()));
        }
        if self.page_size == 0 {
            return Err(OpsError::Config("page size must be positive".to_string()));
        }
        Ok(())
    }
}

/// Inclusive, consecutive id ranges covering `[1, supply]` exactly once.
pub fn batch_ranges(supply: u32, batch_size: u32) -> Vec<(TokenId, TokenId)> {
    let mut ranges = Vec::new();
    let mut start: TokenId = 1;
    while start <= supply {
        let end = start.saturating_add(batch_size.saturating_sub(1)).min(supply);
        ranges.push((start, end));
        if end == supply {
            break;
        }
        start = end + 1;
    }
    ranges
}

/// Builds a complete ownership record from the indexer and both marketplaces.
pub struct SnapshotFetcher<'a, I, L> {
    config: &'a SnapshotConfig,
    index: &'a I,
    listings: &'a L,
}

impl<'a, I, L> SnapshotFetcher<'a, I, L>
where
    I: OwnerIndex,
    L: ListingSource,
{
    pub fn new(config: &'a SnapshotConfig, index: &'a I, listings: &'a L) -> Self {
        SnapshotFetcher {
            config,
            index,
            listings,
        }
    }

    /// Primary owners, then marketplace-A listers, then marketplace-B sellers;
    /// each later pass overwrites the earlier one.
    pub fn fetch(&self) -> Result<OwnershipRecord, OpsError> {
        self.config.validate()?;

        let mut record = self.fetch_primary()?;
        info!(tokens = record.len(), "fetched primary owners");

        let escrowed = record.tokens_owned_by(&self.config.marketplace_a_custody);
        let listers = self.fetch_escrow_listers(&escrowed)?;
        let replaced = record.merge(listers);
        info!(escrowed = escrowed.len(), replaced, "applied marketplace A listers");

        let sellers = self.fetch_listings()?;
        let listed = sellers.len();
        let replaced = record.merge(sellers);
        info!(listed, replaced, "applied marketplace B sellers");

        record.ensure_complete(self.config.total_supply)?;
        Ok(record)
    }

    fn fetch_primary(&self) -> Result<OwnershipRecord, OpsError> {
        let mut record = OwnershipRecord::new();
        for (start, end) in batch_ranges(self.config.total_supply, self.config.batch_size) {
            let ids: Vec<TokenId> = (start..=end).collect();
            let owners = self
                .config
                .retry
                .run("owner_of", |_| self.index.owners_of(&self.config.nft_contract, &ids))
                .map_err(|e| OpsError::Fetch {
                    start,
                    end,
                    attempts: e.attempts,
                    source: Box::new(e.error),
                })?;
            info!(start, end, "queried owners");
            record.merge(owners);
        }
        Ok(record)
    }

    fn fetch_escrow_listers(&self, escrowed: &[TokenId]) -> Result<BTreeMap<TokenId, String>, OpsError> {
        let mut listers = BTreeMap::new();
        for ids in escrowed.chunks(self.config.batch_size as usize) {
            let (start, end) = match (ids.first(), ids.last()) {
                (Some(first), Some(last)) => (*first, *last),
                _ => continue,
            };
            let found = self
                .config
                .retry
                .run("nft_owner", |_| {
                    self.index.escrow_listers(
                        &self.config.marketplace_a_custody,
                        &self.config.nft_contract,
                        ids,
                    )
                })
                .map_err(|e| OpsError::Fetch {
                    start,
                    end,
                    attempts: e.attempts,
                    source: Box::new(e.error),
                })?;
            info!(start, end, count = ids.len(), "queried marketplace A listers");
            listers.extend(found);
        }
        Ok(listers)
    }

    fn fetch_listings(&self) -> Result<BTreeMap<TokenId, String>, OpsError> {
        let mut sellers = BTreeMap::new();
        let mut offset = 0;
        loop {
            info!(offset, "fetching marketplace B listings");
            let page = self
                .config
                .retry
                .run("listings", |_| {
                    self.listings
                        .listings_page(&self.config.nft_contract, offset, self.config.page_size)
                })
                .map_err(|e| OpsError::ListingsPage {
                    offset,
                    attempts: e.attempts,
                    source: Box::new(e.error),
                })?;
            if page.is_empty() {
                break;
            }
            offset += page.len();

            for listing in page {
                match TokenId::try_from(listing.token_id) {
                    Ok(id) if (1..=self.config.total_supply).contains(&id) => {
                        sellers.insert(id, listing.seller);
                    }
                    _ => warn!(
                        token_id = listing.token_id,
                        seller = %listing.seller,
                        "skipping listing outside the collection range"
                    ),
                }
            }
        }
        Ok(sellers)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use royalty_common::PipelineError;

    use super::*;
    use crate::listings::Listing;

    const NFT: &str = "terra1nft";
    const ESCROW: &str = "terra1escrow";

    /// Owner index over a fixed table, optionally failing the first calls.
    #[derive(Default)]
    struct FakeIndex {
        owners: BTreeMap<TokenId, String>,
        listers: BTreeMap<TokenId, String>,
        fail_first: RefCell<u32>,
        owner_calls: RefCell<Vec<(TokenId, TokenId)>>,
    }

    impl FakeIndex {
        fn with_owners(owners: &[(TokenId, &str)]) -> Self {
            FakeIndex {
                owners: owners.iter().map(|(id, o)| (*id, o.to_string())).collect(),
                ..Default::default()
            }
        }

        fn maybe_fail(&self) -> Result<(), OpsError> {
            let mut remaining = self.fail_first.borrow_mut();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(OpsError::HttpStatus {
                    url: "https://mantle.test".to_string(),
                    status: 502,
                });
            }
            Ok(())
        }
    }

    impl OwnerIndex for FakeIndex {
        fn owners_of(
            &self,
            _nft_contract: &str,
            ids: &[TokenId],
        ) -> Result<BTreeMap<TokenId, String>, OpsError> {
            self.maybe_fail()?;
            if let (Some(first), Some(last)) = (ids.first(), ids.last()) {
                self.owner_calls.borrow_mut().push((*first, *last));
            }
            Ok(ids
                .iter()
                .filter_map(|id| self.owners.get(id).map(|o| (*id, o.clone())))
                .collect())
        }

        fn escrow_listers(
            &self,
            escrow: &str,
            _nft_contract: &str,
            ids: &[TokenId],
        ) -> Result<BTreeMap<TokenId, String>, OpsError> {
            assert_eq!(escrow, ESCROW);
            Ok(ids
                .iter()
                .filter_map(|id| self.listers.get(id).map(|o| (*id, o.clone())))
                .collect())
        }
    }

    struct FakeListings {
        listings: Vec<Listing>,
    }

    impl ListingSource for FakeListings {
        fn listings_page(
            &self,
            _nft_contract: &str,
            offset: usize,
            limit: usize,
        ) -> Result<Vec<Listing>, OpsError> {
            Ok(self.listings.iter().skip(offset).take(limit).cloned().collect())
        }
    }

    fn no_listings() -> FakeListings {
        FakeListings { listings: vec![] }
    }

    fn config(supply: u32, batch_size: u32) -> SnapshotConfig {
        SnapshotConfig {
            batch_size,
            page_size: 2,
            retry: RetryPolicy::no_delay(3),
            ..SnapshotConfig::new(NFT, supply, ESCROW)
        }
    }

    #[test]
    fn test_batch_ranges_cover_supply() {
        assert_eq!(batch_ranges(1200, 500), vec![(1, 500), (501, 1000), (1001, 1200)]);
        assert_eq!(batch_ranges(500, 500), vec![(1, 500)]);
        assert_eq!(batch_ranges(3, 10), vec![(1, 3)]);
        assert!(batch_ranges(0, 10).is_empty());
    }

    #[test]
    fn test_overrides_apply_in_order() {
        let mut index = FakeIndex::with_owners(&[
            (1, "terra1alice"),
            (2, ESCROW),
            (3, ESCROW),
            (4, "terra1carol"),
        ]);
        index.listers.insert(2, "terra1bob".to_string());
        index.listers.insert(3, "terra1dave".to_string());
        let listings = FakeListings {
            listings: vec![
                Listing { token_id: 3, seller: "terra1erin".to_string() },
                Listing { token_id: 4, seller: "terra1frank".to_string() },
            ],
        };

        let cfg = config(4, 3);
        let record = SnapshotFetcher::new(&cfg, &index, &listings).fetch().unwrap();

        assert_eq!(record.owner_of(1), Some("terra1alice"));
        assert_eq!(record.owner_of(2), Some("terra1bob"));
        // marketplace B wins over marketplace A
        assert_eq!(record.owner_of(3), Some("terra1erin"));
        assert_eq!(record.owner_of(4), Some("terra1frank"));
        assert_eq!(*index.owner_calls.borrow(), vec![(1, 3), (4, 4)]);
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let index = FakeIndex::with_owners(&[(1, "terra1alice"), (2, "terra1bob")]);
        *index.fail_first.borrow_mut() = 2;

        let cfg = config(2, 10);
        let record = SnapshotFetcher::new(&cfg, &index, &no_listings()).fetch().unwrap();
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_retry_exhaustion_names_batch() {
        let index = FakeIndex::with_owners(&[(1, "terra1alice"), (2, "terra1bob")]);
        *index.fail_first.borrow_mut() = 3;

        let cfg = config(2, 10);
        let err = SnapshotFetcher::new(&cfg, &index, &no_listings())
            .fetch()
            .unwrap_err();
        match err {
            OpsError::Fetch { start, end, attempts, .. } => {
                assert_eq!((start, end, attempts), (1, 2, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_gap_fails_run() {
        let index = FakeIndex::with_owners(&[(1, "terra1alice"), (3, "terra1carol")]);
        let cfg = config(3, 10);
        let err = SnapshotFetcher::new(&cfg, &index, &no_listings())
            .fetch()
            .unwrap_err();
        assert!(matches!(
            err,
            OpsError::Pipeline(PipelineError::IncompleteSnapshot { ref missing }) if missing == &vec![2]
        ));
    }

    #[test]
    fn test_listings_outside_range_are_skipped() {
        let index = FakeIndex::with_owners(&[(1, "terra1alice"), (2, "terra1bob")]);
        let listings = FakeListings {
            listings: vec![
                Listing { token_id: 0, seller: "terra1zero".to_string() },
                Listing { token_id: 2, seller: "terra1seller".to_string() },
                Listing { token_id: 9_999, seller: "terra1far".to_string() },
            ],
        };

        let cfg = config(2, 10);
        let record = SnapshotFetcher::new(&cfg, &index, &listings).fetch().unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.owner_of(2), Some("terra1seller"));
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let index = FakeIndex::default();
        let cfg = config(2, 0);
        let err = SnapshotFetcher::new(&cfg, &index, &no_listings())
            .fetch()
            .unwrap_err();
        assert!(matches!(err, OpsError::Config(_)));
    }
}
