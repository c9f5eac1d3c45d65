//! Paginated listings of the second marketplace.

use std::fmt;

use reqwest::blocking::Client;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::OpsError;

const ORIGIN: &str = "listings";

/// One active listing: the escrowed token and the wallet that listed it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(deserialize_with = "token_id_from_any")]
    pub token_id: u64,
    pub seller: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingsRequest<'a> {
    pub limit: usize,
    pub offset: usize,
    pub nft_contracts: [&'a str; 1],
    pub status: [&'static str; 3],
    pub sale_types: [&'static str; 2],
}

impl<'a> ListingsRequest<'a> {
    pub fn new(nft_contract: &'a str, offset: usize, limit: usize) -> Self {
        ListingsRequest {
            limit,
            offset,
            nft_contracts: [nft_contract],
            status: ["NotStarted", "InProgress", "BuyNow"],
            sale_types: ["buy-now", "auction"],
        }
    }
}

/// Source of listing pages. An empty page marks the end.
pub trait ListingSource {
    fn listings_page(
        &self,
        nft_contract: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Listing>, OpsError>;
}

pub struct ListingsClient {
    client: Client,
    url: String,
}

impl ListingsClient {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        ListingsClient {
            client,
            url: url.into(),
        }
    }
}

impl ListingSource for ListingsClient {
    fn listings_page(
        &self,
        nft_contract: &str,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Listing>, OpsError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ListingsRequest::new(nft_contract, offset, limit))
            .send()
            .map_err(|source| OpsError::Network {
                context: format!("fetching listings at offset {offset}"),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OpsError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .map_err(|source| OpsError::Network {
                context: format!("reading listings at offset {offset}"),
                source,
            })?;
        parse_page(&body)
    }
}

pub fn parse_page(body: &str) -> Result<Vec<Listing>, OpsError> {
    serde_json::from_str(body).map_err(|e| OpsError::malformed(ORIGIN, e.to_string()))
}

/// Token ids arrive as either numbers or numeric strings.
fn token_id_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct TokenIdVisitor;

    impl<'de> Visitor<'de> for TokenIdVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a token id as number or string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative token id {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid token id {v:?}")))
        }
    }

    deserializer.deserialize_any(TokenIdVisitor)
}
