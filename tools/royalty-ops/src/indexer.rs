//! Aggregated `owner_of` lookups against the Mantle GraphQL indexer.
//!
//! One request carries up to a batch worth of aliased sub-queries:
//!
//! ```graphql
//! query {
//!   id_17: WasmContractsContractAddressStore(
//!     ContractAddress: "terra1...",
//!     QueryMsg: "{\"owner_of\":{\"token_id\":\"17\"}}"
//!   ) { Result }
//! }
//! ```
//!
//! Every `Result` is itself a JSON document encoded as a string.

use std::collections::BTreeMap;

use reqwest::blocking::Client;
use royalty_common::TokenId;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::OpsError;

const ORIGIN: &str = "indexer";

/// Resolves owners of many tokens in one round trip.
pub trait OwnerIndex {
    /// Current owner of each id according to the NFT contract itself.
    fn owners_of(
        &self,
        nft_contract: &str,
        ids: &[TokenId],
    ) -> Result<BTreeMap<TokenId, String>, OpsError>;

    /// Actual lister of each id held by an escrow contract.
    fn escrow_listers(
        &self,
        escrow: &str,
        nft_contract: &str,
        ids: &[TokenId],
    ) -> Result<BTreeMap<TokenId, String>, OpsError>;
}

#[derive(Deserialize)]
struct OwnerOfResponse {
    owner: String,
}

/// The kind of sub-query a batch was built from; decides how each `Result`
/// string is decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LookupKind {
    OwnerOf,
    EscrowLister,
}

fn alias(id: TokenId) -> String {
    format!("id_{id}")
}

fn store_query(id: TokenId, contract: &str, query_msg: &Value) -> String {
    // The QueryMsg argument is a GraphQL string whose content is JSON; a JSON
    // string literal is a valid GraphQL string literal.
    let encoded = Value::String(query_msg.to_string()).to_string();
    format!(
        "  {}: WasmContractsContractAddressStore(\n    ContractAddress: {},\n    QueryMsg: {}\n  ) {{\n    Result\n  }}",
        alias(id),
        Value::String(contract.to_string()),
        encoded
    )
}

pub fn owner_of_query(nft_contract: &str, id: TokenId) -> String {
    store_query(
        id,
        nft_contract,
        &json!({ "owner_of": { "token_id": id.to_string() } }),
    )
}

pub fn escrow_lister_query(escrow: &str, nft_contract: &str, id: TokenId) -> String {
    store_query(
        id,
        escrow,
        &json!({
            "nft_owner": {
                "asset_info": {
                    "nft": { "contract_addr": nft_contract, "token_id": id.to_string() }
                }
            }
        }),
    )
}

pub fn wrap_queries(queries: &[String]) -> String {
    format!("query {{\n{}\n}}", queries.join("\n"))
}

/// Decode a batch response into one owner per requested id. A missing alias,
/// a null result, or an undecodable `Result` string fails the whole batch.
pub fn parse_batch(
    body: &Value,
    requested: &[TokenId],
    kind: LookupKind,
) -> Result<BTreeMap<TokenId, String>, OpsError> {
    if let Some(errors) = body.get("errors").filter(|e| !e.is_null()) {
        return Err(OpsError::malformed(ORIGIN, format!("query errors: {errors}")));
    }
    let data = body
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| OpsError::malformed(ORIGIN, "response has no data object"))?;

    let mut owners = BTreeMap::new();
    for id in requested {
        let key = alias(*id);
        let raw = data
            .get(&key)
            .and_then(|entry| entry.get("Result"))
            .and_then(Value::as_str)
            .ok_or_else(|| OpsError::malformed(ORIGIN, format!("no result for {key}")))?;

        let owner = match kind {
            LookupKind::OwnerOf => serde_json::from_str::<OwnerOfResponse>(raw)
                .map(|r| r.owner)
                .map_err(|e| OpsError::malformed(ORIGIN, format!("{key}: {e}")))?,
            LookupKind::EscrowLister => serde_json::from_str::<String>(raw)
                .map_err(|e| OpsError::malformed(ORIGIN, format!("{key}: {e}")))?,
        };
        owners.insert(*id, owner);
    }
    Ok(owners)
}

/// `OwnerIndex` backed by the Mantle GraphQL endpoint.
pub struct MantleIndexer {
    client: Client,
    url: String,
}

impl MantleIndexer {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        MantleIndexer {
            client,
            url: url.into(),
        }
    }

    fn post(&self, query: String) -> Result<Value, OpsError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "query": query }))
            .send()
            .map_err(|source| OpsError::Network {
                context: format!("querying {}", self.url),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OpsError::HttpStatus {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .map_err(|e| OpsError::malformed(ORIGIN, e.to_string()))
    }
}

impl OwnerIndex for MantleIndexer {
    fn owners_of(
        &self,
        nft_contract: &str,
        ids: &[TokenId],
    ) -> Result<BTreeMap<TokenId, String>, OpsError> {
        let queries: Vec<String> = ids.iter().map(|id| owner_of_query(nft_contract, *id)).collect();
        let body = self.post(wrap_queries(&queries))?;
        parse_batch(&body, ids, LookupKind::OwnerOf)
    }

    fn escrow_listers(
        &self,
        escrow: &str,
        nft_contract: &str,
        ids: &[TokenId],
    ) -> Result<BTreeMap<TokenId, String>, OpsError> {
        let queries: Vec<String> = ids
            .iter()
            .map(|id| escrow_lister_query(escrow, nft_contract, *id))
            .collect();
        let body = self.post(wrap_queries(&queries))?;
        parse_batch(&body, ids, LookupKind::EscrowLister)
    }
}
