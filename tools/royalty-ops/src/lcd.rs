//! Minimal LCD (REST gateway) client: balances, smart queries, broadcast.

use std::collections::BTreeMap;

use cosmwasm_std::{to_json_binary, Decimal, Uint128};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::{localterra_gas_price, GasPrice, Network};
use crate::error::OpsError;

const ORIGIN: &str = "lcd";

#[derive(Deserialize)]
struct BalanceResponse {
    balance: Option<Coin>,
}

#[derive(Deserialize)]
struct Coin {
    amount: Uint128,
}

#[derive(Deserialize)]
struct SmartQueryResponse<T> {
    data: T,
}

#[derive(Deserialize)]
struct BroadcastResponse {
    tx_response: TxResponse,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TxEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<EventAttribute>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TxLog {
    #[serde(default)]
    pub events: Vec<TxEvent>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TxResponse {
    #[serde(default)]
    pub height: String,
    pub txhash: String,
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub codespace: String,
    #[serde(default)]
    pub raw_log: String,
    #[serde(default)]
    pub logs: Vec<TxLog>,
    #[serde(default)]
    pub events: Vec<TxEvent>,
}

impl TxResponse {
    /// A non-zero code means the chain rejected the transaction.
    pub fn check(self) -> Result<Self, OpsError> {
        if self.code != 0 {
            return Err(OpsError::Ledger {
                code: self.code,
                codespace: self.codespace,
                raw_log: self.raw_log,
            });
        }
        Ok(self)
    }

    /// First value of `key` on an event of type `kind`, searching message
    /// logs before the flattened event list.
    pub fn event_attribute(&self, kind: &str, key: &str) -> Option<&str> {
        self.logs
            .iter()
            .flat_map(|log| log.events.iter())
            .chain(self.events.iter())
            .filter(|event| event.kind == kind)
            .flat_map(|event| event.attributes.iter())
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }
}

#[derive(Serialize)]
struct BroadcastRequest<'a> {
    tx_bytes: &'a str,
    mode: &'static str,
}

pub struct LcdClient {
    client: Client,
    base_url: String,
}

impl LcdClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        LcdClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, OpsError> {
        let status = response.status();
        if !status.is_success() {
            return Err(OpsError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response
            .json::<T>()
            .map_err(|e| OpsError::malformed(ORIGIN, format!("{url}: {e}")))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, OpsError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "GET");
        let response = self.client.get(&url).send().map_err(|source| OpsError::Network {
            context: format!("requesting {url}"),
            source,
        })?;
        Self::read_json(&url, response)
    }

    /// Bank balance of `address` in `denom`; an absent entry is zero.
    pub fn balance(&self, address: &str, denom: &str) -> Result<Uint128, OpsError> {
        let response: BalanceResponse = self.get(&format!(
            "/cosmos/bank/v1beta1/balances/{address}/by_denom?denom={denom}"
        ))?;
        Ok(response.balance.map(|coin| coin.amount).unwrap_or_default())
    }

    pub fn query_smart<Q: Serialize, T: DeserializeOwned>(
        &self,
        contract: &str,
        msg: &Q,
    ) -> Result<T, OpsError> {
        let encoded = to_json_binary(msg)?.to_base64();
        let response: SmartQueryResponse<T> = self.get(&format!(
            "/cosmwasm/wasm/v1/contract/{contract}/smart/{encoded}"
        ))?;
        Ok(response.data)
    }

    /// Broadcast signed tx bytes (base64) and wait for inclusion.
    pub fn broadcast(&self, tx_bytes: &str) -> Result<TxResponse, OpsError> {
        let url = format!("{}/cosmos/tx/v1beta1/txs", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&BroadcastRequest {
                tx_bytes,
                mode: "BROADCAST_MODE_BLOCK",
            })
            .send()
            .map_err(|source| OpsError::Network {
                context: format!("broadcasting to {url}"),
                source,
            })?;
        let response: BroadcastResponse = Self::read_json(&url, response)?;
        response.tx_response.check()
    }

    /// Recommended gas price for `denom`: the FCD table on public networks,
    /// the node defaults on localterra.
    pub fn gas_price(&self, network: Network, denom: &str) -> Result<GasPrice, OpsError> {
        let Some(url) = network.gas_prices_url() else {
            return localterra_gas_price(denom);
        };
        let response = self.client.get(url).send().map_err(|source| OpsError::Network {
            context: format!("fetching gas prices from {url}"),
            source,
        })?;
        let prices: BTreeMap<String, String> = Self::read_json(url, response)?;
        pick_gas_price(&prices, denom)
    }
}

pub fn pick_gas_price(prices: &BTreeMap<String, String>, denom: &str) -> Result<GasPrice, OpsError> {
    let raw = prices
        .get(denom)
        .ok_or_else(|| OpsError::Config(format!("Invalid denom: {denom}")))?;
    let amount: Decimal = raw
        .parse()
        .map_err(|e| OpsError::malformed("fcd", format!("gas price {raw:?}: {e}")))?;
    Ok(GasPrice {
        amount,
        denom: denom.to_string(),
    })
}

/// Signed transaction file produced by the external signer.
#[derive(Debug, Deserialize)]
pub struct SignedTxFile {
    pub tx_bytes: String,
}

impl SignedTxFile {
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        // Accept either `{"tx_bytes": "..."}` or a bare base64 string.
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::String(tx_bytes)) => Ok(SignedTxFile { tx_bytes }),
            Ok(value) => serde_json::from_value(value),
            Err(_) => serde_json::from_value(json!({ "tx_bytes": raw.trim() })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(raw: Value) -> TxResponse {
        serde_json::from_value::<BroadcastResponse>(raw).unwrap().tx_response
    }

    #[test]
    fn test_failed_tx_is_ledger_error() {
        let tx = response(json!({
            "tx_response": {
                "height": "0",
                "txhash": "ABCD",
                "code": 5,
                "codespace": "sdk",
                "raw_log": "insufficient funds"
            }
        }));
        let err = tx.check().unwrap_err();
        assert!(matches!(err, OpsError::Ledger { code: 5, .. }));
        assert_eq!(
            err.to_string(),
            "transaction failed!\ncode: 5\ncodespace: sdk\nraw_log: insufficient funds"
        );
    }

    #[test]
    fn test_event_attribute_lookup() {
        let tx = response(json!({
            "tx_response": {
                "height": "100",
                "txhash": "ABCD",
                "code": 0,
                "logs": [{
                    "events": [
                        { "type": "message", "attributes": [{ "key": "action", "value": "store_code" }] },
                        { "type": "store_code", "attributes": [{ "key": "code_id", "value": "42" }] }
                    ]
                }],
                "events": [
                    { "type": "instantiate", "attributes": [{ "key": "_contract_address", "value": "terra1contract" }] }
                ]
            }
        }))
        .check()
        .unwrap();
        assert_eq!(tx.event_attribute("store_code", "code_id"), Some("42"));
        assert_eq!(
            tx.event_attribute("instantiate", "_contract_address"),
            Some("terra1contract")
        );
        assert_eq!(tx.event_attribute("store_code", "missing"), None);
    }

    #[test]
    fn test_balance_body() {
        let body: BalanceResponse =
            serde_json::from_value(json!({ "balance": { "denom": "uluna", "amount": "1000000" } }))
                .unwrap();
        assert_eq!(body.balance.unwrap().amount, Uint128::new(1_000_000));

        let empty: BalanceResponse = serde_json::from_value(json!({ "balance": null })).unwrap();
        assert!(empty.balance.is_none());
    }

    #[test]
    fn test_pick_gas_price() {
        let prices: BTreeMap<String, String> = [
            ("uluna".to_string(), "0.01133".to_string()),
            ("uusd".to_string(), "0.15".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(pick_gas_price(&prices, "uusd").unwrap().to_string(), "0.15uusd");
        assert!(matches!(
            pick_gas_price(&prices, "ukrw"),
            Err(OpsError::Config(_))
        ));
    }

    #[test]
    fn test_signed_tx_file_forms() {
        assert_eq!(SignedTxFile::parse(r#"{"tx_bytes":"CpQB"}"#).unwrap().tx_bytes, "CpQB");
        assert_eq!(SignedTxFile::parse(r#""CpQB""#).unwrap().tx_bytes, "CpQB");
        assert_eq!(SignedTxFile::parse("CpQB\n").unwrap().tx_bytes, "CpQB");
    }
}
