//! Unsigned Cosmos SDK transactions in the JSON form signers accept
//! (`tx sign <file>`).

use cosmwasm_std::{Binary, Coin, Decimal, Uint128, Uint64};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GasPrice;
use crate::error::OpsError;

pub const DEFAULT_GAS_PER_MSG: u64 = 300_000;

/// Messages the tool produces, tagged with their protobuf type URL.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum TxMsg {
    #[serde(rename = "/cosmwasm.wasm.v1.MsgStoreCode")]
    StoreCode {
        sender: String,
        wasm_byte_code: Binary,
    },
    #[serde(rename = "/cosmwasm.wasm.v1.MsgInstantiateContract")]
    InstantiateContract {
        sender: String,
        admin: String,
        code_id: Uint64,
        label: String,
        msg: Value,
        funds: Vec<Coin>,
    },
    #[serde(rename = "/cosmwasm.wasm.v1.MsgMigrateContract")]
    MigrateContract {
        sender: String,
        contract: String,
        code_id: Uint64,
        msg: Value,
    },
    #[serde(rename = "/cosmwasm.wasm.v1.MsgExecuteContract")]
    ExecuteContract {
        sender: String,
        contract: String,
        msg: Value,
        funds: Vec<Coin>,
    },
}

impl TxMsg {
    pub fn execute<M: Serialize>(
        sender: impl Into<String>,
        contract: impl Into<String>,
        msg: &M,
    ) -> Result<Self, OpsError> {
        Ok(TxMsg::ExecuteContract {
            sender: sender.into(),
            contract: contract.into(),
            msg: to_value(msg)?,
            funds: vec![],
        })
    }

    pub fn instantiate<M: Serialize>(
        sender: impl Into<String>,
        code_id: u64,
        label: impl Into<String>,
        msg: &M,
    ) -> Result<Self, OpsError> {
        let sender = sender.into();
        Ok(TxMsg::InstantiateContract {
            admin: sender.clone(),
            sender,
            code_id: Uint64::new(code_id),
            label: label.into(),
            msg: to_value(msg)?,
            funds: vec![],
        })
    }

    pub fn migrate<M: Serialize>(
        sender: impl Into<String>,
        contract: impl Into<String>,
        code_id: u64,
        msg: &M,
    ) -> Result<Self, OpsError> {
        Ok(TxMsg::MigrateContract {
            sender: sender.into(),
            contract: contract.into(),
            code_id: Uint64::new(code_id),
            msg: to_value(msg)?,
        })
    }
}

fn to_value<M: Serialize>(msg: &M) -> Result<Value, OpsError> {
    serde_json::to_value(msg).map_err(|e| OpsError::Config(format!("unencodable message: {e}")))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TxBody {
    pub messages: Vec<TxMsg>,
    pub memo: String,
    pub timeout_height: Uint64,
    pub extension_options: Vec<Value>,
    pub non_critical_extension_options: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Vec<Coin>,
    pub gas_limit: Uint64,
    pub payer: String,
    pub granter: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthInfo {
    pub signer_infos: Vec<Value>,
    pub fee: Fee,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnsignedTx {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    pub signatures: Vec<String>,
}

/// Gas estimate per message and the price it is paid at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_per_msg: u64,
    pub adjustment: Decimal,
    pub price: GasPrice,
}

impl GasSettings {
    pub fn new(price: GasPrice) -> Self {
        GasSettings {
            gas_per_msg: DEFAULT_GAS_PER_MSG,
            adjustment: Decimal::permille(1400),
            price,
        }
    }

    /// `ceil(gas_per_msg * msgs * adjustment)`
    pub fn gas_limit(&self, msgs: usize) -> Uint128 {
        Uint128::from(self.gas_per_msg)
            .saturating_mul(Uint128::from(msgs as u64))
            .mul_ceil(self.adjustment)
    }

    /// `ceil(gas_limit * price)` in the price denom.
    pub fn fee(&self, msgs: usize) -> Result<Fee, OpsError> {
        let gas_limit = self.gas_limit(msgs);
        let amount = gas_limit.mul_ceil(self.price.amount);
        let gas_limit = u64::try_from(gas_limit.u128())
            .map_err(|_| OpsError::Config(format!("gas limit {gas_limit} overflows u64")))?;
        Ok(Fee {
            amount: vec![Coin::new(amount, self.price.denom.clone())],
            gas_limit: Uint64::new(gas_limit),
            payer: String::new(),
            granter: String::new(),
        })
    }
}

impl UnsignedTx {
    pub fn new(messages: Vec<TxMsg>, memo: impl Into<String>, fee: Fee) -> Self {
        UnsignedTx {
            body: TxBody {
                messages,
                memo: memo.into(),
                timeout_height: Uint64::zero(),
                extension_options: vec![],
                non_critical_extension_options: vec![],
            },
            auth_info: AuthInfo {
                signer_infos: vec![],
                fee,
            },
            signatures: vec![],
        }
    }
}
