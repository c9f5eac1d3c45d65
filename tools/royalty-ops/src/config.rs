use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use cosmwasm_std::Decimal;

use crate::error::OpsError;

pub const DEFAULT_DENOM: &str = "uluna";
pub const DEFAULT_FEE_DENOM: &str = "uusd";

pub const MANTLE_URL: &str = "https://mantle.terra.dev/";
pub const LISTINGS_URL: &str = "https://prod-backend-mainnet.knowhere.art/sales/explore";

pub const UNMINTED_WALLET: &str = "terra1qxa5rfln6qk4nmucwa52z0dfju0hde64d5r72t";
pub const MARKETPLACE_A_CUSTODY: &str = "terra1eek0ymmhyzja60830xhzm7k7jkrk99a60q2z2t";
pub const MARKETPLACE_B_CUSTODY: &str = "terra12v8vrgntasf37xpj282szqpdyad7dgmkgnq60j";
pub const PROTOCOL_WALLET: &str = "terra19jp3up9mke3lt8eg0c8fsaysqtzs6vn23lauls";

/// Minimum gas prices a localterra node accepts out of the box.
const LOCALTERRA_GAS_PRICES: &str = "0.01133uluna,0.15uusd,0.104938usdr,169.77ukrw,428.571umnt,0.125ueur,0.98ucny,16.37ujpy,0.11ugbp,10.88uinr,0.19ucad,0.14uchf,0.19uaud,0.2usgd,4.62uthb,1.25usek";

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Network {
    Mainnet,
    Testnet,
    Localterra,
}

impl Network {
    pub fn chain_id(&self) -> &'static str {
        match self {
            Network::Mainnet => "columbus-5",
            Network::Testnet => "bombay-12",
            Network::Localterra => "localterra",
        }
    }

    pub fn lcd_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://lcd.terra.dev",
            Network::Testnet => "https://bombay-lcd.terra.dev",
            Network::Localterra => "http://localhost:1317",
        }
    }

    /// FCD endpoint publishing recommended gas prices. Localterra has none.
    pub fn gas_prices_url(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => Some("https://fcd.terra.dev/v1/txs/gas_prices"),
            Network::Testnet => Some("https://bombay-fcd.terra.dev/v1/txs/gas_prices"),
            Network::Localterra => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Localterra => "localterra",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "localterra" => Ok(Network::Localterra),
            other => Err(OpsError::Config(format!(
                "invalid network! must be {{mainnet|testnet|localterra}}, but network was {other}"
            ))),
        }
    }
}

/// A gas price such as `0.15uusd`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasPrice {
    pub amount: Decimal,
    pub denom: String,
}

impl FromStr for GasPrice {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| OpsError::Config(format!("gas price {s:?} has no denom")))?;
        let (amount, denom) = s.split_at(split);
        let amount = Decimal::from_str(amount)
            .map_err(|e| OpsError::Config(format!("gas price {s:?}: {e}")))?;
        Ok(GasPrice {
            amount,
            denom: denom.to_string(),
        })
    }
}

impl fmt::Display for GasPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Default minimum gas price of a localterra node for `denom`.
pub fn localterra_gas_price(denom: &str) -> Result<GasPrice, OpsError> {
    LOCALTERRA_GAS_PRICES
        .split(',')
        .map(GasPrice::from_str)
        .filter_map(Result::ok)
        .find(|price| price.denom == denom)
        .ok_or_else(|| OpsError::Config(format!("Invalid denom: {denom}")))
}
