use std::path::PathBuf;

use cosmwasm_std::StdError;
use royalty_common::{PipelineError, TokenId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpsError {
    #[error("network error while {context}: {source}")]
    Network {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("malformed response from {origin}: {reason}")]
    MalformedResponse { origin: String, reason: String },

    #[error("batch {start}..={end} failed after {attempts} attempts: {source}")]
    Fetch {
        start: TokenId,
        end: TokenId,
        attempts: u32,
        #[source]
        source: Box<OpsError>,
    },

    #[error("listings page at offset {offset} failed after {attempts} attempts: {source}")]
    ListingsPage {
        offset: usize,
        attempts: u32,
        #[source]
        source: Box<OpsError>,
    },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("transaction failed!\ncode: {code}\ncodespace: {codespace}\nraw_log: {raw_log}")]
    Ledger {
        code: u32,
        codespace: String,
        raw_log: String,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    FileFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Std(#[from] StdError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl OpsError {
    pub fn malformed(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        OpsError::MalformedResponse {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same request could succeed. Schema mismatches
    /// and consistency failures never recover on their own.
    pub fn is_transient(&self) -> bool {
        matches!(self, OpsError::Network { .. } | OpsError::HttpStatus { .. })
    }
}
