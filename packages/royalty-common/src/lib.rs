pub mod batch;
pub mod custody;
pub mod error;
pub mod payout;
pub mod snapshot;
pub mod types;

pub use batch::{chunk_recipients, DEFAULT_CHUNK_SIZE};
pub use custody::{classify, CustodyPartition, KnownAddresses};
pub use error::PipelineError;
pub use payout::{compute_payouts, PayoutPlan};
pub use snapshot::OwnershipRecord;
pub use types::{CustodyClass, Recipient, TokenId};
