use thiserror::Error;

use crate::assets::{AccountId, AssetError};
use crate::factory::FarmHandle;

/// Canonical error type for farm and factory operations.
///
/// Every operation that returns one of these aborted without touching
/// state: validation and arithmetic run before any commit, and a failed
/// asset movement is surfaced untouched rather than retried.
#[derive(Debug, Error)]
pub enum FarmError {
    /// Deposit of zero units. Negative amounts are unrepresentable.
    #[error("amount must be greater than zero")]
    InvalidAmount,

    /// Withdrawal with no staked balance.
    #[error("nothing to withdraw")]
    NothingToWithdraw,

    /// Claim with no pending rewards.
    #[error("nothing to claim")]
    NothingToClaim,

    /// A privileged operation invoked by anyone but the farm operator.
    #[error("caller {caller} is not the farm operator")]
    Unauthorized { caller: AccountId },

    /// The asset ledger refused a movement.
    #[error("asset transfer failed: {0}")]
    AssetTransfer(#[from] AssetError),

    /// Rejected farm configuration.
    #[error("invalid farm config: {reason}")]
    InvalidConfig { reason: String },

    /// Second initialization of the same instance.
    #[error("farm is already initialized")]
    AlreadyInitialized,

    /// Operation on an instance that was never initialized, the factory
    /// template included.
    #[error("farm is not active")]
    InstanceNotActive,

    /// Balance or reward accounting left the representable range.
    #[error("arithmetic overflow in farm accounting")]
    ArithmeticOverflow,

    /// Lookup with a handle the factory never issued.
    #[error("unknown farm handle {handle}")]
    UnknownFarm { handle: FarmHandle },
}
