use serde::{Deserialize, Serialize};

use crate::assets::{AccountId, Amount};
use crate::factory::FarmHandle;
use crate::farm::FarmConfig;

/// Record appended to a farm's log for every committed mutation.
///
/// Events are data, not a wire protocol; the JSON shape is stable so
/// downstream consumers can index it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FarmEvent {
    Deposited {
        staker: AccountId,
        amount: Amount,
        new_balance: Amount,
    },
    Withdrawn {
        staker: AccountId,
        amount: Amount,
    },
    RewardsDistributed {
        cycle_amount: Amount,
        staker_count: u64,
    },
    RewardsClaimed {
        staker: AccountId,
        payout: Amount,
        fee: Amount,
    },
    FeesSwept {
        operator: AccountId,
        amount: Amount,
    },
    FarmCreated {
        handle: FarmHandle,
        creator: AccountId,
        config: FarmConfig,
    },
}
