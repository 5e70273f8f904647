use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assets::{AccountId, Amount, AssetId, AssetLedger};
use crate::error::FarmError;
use crate::events::FarmEvent;
use crate::fees::{split_claim, BPS_DENOMINATOR};
use crate::policy::RewardPolicy;

/// Per-account staking record. Records are created on first deposit and
/// never removed; a full withdrawal only zeroes the balance so accrued
/// rewards stay claimable.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Staker {
    pub balance: Amount,
    pub pending_rewards: Amount,
    pub is_staking: bool,
}

/// Read-only snapshot of one staker, zeroed for accounts the farm has
/// never seen.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StakerInfo {
    pub balance: Amount,
    pub is_staking: bool,
    pub pending_rewards: Amount,
}

/// Immutable farm parameters fixed at creation.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FarmConfig {
    pub stake_asset: AssetId,
    pub reward_asset: AssetId,
    pub initial_reward: Amount,
    pub min_reward: Amount,
    pub max_reward: Amount,
    pub fee_basis_points: u16,
}

impl FarmConfig {
    /// Reject reward bands that are not ordered and fee rates that would
    /// consume an entire claim.
    pub fn validate(&self) -> Result<(), FarmError> {
        if self.min_reward > self.initial_reward {
            return Err(FarmError::InvalidConfig {
                reason: format!(
                    "min_reward {} exceeds initial_reward {}",
                    self.min_reward, self.initial_reward
                ),
            });
        }
        if self.initial_reward > self.max_reward {
            return Err(FarmError::InvalidConfig {
                reason: format!(
                    "initial_reward {} exceeds max_reward {}",
                    self.initial_reward, self.max_reward
                ),
            });
        }
        if self.fee_basis_points as u64 >= BPS_DENOMINATOR {
            return Err(FarmError::InvalidConfig {
                reason: format!(
                    "fee_basis_points {} must be below {}",
                    self.fee_basis_points, BPS_DENOMINATOR
                ),
            });
        }
        Ok(())
    }
}

/// Lifecycle of a farm instance. `Active` is terminal; there is no
/// decommissioned state and no way back to `Uninitialized`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InstanceState {
    #[default]
    Uninitialized,
    Active {
        config: FarmConfig,
        operator: AccountId,
        farm_account: AccountId,
    },
}

/// One staking farm: balances, pending rewards, accumulated fees, and
/// the event log of every committed mutation.
///
/// All fields stay private so `total_staked` always equals the sum of
/// staker balances. Operations validate and compute first and commit
/// last; any error return means no observable change, on the farm or on
/// the asset ledger.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FarmInstance {
    state: InstanceState,
    stakers: BTreeMap<AccountId, Staker>,
    total_staked: Amount,
    accumulated_fee: Amount,
    events: Vec<FarmEvent>,
}

impl FarmInstance {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-shot activation. The config is validated here as well, so an
    /// instance can never become active with a bad one, and a second call
    /// fails regardless of the arguments.
    pub fn initialize(
        &mut self,
        config: FarmConfig,
        operator: AccountId,
        farm_account: AccountId,
    ) -> Result<(), FarmError> {
        if !matches!(self.state, InstanceState::Uninitialized) {
            return Err(FarmError::AlreadyInitialized);
        }
        config.validate()?;
        self.state = InstanceState::Active {
            config,
            operator,
            farm_account,
        };
        Ok(())
    }

    fn active(&self) -> Result<(&FarmConfig, &AccountId, &AccountId), FarmError> {
        match &self.state {
            InstanceState::Active {
                config,
                operator,
                farm_account,
            } => Ok((config, operator, farm_account)),
            InstanceState::Uninitialized => Err(FarmError::InstanceNotActive),
        }
    }

    /// Stake `amount` units of the farm's stake asset. The funds move
    /// from the staker to the farm account before the balances commit.
    pub fn deposit(
        &mut self,
        ledger: &mut dyn AssetLedger,
        staker: &AccountId,
        amount: Amount,
    ) -> Result<(), FarmError> {
        let (config, _, farm_account) = self.active()?;
        if amount == 0 {
            return Err(FarmError::InvalidAmount);
        }
        let stake_asset = config.stake_asset.clone();
        let farm_account = farm_account.clone();

        let current = self
            .stakers
            .get(staker)
            .map(|s| s.balance)
            .unwrap_or(0);
        let new_balance = current
            .checked_add(amount)
            .ok_or(FarmError::ArithmeticOverflow)?;
        let new_total = self
            .total_staked
            .checked_add(amount)
            .ok_or(FarmError::ArithmeticOverflow)?;

        ledger.transfer_from(&stake_asset, staker, &farm_account, amount)?;

        let record = self.stakers.entry(staker.clone()).or_default();
        record.balance = new_balance;
        record.is_staking = true;
        self.total_staked = new_total;
        self.events.push(FarmEvent::Deposited {
            staker: staker.clone(),
            amount,
            new_balance,
        });
        Ok(())
    }

    /// Return the staker's entire staked balance. Pending rewards are
    /// untouched and stay claimable afterwards.
    pub fn withdraw(
        &mut self,
        ledger: &mut dyn AssetLedger,
        staker: &AccountId,
    ) -> Result<Amount, FarmError> {
        let (config, _, farm_account) = self.active()?;
        let stake_asset = config.stake_asset.clone();
        let farm_account = farm_account.clone();

        let amount = self
            .stakers
            .get(staker)
            .map(|s| s.balance)
            .unwrap_or(0);
        if amount == 0 {
            return Err(FarmError::NothingToWithdraw);
        }
        let new_total = self
            .total_staked
            .checked_sub(amount)
            .ok_or(FarmError::ArithmeticOverflow)?;

        ledger.transfer(&stake_asset, &farm_account, staker, amount)?;

        if let Some(record) = self.stakers.get_mut(staker) {
            record.balance = 0;
            record.is_staking = false;
        }
        self.total_staked = new_total;
        self.events.push(FarmEvent::Withdrawn {
            staker: staker.clone(),
            amount,
        });
        Ok(amount)
    }

    /// Run one reward cycle over every active staker. Operator only.
    ///
    /// The cycle amount comes from the injected policy, clamped into the
    /// configured band. Each staker's share is the floor of their
    /// proportional cut; the sub-unit dust is simply never promised. All
    /// shares are computed before any is credited, so an overflow aborts
    /// the whole cycle. With nothing staked the cycle is a quiet no-op.
    pub fn distribute_rewards_all(
        &mut self,
        caller: &AccountId,
        policy: &mut dyn RewardPolicy,
    ) -> Result<Amount, FarmError> {
        let (config, operator, _) = self.active()?;
        if caller != operator {
            return Err(FarmError::Unauthorized {
                caller: caller.clone(),
            });
        }
        if self.total_staked == 0 {
            return Ok(0);
        }
        let cycle_amount = policy
            .next_cycle_amount(config)
            .clamp(config.min_reward, config.max_reward);

        let mut credits: Vec<(AccountId, Amount)> = Vec::new();
        let mut staker_count = 0u64;
        for (account, staker) in &self.stakers {
            if staker.balance == 0 {
                continue;
            }
            staker_count += 1;
            let share = proportional_share(cycle_amount, staker.balance, self.total_staked);
            if share == 0 {
                continue;
            }
            let new_pending = staker
                .pending_rewards
                .checked_add(share)
                .ok_or(FarmError::ArithmeticOverflow)?;
            credits.push((account.clone(), new_pending));
        }

        for (account, new_pending) in credits {
            if let Some(staker) = self.stakers.get_mut(&account) {
                staker.pending_rewards = new_pending;
            }
        }
        self.events.push(FarmEvent::RewardsDistributed {
            cycle_amount,
            staker_count,
        });
        Ok(cycle_amount)
    }

    /// Pay out the staker's pending rewards net of the claim fee. The
    /// fee portion stays in the farm account and accrues to the operator
    /// until swept.
    pub fn claim_rewards(
        &mut self,
        ledger: &mut dyn AssetLedger,
        staker: &AccountId,
    ) -> Result<(Amount, Amount), FarmError> {
        let (config, _, farm_account) = self.active()?;
        let reward_asset = config.reward_asset.clone();
        let fee_basis_points = config.fee_basis_points;
        let farm_account = farm_account.clone();

        let pending = self
            .stakers
            .get(staker)
            .map(|s| s.pending_rewards)
            .unwrap_or(0);
        if pending == 0 {
            return Err(FarmError::NothingToClaim);
        }
        let (payout, fee) = split_claim(pending, fee_basis_points);
        let new_fee_total = self
            .accumulated_fee
            .checked_add(fee)
            .ok_or(FarmError::ArithmeticOverflow)?;

        ledger.transfer(&reward_asset, &farm_account, staker, payout)?;

        if let Some(record) = self.stakers.get_mut(staker) {
            record.pending_rewards = 0;
        }
        self.accumulated_fee = new_fee_total;
        self.events.push(FarmEvent::RewardsClaimed {
            staker: staker.clone(),
            payout,
            fee,
        });
        Ok((payout, fee))
    }

    /// Transfer the accumulated claim fees to the operator. Operator
    /// only. Sweeping with nothing accumulated succeeds as a no-op so
    /// scheduled sweeps never fail spuriously.
    pub fn sweep_fees(
        &mut self,
        ledger: &mut dyn AssetLedger,
        caller: &AccountId,
    ) -> Result<Amount, FarmError> {
        let (config, operator, farm_account) = self.active()?;
        if caller != operator {
            return Err(FarmError::Unauthorized {
                caller: caller.clone(),
            });
        }
        let amount = self.accumulated_fee;
        if amount == 0 {
            return Ok(0);
        }
        let reward_asset = config.reward_asset.clone();
        let operator = operator.clone();
        let farm_account = farm_account.clone();

        ledger.transfer(&reward_asset, &farm_account, &operator, amount)?;

        self.accumulated_fee = 0;
        self.events.push(FarmEvent::FeesSwept { operator, amount });
        Ok(amount)
    }

    pub fn pending_rewards_view(&self, account: &AccountId) -> Amount {
        self.stakers
            .get(account)
            .map(|s| s.pending_rewards)
            .unwrap_or(0)
    }

    pub fn stakers_info(&self, account: &AccountId) -> StakerInfo {
        let staker = self.stakers.get(account).cloned().unwrap_or_default();
        StakerInfo {
            balance: staker.balance,
            is_staking: staker.is_staking,
            pending_rewards: staker.pending_rewards,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, InstanceState::Active { .. })
    }

    pub fn config(&self) -> Option<&FarmConfig> {
        match &self.state {
            InstanceState::Active { config, .. } => Some(config),
            InstanceState::Uninitialized => None,
        }
    }

    pub fn operator(&self) -> Option<&AccountId> {
        match &self.state {
            InstanceState::Active { operator, .. } => Some(operator),
            InstanceState::Uninitialized => None,
        }
    }

    pub fn farm_account(&self) -> Option<&AccountId> {
        match &self.state {
            InstanceState::Active { farm_account, .. } => Some(farm_account),
            InstanceState::Uninitialized => None,
        }
    }

    pub fn total_staked(&self) -> Amount {
        self.total_staked
    }

    pub fn accumulated_fee(&self) -> Amount {
        self.accumulated_fee
    }

    pub fn events(&self) -> &[FarmEvent] {
        &self.events
    }
}

fn proportional_share(cycle_amount: Amount, balance: Amount, total_staked: Amount) -> Amount {
    // balance <= total_staked, so the quotient is bounded by cycle_amount
    // and the cast back cannot truncate.
    (cycle_amount as u128 * balance as u128 / total_staked as u128) as Amount
}
