use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::assets::AccountId;
use crate::error::FarmError;
use crate::events::FarmEvent;
use crate::farm::{FarmConfig, FarmInstance};

/// Opaque identifier the factory hands out for each created farm.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct FarmHandle(u64);

impl FarmHandle {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for FarmHandle {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for FarmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a creator gets back from [`FarmFactory::create_farm`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreationReceipt {
    pub handle: FarmHandle,
    pub receipt_id: String,
    pub farm_account: AccountId,
}

/// Registry row kept for every creation, in creation order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FarmRecord {
    pub handle: FarmHandle,
    pub creator: AccountId,
    pub config: FarmConfig,
    pub receipt_id: String,
    pub farm_account: AccountId,
}

/// Stamps out isolated farm instances from a never-activated template.
///
/// Each creation clones the template, initializes the clone exactly once
/// with the validated config, and registers it in the arena under a
/// fresh handle. The template itself stays uninitialized forever, so it
/// can never hold stake or pay rewards.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FarmFactory {
    template: FarmInstance,
    farms: BTreeMap<FarmHandle, FarmInstance>,
    records: Vec<FarmRecord>,
    events: Vec<FarmEvent>,
    next_handle: u64,
}

impl FarmFactory {
    pub fn new() -> Self {
        Self {
            template: FarmInstance::new(),
            farms: BTreeMap::new(),
            records: Vec::new(),
            events: Vec::new(),
            next_handle: 1,
        }
    }

    /// Validate `config`, spin up an isolated instance with the creator
    /// as operator, and return the handle plus an audit receipt. Nothing
    /// is registered when validation fails, and the failed attempt burns
    /// no handle.
    pub fn create_farm(
        &mut self,
        creator: &AccountId,
        config: FarmConfig,
    ) -> Result<CreationReceipt, FarmError> {
        config.validate()?;
        let handle = FarmHandle(self.next_handle);
        let receipt_id = creation_receipt_id(handle, creator, &config);
        let farm_account = format!("farm-{}", &receipt_id[..16]);

        let mut farm = self.template.clone();
        farm.initialize(config.clone(), creator.clone(), farm_account.clone())?;

        self.farms.insert(handle, farm);
        self.records.push(FarmRecord {
            handle,
            creator: creator.clone(),
            config: config.clone(),
            receipt_id: receipt_id.clone(),
            farm_account: farm_account.clone(),
        });
        self.events.push(FarmEvent::FarmCreated {
            handle,
            creator: creator.clone(),
            config,
        });
        self.next_handle += 1;

        Ok(CreationReceipt {
            handle,
            receipt_id,
            farm_account,
        })
    }

    pub fn farm(&self, handle: FarmHandle) -> Result<&FarmInstance, FarmError> {
        self.farms
            .get(&handle)
            .ok_or(FarmError::UnknownFarm { handle })
    }

    pub fn farm_mut(&mut self, handle: FarmHandle) -> Result<&mut FarmInstance, FarmError> {
        self.farms
            .get_mut(&handle)
            .ok_or(FarmError::UnknownFarm { handle })
    }

    pub fn farm_count(&self) -> usize {
        self.farms.len()
    }

    pub fn records(&self) -> &[FarmRecord] {
        &self.records
    }

    pub fn events(&self) -> &[FarmEvent] {
        &self.events
    }

    pub fn template(&self) -> &FarmInstance {
        &self.template
    }
}

impl Default for FarmFactory {
    fn default() -> Self {
        Self::new()
    }
}

fn creation_receipt_id(handle: FarmHandle, creator: &AccountId, config: &FarmConfig) -> String {
    // Deterministic encoding of the creation inputs in strict field order.
    // The handle is part of the digest, so identical configs from the same
    // creator still yield distinct receipts.
    let mut hasher = Sha256::new();
    hasher.update(b"farm-ledger-create-v1");
    hasher.update(handle.0.to_le_bytes());
    hasher.update(creator.as_bytes());
    hasher.update(config.stake_asset.as_bytes());
    hasher.update(config.reward_asset.as_bytes());
    hasher.update(config.initial_reward.to_le_bytes());
    hasher.update(config.min_reward.to_le_bytes());
    hasher.update(config.max_reward.to_le_bytes());
    hasher.update(config.fee_basis_points.to_le_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::assets::InMemoryAssetLedger;
    use crate::policy::FixedReward;

    fn test_config() -> FarmConfig {
        FarmConfig {
            stake_asset: "lp".to_string(),
            reward_asset: "dapp".to_string(),
            initial_reward: 1_000,
            min_reward: 500,
            max_reward: 1_500,
            fee_basis_points: 200,
        }
    }

    #[test]
    fn created_farms_are_isolated_from_each_other() {
        let mut factory = FarmFactory::new();
        let first = factory
            .create_farm(&"carol".to_string(), test_config())
            .expect("create");
        let second = factory
            .create_farm(&"dave".to_string(), test_config())
            .expect("create");
        assert_ne!(first.handle, second.handle);
        assert_eq!(factory.farm_count(), 2);

        let mut ledger = InMemoryAssetLedger::new();
        ledger
            .mint(&"lp".to_string(), &"alice".to_string(), 1_000)
            .expect("mint");
        factory
            .farm_mut(first.handle)
            .expect("farm")
            .deposit(&mut ledger, &"alice".to_string(), 400)
            .expect("deposit");

        assert_eq!(factory.farm(first.handle).expect("farm").total_staked(), 400);
        assert_eq!(factory.farm(second.handle).expect("farm").total_staked(), 0);
        assert!(factory.farm(second.handle).expect("farm").events().is_empty());
    }

    #[test]
    fn invalid_configs_never_reach_the_arena() {
        let mut factory = FarmFactory::new();
        let mut config = test_config();
        config.min_reward = 2_000;
        let err = factory
            .create_farm(&"carol".to_string(), config)
            .unwrap_err();
        assert!(matches!(err, FarmError::InvalidConfig { .. }));
        assert_eq!(factory.farm_count(), 0);
        assert!(factory.records().is_empty());
        assert!(factory.events().is_empty());

        // The failed attempt burned no handle.
        let receipt = factory
            .create_farm(&"carol".to_string(), test_config())
            .expect("create");
        assert_eq!(receipt.handle.value(), 1);
    }

    #[test]
    fn full_fee_rate_is_rejected() {
        let mut factory = FarmFactory::new();
        let mut config = test_config();
        config.fee_basis_points = 10_000;
        let err = factory
            .create_farm(&"carol".to_string(), config)
            .unwrap_err();
        assert!(matches!(err, FarmError::InvalidConfig { .. }));
    }

    #[test]
    fn receipts_are_unique_even_for_identical_requests() {
        let mut factory = FarmFactory::new();
        let first = factory
            .create_farm(&"carol".to_string(), test_config())
            .expect("create");
        let second = factory
            .create_farm(&"carol".to_string(), test_config())
            .expect("create");
        assert_ne!(first.receipt_id, second.receipt_id);
        assert_ne!(first.farm_account, second.farm_account);
        assert_eq!(first.receipt_id.len(), 64);
        assert!(first.farm_account.starts_with("farm-"));
    }

    #[test]
    fn registry_records_creator_config_and_account() {
        let mut factory = FarmFactory::new();
        let receipt = factory
            .create_farm(&"carol".to_string(), test_config())
            .expect("create");
        let record = &factory.records()[0];
        assert_eq!(record.handle, receipt.handle);
        assert_eq!(record.creator, "carol");
        assert_eq!(record.config, test_config());
        assert_eq!(record.receipt_id, receipt.receipt_id);
        assert_eq!(record.farm_account, receipt.farm_account);
        assert_eq!(
            factory.events().last(),
            Some(&FarmEvent::FarmCreated {
                handle: receipt.handle,
                creator: "carol".to_string(),
                config: test_config(),
            })
        );
    }

    #[test]
    fn template_stays_uninitialized_forever() {
        let mut factory = FarmFactory::new();
        factory
            .create_farm(&"carol".to_string(), test_config())
            .expect("create");
        factory
            .create_farm(&"dave".to_string(), test_config())
            .expect("create");
        assert!(!factory.template().is_active());
        assert_eq!(factory.template().total_staked(), 0);
    }

    #[test]
    fn unknown_handles_are_refused() {
        let factory = FarmFactory::new();
        let err = factory.farm(FarmHandle::from(99)).unwrap_err();
        assert!(matches!(
            err,
            FarmError::UnknownFarm { handle } if handle.value() == 99
        ));
    }

    #[test]
    fn creator_operates_the_farm_through_a_full_cycle() {
        let mut factory = FarmFactory::new();
        let receipt = factory
            .create_farm(&"carol".to_string(), test_config())
            .expect("create");

        let mut ledger = InMemoryAssetLedger::new();
        ledger
            .mint(&"lp".to_string(), &"alice".to_string(), 1_000)
            .expect("mint");
        ledger
            .mint(&"dapp".to_string(), &receipt.farm_account, 100_000)
            .expect("mint");

        let farm = factory.farm_mut(receipt.handle).expect("farm");
        assert_eq!(farm.operator(), Some(&"carol".to_string()));
        farm.deposit(&mut ledger, &"alice".to_string(), 500)
            .expect("deposit");
        let mut policy = FixedReward;
        farm.distribute_rewards_all(&"carol".to_string(), &mut policy)
            .expect("distribute");
        assert_eq!(farm.pending_rewards_view(&"alice".to_string()), 1_000);

        let (payout, fee) = farm
            .claim_rewards(&mut ledger, &"alice".to_string())
            .expect("claim");
        assert_eq!((payout, fee), (980, 20));
        assert_eq!(
            ledger.balance(&"dapp".to_string(), &"alice".to_string()),
            980
        );

        let withdrawn = farm
            .withdraw(&mut ledger, &"alice".to_string())
            .expect("withdraw");
        assert_eq!(withdrawn, 500);
        assert_eq!(
            ledger.balance(&"lp".to_string(), &"alice".to_string()),
            1_000
        );
    }
}
