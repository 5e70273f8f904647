use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::assets::Amount;
use crate::farm::FarmConfig;

/// Chooses how much reward a distribution cycle hands out.
///
/// Policies are injected by the caller so cycles stay reproducible; the
/// engine clamps whatever a policy returns into the configured
/// `[min_reward, max_reward]` band, so no policy can break a farm's
/// bounds.
pub trait RewardPolicy {
    fn next_cycle_amount(&mut self, config: &FarmConfig) -> Amount;
}

/// Always pays the configured initial reward.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedReward;

impl RewardPolicy for FixedReward {
    fn next_cycle_amount(&mut self, config: &FarmConfig) -> Amount {
        config.initial_reward
    }
}

/// Draws each cycle amount uniformly from `[min_reward, max_reward]`
/// using a caller-seeded RNG. Identical seeds replay identical cycle
/// sequences.
#[derive(Clone, Debug)]
pub struct SeededReward {
    rng: StdRng,
}

impl SeededReward {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RewardPolicy for SeededReward {
    fn next_cycle_amount(&mut self, config: &FarmConfig) -> Amount {
        self.rng.gen_range(config.min_reward..=config.max_reward)
    }
}
