use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use farm_ledger::assets::{AccountId, Amount, AssetId, InMemoryAssetLedger};
use farm_ledger::factory::{FarmFactory, FarmHandle};
use farm_ledger::farm::FarmConfig;
use farm_ledger::policy::{FixedReward, RewardPolicy, SeededReward};

/// Whole driver state: one asset book plus the farm factory, persisted
/// as pretty JSON between invocations.
#[derive(Serialize, Deserialize)]
struct World {
    version: u8,
    ledger: InMemoryAssetLedger,
    factory: FarmFactory,
}

#[derive(Parser)]
#[command(name = "farm-ledger", version, about = "Staking farm ledger over a JSON state file")]
struct Cli {
    /// Path of the world state file.
    #[arg(long, default_value = "world.json")]
    state: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a fresh, empty world file.
    Init,
    /// Mint units of an asset to an account.
    Mint {
        asset: AssetId,
        to: AccountId,
        amount: Amount,
    },
    /// Create a farm and print its creation receipt.
    CreateFarm {
        creator: AccountId,
        stake_asset: AssetId,
        reward_asset: AssetId,
        #[arg(long, default_value_t = 1_000)]
        initial_reward: Amount,
        #[arg(long, default_value_t = 500)]
        min_reward: Amount,
        #[arg(long, default_value_t = 1_500)]
        max_reward: Amount,
        #[arg(long, default_value_t = 200)]
        fee_bps: u16,
    },
    /// Stake into a farm.
    Deposit {
        farm: u64,
        staker: AccountId,
        amount: Amount,
    },
    /// Withdraw the full staked balance.
    Withdraw { farm: u64, staker: AccountId },
    /// Run one reward cycle over all stakers.
    Distribute {
        farm: u64,
        caller: AccountId,
        /// Draw the cycle amount from a seeded RNG instead of paying the
        /// fixed initial reward.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Claim pending rewards net of the claim fee.
    Claim { farm: u64, staker: AccountId },
    /// Transfer accumulated claim fees to the operator.
    SweepFees { farm: u64, caller: AccountId },
    /// Print a farm, or the whole world when no handle is given.
    Show {
        #[arg(long)]
        farm: Option<u64>,
    },
}

fn load_world(path: &Path) -> World {
    let bytes = fs::read(path).expect("read state file");
    serde_json::from_slice(&bytes).expect("state file parse")
}

fn save_world(path: &Path, world: &World) {
    let json = serde_json::to_vec_pretty(world).expect("state encode");
    fs::write(path, json).expect("write state file");
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("error: {err}");
    process::exit(2);
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Command::Init => {
            let world = World {
                version: 1,
                ledger: InMemoryAssetLedger::new(),
                factory: FarmFactory::new(),
            };
            save_world(&cli.state, &world);
            println!("world initialized → {}", cli.state.display());
        }
        Command::Mint { asset, to, amount } => {
            let mut world = load_world(&cli.state);
            if let Err(err) = world.ledger.mint(&asset, &to, amount) {
                fail(err);
            }
            save_world(&cli.state, &world);
            println!("minted {amount} {asset} → {to}");
        }
        Command::CreateFarm {
            creator,
            stake_asset,
            reward_asset,
            initial_reward,
            min_reward,
            max_reward,
            fee_bps,
        } => {
            let mut world = load_world(&cli.state);
            let config = FarmConfig {
                stake_asset,
                reward_asset,
                initial_reward,
                min_reward,
                max_reward,
                fee_basis_points: fee_bps,
            };
            let receipt = world
                .factory
                .create_farm(&creator, config)
                .unwrap_or_else(|err| fail(err));
            save_world(&cli.state, &world);
            let json = serde_json::to_string_pretty(&receipt).expect("receipt encode");
            println!("{json}");
        }
        Command::Deposit {
            farm,
            staker,
            amount,
        } => {
            let mut world = load_world(&cli.state);
            let instance = world
                .factory
                .farm_mut(FarmHandle::from(farm))
                .unwrap_or_else(|err| fail(err));
            if let Err(err) = instance.deposit(&mut world.ledger, &staker, amount) {
                fail(err);
            }
            save_world(&cli.state, &world);
            println!("deposited {amount} → farm {farm} for {staker}");
        }
        Command::Withdraw { farm, staker } => {
            let mut world = load_world(&cli.state);
            let instance = world
                .factory
                .farm_mut(FarmHandle::from(farm))
                .unwrap_or_else(|err| fail(err));
            let withdrawn = instance
                .withdraw(&mut world.ledger, &staker)
                .unwrap_or_else(|err| fail(err));
            save_world(&cli.state, &world);
            println!("withdrew {withdrawn} → {staker}");
        }
        Command::Distribute { farm, caller, seed } => {
            let mut world = load_world(&cli.state);
            let instance = world
                .factory
                .farm_mut(FarmHandle::from(farm))
                .unwrap_or_else(|err| fail(err));
            let mut policy: Box<dyn RewardPolicy> = match seed {
                Some(seed) => Box::new(SeededReward::new(seed)),
                None => Box::new(FixedReward),
            };
            let cycle = instance
                .distribute_rewards_all(&caller, policy.as_mut())
                .unwrap_or_else(|err| fail(err));
            save_world(&cli.state, &world);
            println!("distributed {cycle} over farm {farm}");
        }
        Command::Claim { farm, staker } => {
            let mut world = load_world(&cli.state);
            let instance = world
                .factory
                .farm_mut(FarmHandle::from(farm))
                .unwrap_or_else(|err| fail(err));
            let (payout, fee) = instance
                .claim_rewards(&mut world.ledger, &staker)
                .unwrap_or_else(|err| fail(err));
            save_world(&cli.state, &world);
            println!("claimed {payout} (fee {fee}) → {staker}");
        }
        Command::SweepFees { farm, caller } => {
            let mut world = load_world(&cli.state);
            let instance = world
                .factory
                .farm_mut(FarmHandle::from(farm))
                .unwrap_or_else(|err| fail(err));
            let swept = instance
                .sweep_fees(&mut world.ledger, &caller)
                .unwrap_or_else(|err| fail(err));
            save_world(&cli.state, &world);
            println!("swept {swept} → {caller}");
        }
        Command::Show { farm } => {
            let world = load_world(&cli.state);
            match farm {
                Some(raw) => {
                    let instance = world
                        .factory
                        .farm(FarmHandle::from(raw))
                        .unwrap_or_else(|err| fail(err));
                    let json = serde_json::to_string_pretty(instance).expect("farm encode");
                    println!("{json}");
                }
                None => {
                    let json = serde_json::to_string_pretty(&world).expect("world encode");
                    println!("{json}");
                }
            }
        }
    }
}
