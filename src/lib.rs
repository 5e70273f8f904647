//! In-memory staking and reward-distribution ledger.
//!
//! The crate models reward farms: accounts stake one asset into a farm,
//! an operator periodically distributes reward cycles pro rata over the
//! staked balances, and stakers claim their accrued rewards net of a
//! basis-point fee. A factory stamps out isolated farm instances from a
//! single template and keeps an auditable registry of every creation.
//!
//! The building blocks:
//!
//! * [`assets`] — account/asset vocabulary and the [`assets::AssetLedger`]
//!   seam through which farms move funds.
//! * [`farm`] — the staking engine: one [`farm::FarmInstance`] per farm,
//!   with deposits, withdrawals, reward cycles, claims, and fee sweeps.
//! * [`fees`] — basis-point fee arithmetic shared by claims and config
//!   validation.
//! * [`policy`] — pluggable reward-cycle amount selection.
//! * [`factory`] — the template/arena factory and its creation registry.
//! * [`events`] — the serde-tagged record vocabulary every mutation appends.
//!
//! Every state-changing operation validates and computes first, then
//! commits; an error return means nothing changed. The crate performs no
//! IO and holds no locks, so a hosting environment can serialize calls
//! per farm however it likes.

pub mod assets;
pub mod events;
pub mod factory;
pub mod farm;
pub mod fees;
pub mod policy;

mod error;

pub use error::FarmError;
