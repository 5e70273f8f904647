use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type AccountId = String;
pub type AssetId = String;
pub type Amount = u64;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("insufficient funds in account {account}")]
    InsufficientFunds { account: AccountId },
    #[error("unknown account {account}")]
    UnknownAccount { account: AccountId },
    #[error("unknown asset {asset}")]
    UnknownAsset { asset: AssetId },
    #[error("balance overflow in account {account}")]
    BalanceOverflow { account: AccountId },
}

/// Custody seam through which farms move funds.
///
/// Every movement names both endpoints explicitly; nothing is inferred
/// from ambient caller context. `transfer_from` pulls funds a holder has
/// put at the farm's disposal, `transfer` pushes funds the farm itself
/// holds. Whether a pull is actually permitted (approvals, allowances)
/// is the implementing ledger's concern.
pub trait AssetLedger {
    fn transfer_from(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), AssetError>;

    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), AssetError>;
}

/// Balance book keyed by asset, then account.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct InMemoryAssetLedger {
    balances: BTreeMap<AssetId, BTreeMap<AccountId, Amount>>,
}

impl InMemoryAssetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conjure new units into an account. Setup helper for drivers and
    /// tests; farms never mint.
    pub fn mint(
        &mut self,
        asset: &AssetId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), AssetError> {
        let balance = self
            .balances
            .entry(asset.clone())
            .or_default()
            .entry(to.clone())
            .or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| AssetError::BalanceOverflow {
                account: to.clone(),
            })?;
        Ok(())
    }

    pub fn balance(&self, asset: &AssetId, account: &AccountId) -> Amount {
        self.balances
            .get(asset)
            .and_then(|book| book.get(account))
            .copied()
            .unwrap_or(0)
    }

    fn move_units(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), AssetError> {
        // Receiver headroom is checked before the debit so a failed
        // movement leaves both balances untouched.
        self.balance(asset, to)
            .checked_add(amount)
            .ok_or_else(|| AssetError::BalanceOverflow {
                account: to.clone(),
            })?;

        let book = self
            .balances
            .get_mut(asset)
            .ok_or_else(|| AssetError::UnknownAsset {
                asset: asset.clone(),
            })?;
        let source = book
            .get_mut(from)
            .ok_or_else(|| AssetError::UnknownAccount {
                account: from.clone(),
            })?;
        if *source < amount {
            return Err(AssetError::InsufficientFunds {
                account: from.clone(),
            });
        }
        *source -= amount;

        let target = book.entry(to.clone()).or_default();
        *target += amount;
        Ok(())
    }
}

// The in-memory book keeps no approval state, so pull and push movements
// coincide.
impl AssetLedger for InMemoryAssetLedger {
    fn transfer_from(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), AssetError> {
        self.move_units(asset, from, to, amount)
    }

    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), AssetError> {
        self.move_units(asset, from, to, amount)
    }
}
