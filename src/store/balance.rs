use super::load_or_zero;
use crate::{
    backend::SecureComputation, errors::Result, AccountId, Ciphertext, DualCiphertext,
};

use std::collections::BTreeMap;

/// A balance write whose ciphertexts are computed but not yet persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedBalance {
    pub account: AccountId,
    pub record: DualCiphertext,
}

/// Per-account dual ciphertext balances.
#[derive(Clone, Debug, Default)]
pub struct BalanceStore {
    records: BTreeMap<AccountId, DualCiphertext>,
}

impl BalanceStore {
    /// The stored record, or the unset sentinel for unknown accounts.
    pub fn get(&self, account: &AccountId) -> DualCiphertext {
        self.records.get(account).copied().unwrap_or_default()
    }

    /// Whether a record was ever written for `account`.
    pub fn contains(&self, account: &AccountId) -> bool {
        self.records.contains_key(account)
    }

    /// The balance ciphertext readable by `caller`, and nobody else.
    pub fn balance_of(&self, caller: &AccountId) -> Ciphertext {
        self.get(caller).user
    }

    pub fn load<B: SecureComputation>(
        &self,
        backend: &mut B,
        account: &AccountId,
    ) -> Result<B::Handle> {
        load_or_zero(backend, &self.get(account))
    }

    /// Offboard `handle` as the new balance of `account`, re-encrypted for
    /// `encryption_key`.
    pub fn stage<B: SecureComputation>(
        &self,
        backend: &mut B,
        account: &AccountId,
        handle: &B::Handle,
        encryption_key: &AccountId,
    ) -> Result<StagedBalance> {
        let record = backend.offboard_combined(handle, encryption_key)?;
        Ok(StagedBalance {
            account: *account,
            record,
        })
    }

    pub fn commit(&mut self, staged: StagedBalance) {
        self.records.insert(staged.account, staged.record);
    }

    /// Number of accounts holding a record.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
