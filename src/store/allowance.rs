use super::load_or_zero;
use crate::{
    backend::SecureComputation, errors::Result, AccountId, Ciphertext, DualCiphertext,
};

use codec::{Decode, Encode, MaxEncodedLen};
use scale_info::TypeInfo;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An encrypted allowance.
///
/// `owner` is the dual ciphertext used for computation and disclosed to the
/// owner; `spender` discloses the same value to the spender.
#[derive(
    Copy, Clone, Default, Encode, Decode, MaxEncodedLen, TypeInfo, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AllowanceRecord {
    pub owner: DualCiphertext,
    pub spender: Ciphertext,
}

impl AllowanceRecord {
    pub fn is_unset(&self) -> bool {
        self.owner.is_unset()
    }
}

/// An allowance write whose ciphertexts are computed but not yet persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedAllowance {
    pub owner: AccountId,
    pub spender: AccountId,
    pub record: AllowanceRecord,
}

/// Per-(owner, spender) encrypted allowances.
#[derive(Clone, Debug, Default)]
pub struct AllowanceStore {
    records: BTreeMap<(AccountId, AccountId), AllowanceRecord>,
}

impl AllowanceStore {
    pub fn get(&self, owner: &AccountId, spender: &AccountId) -> AllowanceRecord {
        self.records
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn contains(&self, owner: &AccountId, spender: &AccountId) -> bool {
        self.records.contains_key(&(*owner, *spender))
    }

    /// Load the allowance, materializing an encrypted zero when unset.
    pub fn load<B: SecureComputation>(
        &self,
        backend: &mut B,
        owner: &AccountId,
        spender: &AccountId,
    ) -> Result<B::Handle> {
        load_or_zero(backend, &self.get(owner, spender).owner)
    }

    /// Offboard `handle` as the allowance of `spender` over `owner`'s funds.
    ///
    /// `owner_key` and `spender_key` are the keys each party's copy is
    /// encrypted to.
    pub fn stage<B: SecureComputation>(
        &self,
        backend: &mut B,
        owner: &AccountId,
        spender: &AccountId,
        handle: &B::Handle,
        owner_key: &AccountId,
        spender_key: &AccountId,
    ) -> Result<StagedAllowance> {
        let owner_record = backend.offboard_combined(handle, owner_key)?;
        let spender_ciphertext = backend.offboard_to_user(handle, spender_key)?;
        Ok(StagedAllowance {
            owner: *owner,
            spender: *spender,
            record: AllowanceRecord {
                owner: owner_record,
                spender: spender_ciphertext,
            },
        })
    }

    pub fn commit(&mut self, staged: StagedAllowance) {
        self.records
            .insert((staged.owner, staged.spender), staged.record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
