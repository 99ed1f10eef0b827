//! Persisted encrypted ledger state.
//!
//! Records are never written directly from a handle: a store first *stages*
//! a write (which performs every backend call the write needs) and only
//! *commits* staged writes once the whole operation has succeeded. This keeps
//! a failing backend call from leaving half of a transfer persisted.

use crate::{backend::SecureComputation, errors::Result, AccountId, DualCiphertext, Event};

use std::collections::BTreeMap;

pub mod allowance;
pub mod balance;

pub use allowance::{AllowanceRecord, AllowanceStore, StagedAllowance};
pub use balance::{BalanceStore, StagedBalance};

/// Load the value of `record`, materializing an encrypted zero for the
/// "never initialized" sentinel instead of onboarding it.
pub(crate) fn load_or_zero<B: SecureComputation>(
    backend: &mut B,
    record: &DualCiphertext,
) -> Result<B::Handle> {
    if record.is_unset() {
        return Ok(backend.set_public(0)?);
    }
    Ok(backend.onboard(&record.system)?)
}

/// Everything the ledger persists besides its plaintext metadata.
#[derive(Clone, Debug, Default)]
pub struct LedgerState {
    pub balances: BalanceStore,
    pub allowances: AllowanceStore,
    /// Re-encryption targets that differ from the account identity.
    encryption_keys: BTreeMap<AccountId, AccountId>,
    events: Vec<Event>,
}

impl LedgerState {
    /// The key user ciphertexts for `account` are encrypted to.
    pub fn encryption_key(&self, account: &AccountId) -> AccountId {
        self.encryption_keys
            .get(account)
            .copied()
            .unwrap_or(*account)
    }

    pub fn set_encryption_key(&mut self, account: AccountId, key: AccountId) {
        if key == account {
            self.encryption_keys.remove(&account);
        } else {
            self.encryption_keys.insert(account, key);
        }
    }

    /// Append `event` to the log.
    ///
    /// The log is unbounded: hosts drain it with [`Self::take_events`] once
    /// the events are published.
    pub fn emit(&mut self, event: Event) {
        log::debug!("Event: {:?}", event);
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Drain the log, returning the events emitted since the last drain.
    pub fn take_events(&mut self) -> Vec<Event> {
        core::mem::take(&mut self.events)
    }
}
