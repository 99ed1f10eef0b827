//! The secure computation backend the ledger delegates all secret
//! arithmetic to.
//!
//! A backend turns persisted ciphertexts into opaque handles (onboarding),
//! computes on handles, and turns handles back into ciphertexts
//! (offboarding). The ledger never sees a plaintext except through
//! [`SecureComputation::decrypt`] and [`SecureComputation::decrypt_bool`],
//! which it only calls for values that are public by construction.

use crate::{
    errors::BackendError, input::CallContext, AccountId, Balance, Ciphertext, DualCiphertext,
    InputText,
};

pub mod simulated;

/// Results of a conditional transfer between two balances.
#[derive(Clone, Debug)]
pub struct TransferOutcome<H> {
    pub new_from: H,
    pub new_to: H,
    /// Encrypted boolean, set when the transfer was applied.
    pub success: H,
}

/// Results of a conditional transfer gated by an allowance.
#[derive(Clone, Debug)]
pub struct AllowanceTransferOutcome<H> {
    pub new_from: H,
    pub new_to: H,
    pub success: H,
    pub new_allowance: H,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Operations consumed from a secure computation engine.
///
/// Every call either returns a result or fails; there are no partial
/// effects visible to the caller. Implementations must guarantee that
/// offboarding then onboarding a handle yields an equal handle, and that the
/// conditional transfers preserve the sum of the two balances.
pub trait SecureComputation {
    /// An opaque secret value living inside the backend.
    type Handle: Clone;

    /// Wrap a public value as a secret handle.
    fn set_public(&mut self, value: Balance) -> BackendResult<Self::Handle>;

    /// Load a ledger ciphertext into the computation.
    fn onboard(&mut self, ciphertext: &Ciphertext) -> BackendResult<Self::Handle>;

    /// Encrypt a handle under the ledger-wide key.
    fn offboard(&mut self, handle: &Self::Handle) -> BackendResult<Ciphertext>;

    /// Encrypt a handle for `recipient` only.
    fn offboard_to_user(
        &mut self,
        handle: &Self::Handle,
        recipient: &AccountId,
    ) -> BackendResult<Ciphertext>;

    /// Encrypt a handle both under the ledger-wide key and for `recipient`.
    fn offboard_combined(
        &mut self,
        handle: &Self::Handle,
        recipient: &AccountId,
    ) -> BackendResult<DualCiphertext> {
        Ok(DualCiphertext {
            system: self.offboard(handle)?,
            user: self.offboard_to_user(handle, recipient)?,
        })
    }

    /// Wrapping 64-bit addition.
    fn add(&mut self, a: &Self::Handle, b: &Self::Handle) -> BackendResult<Self::Handle>;

    /// Wrapping 64-bit subtraction.
    fn sub(&mut self, a: &Self::Handle, b: &Self::Handle) -> BackendResult<Self::Handle>;

    /// Encrypted boolean `a >= b`.
    fn ge(&mut self, a: &Self::Handle, b: &Self::Handle) -> BackendResult<Self::Handle>;

    /// Encrypted boolean conjunction.
    fn and(&mut self, a: &Self::Handle, b: &Self::Handle) -> BackendResult<Self::Handle>;

    /// `if_true` when `condition` is set, `if_false` otherwise.
    ///
    /// Must not branch on the value of `condition`.
    fn select(
        &mut self,
        condition: &Self::Handle,
        if_true: &Self::Handle,
        if_false: &Self::Handle,
    ) -> BackendResult<Self::Handle>;

    fn decrypt(&mut self, handle: &Self::Handle) -> BackendResult<Balance>;

    fn decrypt_bool(&mut self, handle: &Self::Handle) -> BackendResult<bool> {
        Ok(self.decrypt(handle)? != 0)
    }

    /// Check that `input` was signed for `context` and load its ciphertext.
    ///
    /// Fails with [`BackendError::InvalidSignature`] on a bad signature.
    fn validate_ciphertext(
        &mut self,
        input: &InputText,
        context: &CallContext,
    ) -> BackendResult<Self::Handle>;

    /// Move `amount` from `from` to `to` if `from` holds enough.
    ///
    /// The same operations run whether or not the balance suffices; the
    /// outcome is selected inside the secret domain.
    fn conditional_transfer(
        &mut self,
        from: &Self::Handle,
        to: &Self::Handle,
        amount: &Self::Handle,
    ) -> BackendResult<TransferOutcome<Self::Handle>> {
        let success = self.ge(from, amount)?;
        let debited = self.sub(from, amount)?;
        let credited = self.add(to, amount)?;

        Ok(TransferOutcome {
            new_from: self.select(&success, &debited, from)?,
            new_to: self.select(&success, &credited, to)?,
            success,
        })
    }

    /// Like [`Self::conditional_transfer`], additionally requiring and
    /// consuming `allowance`.
    fn conditional_transfer_with_allowance(
        &mut self,
        from: &Self::Handle,
        to: &Self::Handle,
        amount: &Self::Handle,
        allowance: &Self::Handle,
    ) -> BackendResult<AllowanceTransferOutcome<Self::Handle>> {
        let enough_funds = self.ge(from, amount)?;
        let enough_allowance = self.ge(allowance, amount)?;
        let success = self.and(&enough_funds, &enough_allowance)?;

        let debited = self.sub(from, amount)?;
        let credited = self.add(to, amount)?;
        let reduced = self.sub(allowance, amount)?;

        Ok(AllowanceTransferOutcome {
            new_from: self.select(&success, &debited, from)?,
            new_to: self.select(&success, &credited, to)?,
            new_allowance: self.select(&success, &reduced, allowance)?,
            success,
        })
    }
}
