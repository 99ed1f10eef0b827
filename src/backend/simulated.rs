//! An in-process backend that keeps secret values as plaintext behind an
//! opaque handle type.
//!
//! It stands in for a multiparty engine in tests, benches and local tooling:
//! the network key pair is held by a single party, and ciphertexts are real
//! encryptions (see [`crate::cipher`]) so the ledger's persisted state is
//! exactly what it would be with a distributed engine.

use super::{BackendResult, SecureComputation};
use crate::{
    cipher::{self, Domain},
    errors::BackendError,
    input::CallContext,
    keys::AccountKeys,
    transcript::input_text_transcript,
    AccountId, Balance, Ciphertext, InputText,
};

use rand::{rngs::StdRng, SeedableRng};
use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret value of the simulated backend.
///
/// Booleans are represented as `0` and `1`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SimHandle {
    value: Balance,
}

impl core::fmt::Debug for SimHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SimHandle(..)")
    }
}

impl SimHandle {
    fn new(value: Balance) -> Self {
        Self { value }
    }
}

/// Spreads the low bit of `flag` over all 64 bits.
fn mask(flag: Balance) -> Balance {
    (flag & 1).wrapping_neg()
}

pub struct SimulatedBackend<R = StdRng> {
    network: AccountKeys,
    rng: R,
}

impl SimulatedBackend<StdRng> {
    /// A backend with a deterministic network key and nonce stream.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self::new(StdRng::from_seed(seed))
    }
}

impl<R: RngCore + CryptoRng> SimulatedBackend<R> {
    pub fn new(mut rng: R) -> Self {
        let network = AccountKeys::generate(&mut rng);
        log::debug!("Simulated backend with network key {:?}", network.public);
        Self { network, rng }
    }

    /// The key clients encrypt input texts to.
    pub fn network_key(&self) -> AccountId {
        self.network.public
    }
}

impl<R: RngCore + CryptoRng> SecureComputation for SimulatedBackend<R> {
    type Handle = SimHandle;

    fn set_public(&mut self, value: Balance) -> BackendResult<SimHandle> {
        Ok(SimHandle::new(value))
    }

    fn onboard(&mut self, ciphertext: &Ciphertext) -> BackendResult<SimHandle> {
        log::trace!("onboard");
        cipher::open(Domain::System, &self.network.secret, ciphertext).map(SimHandle::new)
    }

    fn offboard(&mut self, handle: &SimHandle) -> BackendResult<Ciphertext> {
        log::trace!("offboard");
        cipher::seal(
            Domain::System,
            &self.network.public,
            handle.value,
            &mut self.rng,
        )
    }

    fn offboard_to_user(
        &mut self,
        handle: &SimHandle,
        recipient: &AccountId,
    ) -> BackendResult<Ciphertext> {
        log::trace!("offboard to {:?}", recipient);
        cipher::seal(Domain::User, recipient, handle.value, &mut self.rng)
    }

    fn add(&mut self, a: &SimHandle, b: &SimHandle) -> BackendResult<SimHandle> {
        Ok(SimHandle::new(a.value.wrapping_add(b.value)))
    }

    fn sub(&mut self, a: &SimHandle, b: &SimHandle) -> BackendResult<SimHandle> {
        Ok(SimHandle::new(a.value.wrapping_sub(b.value)))
    }

    fn ge(&mut self, a: &SimHandle, b: &SimHandle) -> BackendResult<SimHandle> {
        Ok(SimHandle::new((a.value >= b.value) as Balance))
    }

    fn and(&mut self, a: &SimHandle, b: &SimHandle) -> BackendResult<SimHandle> {
        Ok(SimHandle::new(a.value & b.value & 1))
    }

    fn select(
        &mut self,
        condition: &SimHandle,
        if_true: &SimHandle,
        if_false: &SimHandle,
    ) -> BackendResult<SimHandle> {
        let m = mask(condition.value);
        Ok(SimHandle::new((if_true.value & m) | (if_false.value & !m)))
    }

    fn decrypt(&mut self, handle: &SimHandle) -> BackendResult<Balance> {
        Ok(handle.value)
    }

    fn validate_ciphertext(
        &mut self,
        input: &InputText,
        context: &CallContext,
    ) -> BackendResult<SimHandle> {
        input
            .signature
            .verify(input_text_transcript(context, &input.ciphertext), &context.caller)?;
        cipher::open(Domain::Input(*context), &self.network.secret, &input.ciphertext)
            .map(SimHandle::new)
    }
}

impl<R> core::fmt::Debug for SimulatedBackend<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulatedBackend")
            .field("network", &self.network.public)
            .finish()
    }
}

impl<R> SimulatedBackend<R> {
    /// Open a ledger ciphertext outside of any computation.
    ///
    /// Only meant for tests and audits of the simulated engine.
    pub fn decrypt_system(&self, ciphertext: &Ciphertext) -> Result<Balance, BackendError> {
        cipher::open(Domain::System, &self.network.secret, ciphertext)
    }
}
