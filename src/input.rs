//! Externally supplied encrypted inputs and their verification.

use crate::{
    backend::SecureComputation,
    cipher::{self, Domain},
    errors::{BackendError, Error, Result},
    keys::{AccountKeys, Signature},
    AccountId, Balance, Ciphertext,
};

use codec::{Decode, Encode};
use rand_core::{CryptoRng, RngCore};
use scale_info::TypeInfo;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// A four byte entry point identifier.
#[derive(Copy, Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Selector(pub [u8; 4]);

impl Selector {
    /// The first four bytes of the Keccak-256 hash of `signature`.
    pub fn from_signature(signature: &str) -> Self {
        let digest = Keccak256::digest(signature.as_bytes());
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&digest[..4]);
        Self(selector)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

/// The entry points that accept input texts.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EntryPoint {
    Transfer,
    TransferFrom,
    Approve,
}

impl EntryPoint {
    /// Canonical signature the selector is derived from.
    pub fn signature(self) -> &'static str {
        match self {
            EntryPoint::Transfer => "transfer(address,(uint256,bytes),bool)",
            EntryPoint::TransferFrom => "transferFrom(address,address,(uint256,bytes),bool)",
            EntryPoint::Approve => "approve(address,(uint256,bytes))",
        }
    }

    pub fn selector(self) -> Selector {
        Selector::from_signature(self.signature())
    }
}

/// Everything an input text signature is bound to.
#[derive(Copy, Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CallContext {
    /// The ledger instance receiving the call.
    pub ledger: AccountId,
    /// The entry point receiving the call.
    pub selector: Selector,
    /// The submitting account.
    pub caller: AccountId,
}

impl CallContext {
    pub fn new(ledger: AccountId, entry_point: EntryPoint, caller: AccountId) -> Self {
        Self {
            ledger,
            selector: entry_point.selector(),
            caller,
        }
    }
}

/// An encrypted value submitted by a client together with its signature.
#[derive(Copy, Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InputText {
    pub ciphertext: Ciphertext,
    pub signature: Signature,
}

impl InputText {
    pub fn new(ciphertext: Ciphertext, signature: Signature) -> Self {
        Self {
            ciphertext,
            signature,
        }
    }

    /// Encrypt `amount` to the backend's network key and sign it for `context`.
    ///
    /// Both the ciphertext and the signature are bound to `context`.
    ///
    /// This is the client side of [`crate::SimulatedBackend::validate_ciphertext`].
    pub fn encrypt<R: RngCore + CryptoRng>(
        keys: &AccountKeys,
        network_key: &AccountId,
        context: &CallContext,
        amount: Balance,
        rng: &mut R,
    ) -> Result<Self> {
        let ciphertext = cipher::seal(Domain::Input(*context), network_key, amount, rng)?;
        let signature = keys.sign_input(&ciphertext, context, rng);
        Ok(Self::new(ciphertext, signature))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.encode()
    }

    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self> {
        Ok(Self::decode(&mut bytes)?)
    }
}

/// Turn `input` into a trusted secret handle for `context`.
///
/// A signature failure is reported as [`Error::SignatureVerificationFailed`];
/// every other backend failure is propagated as is.
pub fn verify<B: SecureComputation>(
    backend: &mut B,
    input: &InputText,
    context: &CallContext,
) -> Result<B::Handle> {
    backend
        .validate_ciphertext(input, context)
        .map_err(|err| match err {
            BackendError::InvalidSignature => {
                log::warn!(
                    "Rejected input text from {:?} for selector {:?}",
                    context.caller,
                    context.selector
                );
                Error::SignatureVerificationFailed
            }
            err => err.into(),
        })
}
