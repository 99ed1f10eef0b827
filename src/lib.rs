//! confidential_token implements an ERC20-style token whose balances and
//! allowances never leave the encrypted domain.
//!
//! Balances are stored as dual ciphertexts: one encrypted under the
//! ledger-wide key of the secure computation backend, usable as input to
//! further computation, and one re-encrypted for the owning account. All
//! arithmetic happens on opaque secret handles inside a
//! [`SecureComputation`] backend, and a transfer with insufficient funds is
//! a data-domain outcome rather than an error.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use codec::{Decode, Encode, MaxEncodedLen};
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    traits::IsIdentity,
};
use scale_info::TypeInfo;

#[macro_use]
pub(crate) mod macros;

pub mod errors;

pub mod backend;
pub mod cipher;
pub mod codec_wrapper;
pub mod input;
pub mod keys;
pub mod mint;
pub mod store;
pub mod token;
pub mod transcript;
pub mod transfer;

pub mod testing;

pub use backend::{simulated::SimulatedBackend, SecureComputation};
pub use cipher::{Ciphertext, DualCiphertext};
pub use errors::{BackendError, Error, Result};
pub use input::{CallContext, EntryPoint, InputText, Selector};
pub use keys::{AccountKeys, SecretKey, Signature};
pub use token::{ConfidentialToken, Event, TokenConfig};
pub use transfer::TransferReceipt;

/// The plaintext domain of balances, allowances and transfer amounts.
pub type Balance = u64;

/// An account identity.
///
/// The identity is the account's compressed Ristretto public key, which both
/// authenticates its input texts and receives its re-encrypted balances.
#[derive(
    Copy,
    Clone,
    Default,
    Encode,
    Decode,
    MaxEncodedLen,
    TypeInfo,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Debug,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn from_point(point: &RistrettoPoint) -> Self {
        Self(point.compress().to_bytes())
    }

    /// Decompress the identity into a curve point.
    ///
    /// Returns `None` for identities that are not usable public keys: invalid
    /// encodings and the identity point (the all-zero mint source).
    pub fn to_point(&self) -> Option<RistrettoPoint> {
        CompressedRistretto(self.0)
            .decompress()
            .filter(|point| !point.is_identity())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}
