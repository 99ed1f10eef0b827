//! Ciphertext types persisted by the ledger, and the hashed-ElGamal
//! encryption used by the simulated backend and its clients.
//!
//! Encryption of a value `v` to a public key `P`:
//! ephemeral := r * g
//! shared    := r * P
//! key       := H(domain, ephemeral, shared, P)
//! body      := v XOR H(key, "pad")
//! tag       := H(key, "tag", body)
//!
//! Decryption recomputes `shared := secret * ephemeral`, checks the tag
//! and unmasks the body. The domain label keeps ciphertexts made for one use
//! (ledger state, user disclosure, submitted input) from being accepted for
//! another. Input ciphertexts also bind the call context they were made for,
//! so a ciphertext lifted from another submission does not open.

use crate::{errors::BackendError, input::CallContext, keys::SecretKey, AccountId, Balance};

use byteorder::{ByteOrder, LittleEndian};
use codec::{Decode, Encode, MaxEncodedLen};
use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT,
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use rand_core::{CryptoRng, RngCore};
use scale_info::TypeInfo;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

pub const CIPHERTEXT_BODY_SIZE: usize = 8;
pub const CIPHERTEXT_TAG_SIZE: usize = 16;

/// An encrypted 64-bit value.
///
/// The all-zero ciphertext is the sentinel for a record that was never
/// written; it never decrypts under any key.
#[derive(
    Copy, Clone, Default, Encode, Decode, MaxEncodedLen, TypeInfo, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ciphertext {
    pub ephemeral: [u8; 32],
    pub body: [u8; CIPHERTEXT_BODY_SIZE],
    pub tag: [u8; CIPHERTEXT_TAG_SIZE],
}

impl Ciphertext {
    /// The "never initialized" sentinel.
    pub fn zero() -> Self {
        Default::default()
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

/// A value encrypted twice: once for the ledger (`system`) and once for the
/// account allowed to read it (`user`).
#[derive(
    Copy, Clone, Default, Encode, Decode, MaxEncodedLen, TypeInfo, PartialEq, Eq, Debug,
)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DualCiphertext {
    pub system: Ciphertext,
    pub user: Ciphertext,
}

impl DualCiphertext {
    /// The record returned for accounts that were never written.
    pub fn unset() -> Self {
        Default::default()
    }

    /// A zero system ciphertext marks the record as never initialized.
    ///
    /// Note that an encrypted zero balance is NOT unset: it is a regular
    /// ciphertext that happens to decrypt to zero.
    pub fn is_unset(&self) -> bool {
        self.system.is_zero()
    }
}

/// What a ciphertext may be used for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Domain {
    /// Ledger state, readable only by the backend.
    System,
    /// Re-encryption for an account.
    User,
    /// A value submitted by a client for one call.
    Input(CallContext),
}

impl Domain {
    fn label(&self) -> &'static [u8] {
        match self {
            Domain::System => b"ConfidentialTokenSystemCiphertext",
            Domain::User => b"ConfidentialTokenUserCiphertext",
            Domain::Input(_) => b"ConfidentialTokenInputCiphertext",
        }
    }

    fn binding(&self) -> Vec<u8> {
        match self {
            Domain::Input(context) => context.encode(),
            _ => Vec::new(),
        }
    }
}

struct CipherKey([u8; 32]);

impl CipherKey {
    fn derive(
        domain: Domain,
        ephemeral: &CompressedRistretto,
        shared: &RistrettoPoint,
        recipient: &AccountId,
    ) -> Self {
        let digest = Sha3_256::new()
            .chain(domain.label())
            .chain(domain.binding())
            .chain(ephemeral.as_bytes())
            .chain(shared.compress().as_bytes())
            .chain(recipient.as_bytes())
            .finalize();
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self(key)
    }

    fn pad(&self) -> [u8; CIPHERTEXT_BODY_SIZE] {
        let digest = Sha3_256::new().chain(self.0).chain(b"pad").finalize();
        let mut pad = [0u8; CIPHERTEXT_BODY_SIZE];
        pad.copy_from_slice(&digest[..CIPHERTEXT_BODY_SIZE]);
        pad
    }

    fn tag(&self, body: &[u8; CIPHERTEXT_BODY_SIZE]) -> [u8; CIPHERTEXT_TAG_SIZE] {
        let digest = Sha3_256::new()
            .chain(self.0)
            .chain(b"tag")
            .chain(body)
            .finalize();
        let mut tag = [0u8; CIPHERTEXT_TAG_SIZE];
        tag.copy_from_slice(&digest[..CIPHERTEXT_TAG_SIZE]);
        tag
    }
}

fn xor_body(
    mut body: [u8; CIPHERTEXT_BODY_SIZE],
    pad: &[u8; CIPHERTEXT_BODY_SIZE],
) -> [u8; CIPHERTEXT_BODY_SIZE] {
    body.iter_mut().zip(pad.iter()).for_each(|(b, p)| *b ^= p);
    body
}

/// Encrypts `value` to `recipient` for use in `domain`.
pub fn seal<R: RngCore + CryptoRng>(
    domain: Domain,
    recipient: &AccountId,
    value: Balance,
    rng: &mut R,
) -> Result<Ciphertext, BackendError> {
    let recipient_point = recipient
        .to_point()
        .ok_or(BackendError::InvalidPublicKey(*recipient))?;

    let r = Scalar::random(rng);
    let ephemeral = (r * RISTRETTO_BASEPOINT_POINT).compress();
    let shared = r * recipient_point;
    let key = CipherKey::derive(domain, &ephemeral, &shared, recipient);

    let mut plain = [0u8; CIPHERTEXT_BODY_SIZE];
    LittleEndian::write_u64(&mut plain, value);
    let body = xor_body(plain, &key.pad());
    let tag = key.tag(&body);

    Ok(Ciphertext {
        ephemeral: ephemeral.to_bytes(),
        body,
        tag,
    })
}

/// Decrypts a ciphertext produced by [`seal`] for the owner of `secret`.
pub fn open(
    domain: Domain,
    secret: &SecretKey,
    ciphertext: &Ciphertext,
) -> Result<Balance, BackendError> {
    let ephemeral = CompressedRistretto(ciphertext.ephemeral);
    let ephemeral_point = ephemeral
        .decompress()
        .ok_or(BackendError::MalformedCiphertext)?;

    let scalar = secret.scalar();
    let shared = scalar * ephemeral_point;
    let recipient = AccountId::from_point(&(scalar * RISTRETTO_BASEPOINT_POINT));
    let key = CipherKey::derive(domain, &ephemeral, &shared, &recipient);

    if key.tag(&ciphertext.body) != ciphertext.tag {
        return Err(BackendError::UnrecognizedCiphertext);
    }

    let plain = xor_body(ciphertext.body, &key.pad());
    Ok(LittleEndian::read_u64(&plain))
}
