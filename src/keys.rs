//! Account keys and Schnorr signatures over Ristretto.
//!
//! Key pair:
//! secret_key := scalar
//! public_key := secret_key * g
//!
//! Signing a transcript T:
//! k := random scalar, R := k * g
//! c := challenge(T, public_key, R)
//! s := k + c * secret_key
//!
//! Verification checks s * g == R + c * public_key.

use crate::{
    cipher::{self, Domain},
    codec_wrapper::{WrappedCompressedRistretto, WrappedScalar},
    errors::{BackendError, Result},
    input::CallContext,
    transcript::{input_text_transcript, TranscriptProtocol, INPUT_TEXT_CHALLENGE_LABEL},
    AccountId, Balance, Ciphertext,
};

use codec::{Decode, Encode};
use curve25519_dalek::{constants::RISTRETTO_BASEPOINT_POINT, scalar::Scalar};
use merlin::Transcript;
use rand_core::{CryptoRng, RngCore};
use scale_info::TypeInfo;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secret key, kept as canonical scalar bytes so it can be wiped on drop.
#[derive(Clone, Encode, Decode, Zeroize, ZeroizeOnDrop)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SecretKey {
    secret: [u8; 32],
}

impl core::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

impl SecretKey {
    pub fn new(secret: Scalar) -> Self {
        Self {
            secret: secret.to_bytes(),
        }
    }

    pub fn random<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::new(Scalar::random(rng))
    }

    pub(crate) fn scalar(&self) -> Scalar {
        Scalar::from_bytes_mod_order(self.secret)
    }

    pub fn public_key(&self) -> AccountId {
        AccountId::from_point(&(self.scalar() * RISTRETTO_BASEPOINT_POINT))
    }

    /// Signs the state of `transcript`.
    pub fn sign<R: RngCore + CryptoRng>(
        &self,
        mut transcript: Transcript,
        rng: &mut R,
    ) -> Signature {
        let public = self.public_key();
        let k = Scalar::random(rng);
        let r = WrappedCompressedRistretto::from(k * RISTRETTO_BASEPOINT_POINT);

        transcript.append_message(b"signer", public.as_bytes());
        transcript.append_message(b"R", r.as_bytes());
        let c = transcript.scalar_challenge(INPUT_TEXT_CHALLENGE_LABEL);

        Signature {
            r,
            s: (k + c * self.scalar()).into(),
        }
    }
}

/// A Schnorr signature `(R, s)`.
#[derive(Copy, Clone, Encode, Decode, TypeInfo, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Signature {
    pub r: WrappedCompressedRistretto,
    pub s: WrappedScalar,
}

impl Signature {
    /// Verify the signature of `signer` over the state of `transcript`.
    pub fn verify(
        &self,
        mut transcript: Transcript,
        signer: &AccountId,
    ) -> Result<(), BackendError> {
        let signer_point = signer.to_point().ok_or(BackendError::InvalidSignature)?;
        let r = self.r.decompress().ok_or(BackendError::InvalidSignature)?;

        transcript.append_message(b"signer", signer.as_bytes());
        transcript.append_validated_point(b"R", &self.r)?;
        let c = transcript.scalar_challenge(INPUT_TEXT_CHALLENGE_LABEL);

        if *self.s * RISTRETTO_BASEPOINT_POINT == r + c * signer_point {
            Ok(())
        } else {
            Err(BackendError::InvalidSignature)
        }
    }
}

/// Holds an account's key pair.
///
/// The same key authenticates the account's input texts and decrypts the
/// ciphertexts the ledger re-encrypts for it.
#[derive(Clone, Debug)]
pub struct AccountKeys {
    pub public: AccountId,
    pub secret: SecretKey,
}

impl AccountKeys {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        Self::from_secret(SecretKey::random(rng))
    }

    pub fn from_secret(secret: SecretKey) -> Self {
        Self {
            public: secret.public_key(),
            secret,
        }
    }

    /// Sign `ciphertext` for submission in `context`.
    pub fn sign_input<R: RngCore + CryptoRng>(
        &self,
        ciphertext: &Ciphertext,
        context: &CallContext,
        rng: &mut R,
    ) -> Signature {
        self.secret
            .sign(input_text_transcript(context, ciphertext), rng)
    }

    /// Decrypt a ciphertext the ledger re-encrypted for this account.
    ///
    /// The "never initialized" sentinel reads as zero.
    pub fn decrypt(&self, ciphertext: &Ciphertext) -> Result<Balance> {
        if ciphertext.is_zero() {
            return Ok(0);
        }
        Ok(cipher::open(Domain::User, &self.secret, ciphertext)?)
    }
}
