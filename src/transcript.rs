//! Merlin transcript helpers shared by the input text signature scheme.

use crate::{errors::BackendError, input::CallContext, Ciphertext};

use codec::Encode;
use curve25519_dalek::{
    ristretto::CompressedRistretto, scalar::Scalar, traits::IsIdentity,
};
use merlin::Transcript;

/// The domain label for input text signatures.
pub const INPUT_TEXT_SIGNATURE_LABEL: &[u8] = b"ConfidentialTokenInputTextSignature";
/// The domain label for the signature challenge.
pub const INPUT_TEXT_CHALLENGE_LABEL: &[u8] = b"ConfidentialTokenInputTextChallenge";

pub trait TranscriptProtocol {
    /// Appends a point, rejecting the identity.
    fn append_validated_point(
        &mut self,
        label: &'static [u8],
        point: &CompressedRistretto,
    ) -> Result<(), BackendError>;

    /// Derives a scalar challenge from the current transcript state.
    fn scalar_challenge(&mut self, label: &'static [u8]) -> Scalar;
}

impl TranscriptProtocol for Transcript {
    fn append_validated_point(
        &mut self,
        label: &'static [u8],
        point: &CompressedRistretto,
    ) -> Result<(), BackendError> {
        if point.is_identity() {
            return Err(BackendError::InvalidSignature);
        }
        self.append_message(label, point.as_bytes());
        Ok(())
    }

    fn scalar_challenge(&mut self, label: &'static [u8]) -> Scalar {
        let mut buf = [0u8; 64];
        self.challenge_bytes(label, &mut buf);
        Scalar::from_bytes_mod_order_wide(&buf)
    }
}

/// Builds the transcript an input text signature commits to.
///
/// The ledger, entry point selector, submitter and ciphertext are all bound,
/// so a signature produced for one context does not verify in any other.
pub fn input_text_transcript(context: &CallContext, ciphertext: &Ciphertext) -> Transcript {
    let mut transcript = Transcript::new(INPUT_TEXT_SIGNATURE_LABEL);
    transcript.append_message(b"ledger", context.ledger.as_bytes());
    transcript.append_message(b"selector", context.selector.as_bytes());
    transcript.append_message(b"caller", context.caller.as_bytes());
    transcript.append_message(b"ciphertext", &ciphertext.encode());
    transcript
}
