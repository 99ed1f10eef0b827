use thiserror::Error;

use crate::AccountId;

/// Failures reported by a secure computation backend.
///
/// Any of these aborts the enclosing ledger operation before a single
/// record is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The ciphertext bytes do not decode to a valid ciphertext.
    #[error("The ciphertext is malformed")]
    MalformedCiphertext,

    /// The ciphertext was not produced by this backend for the requested use.
    #[error("The ciphertext was not produced by this backend for this use")]
    UnrecognizedCiphertext,

    /// The input text signature does not authenticate its call context.
    #[error("The input text signature is invalid")]
    InvalidSignature,

    /// A re-encryption target is not a valid public key.
    #[error("The re-encryption target {0:?} is not a valid public key")]
    InvalidPublicKey(AccountId),
}

/// Confidential token error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A submitted input text failed signature verification.
    #[error("Input text signature verification failed")]
    SignatureVerificationFailed,

    /// The caller is neither the owner nor the spender of the queried allowance.
    #[error("Account {caller:?} is not allowed to read this allowance")]
    AccessDenied { caller: AccountId },

    /// A re-encryption key is not a valid public key.
    #[error("The encryption key {key:?} is not a valid public key")]
    InvalidEncryptionKey { key: AccountId },

    /// The secure computation backend failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Error while converting a wire type from its binary format.
    #[error("Error during the deserialization from byte array.")]
    SerializationError,
}

impl From<codec::Error> for Error {
    fn from(_: codec::Error) -> Self {
        Error::SerializationError
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
