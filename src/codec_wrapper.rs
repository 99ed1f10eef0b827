use codec::{Decode, Encode, Error as CodecError, Input, Output};
use curve25519_dalek::{
    ristretto::{CompressedRistretto, RistrettoPoint},
    scalar::Scalar,
};
use scale_info::{build::Fields, Path, Type, TypeInfo};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use core::ops::Deref;

/// Constants:
/// A serialized Ristretto point size.
pub const RISTRETTO_POINT_SIZE: usize = 32;

/// A serialized Scalar size.
pub const SCALAR_SIZE: usize = 32;

/// Wrapper for `CompressedRistretto` to implement SCALE encoding.
///
/// Decoding rejects byte strings that are not valid compressed points.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WrappedCompressedRistretto(CompressedRistretto);

impl Encode for WrappedCompressedRistretto {
    #[inline]
    fn size_hint(&self) -> usize {
        RISTRETTO_POINT_SIZE
    }

    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.0.as_bytes().encode_to(dest);
    }
}

impl Decode for WrappedCompressedRistretto {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let bytes = <[u8; RISTRETTO_POINT_SIZE]>::decode(input)?;
        let inner = CompressedRistretto(bytes);

        inner
            .decompress()
            .ok_or_else(|| CodecError::from("Invalid `CompressedRistretto`."))?;

        Ok(Self(inner))
    }
}

impl TypeInfo for WrappedCompressedRistretto {
    type Identity = Self;
    fn type_info() -> Type {
        Type::builder()
            .path(Path::new("CompressedRistretto", module_path!()))
            .composite(
                Fields::unnamed()
                    .field(|f| f.ty::<[u8; RISTRETTO_POINT_SIZE]>().type_name("PointBytes")),
            )
    }
}

impl Deref for WrappedCompressedRistretto {
    type Target = CompressedRistretto;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<RistrettoPoint> for WrappedCompressedRistretto {
    fn from(data: RistrettoPoint) -> Self {
        Self(data.compress())
    }
}

impl WrappedCompressedRistretto {
    /// `None` only for values built with `Default` and never decoded.
    pub fn decompress(&self) -> Option<RistrettoPoint> {
        self.0.decompress()
    }
}

/// Wrapper for Scalar to implement SCALE encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WrappedScalar(pub Scalar);

impl Encode for WrappedScalar {
    #[inline]
    fn size_hint(&self) -> usize {
        SCALAR_SIZE
    }

    fn encode_to<W: Output + ?Sized>(&self, dest: &mut W) {
        self.0.as_bytes().encode_to(dest);
    }
}

impl Decode for WrappedScalar {
    /// Decodes a `Scalar` from an array of bytes.
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let s = <[u8; SCALAR_SIZE]>::decode(input)?;

        let inner = Scalar::from_canonical_bytes(s)
            .ok_or_else(|| CodecError::from("Non-canonical `Scalar`."))?;
        Ok(Self(inner))
    }
}

impl TypeInfo for WrappedScalar {
    type Identity = Self;
    fn type_info() -> Type {
        Type::builder()
            .path(Path::new("Scalar", module_path!()))
            .composite(
                Fields::unnamed().field(|f| f.ty::<[u8; SCALAR_SIZE]>().type_name("ScalarBytes")),
            )
    }
}

impl Deref for WrappedScalar {
    type Target = Scalar;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Scalar> for WrappedScalar {
    fn from(data: Scalar) -> Self {
        Self(data)
    }
}
