/// fallible construction of a fixed-size object from a byte slice.
///
/// unlike `From`, the conversion is allowed to reject slices of the
/// wrong length (or otherwise malformed content).
pub trait TryFromSlice: Sized {
    type Error;

    fn try_from_slice(slice: &[u8]) -> Result<Self, Self::Error>;
}
