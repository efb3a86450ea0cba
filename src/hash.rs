//! the digests the protocol pins: Blake2b for identifiers (addresses,
//! transactions, block headers) and SHA3-256 as the inner digest of the
//! address root.

use std::{
    convert::TryInto,
    fmt,
    hash::{Hash, Hasher},
    io::{BufRead, Write},
    result,
    str::FromStr,
};

use cryptoxide::blake2b::Blake2b;
use cryptoxide::digest::Digest;
use cryptoxide::sha3::Sha3;

use crate::util::{hex, try_from_slice::TryFromSlice};
use cbor_event::{self, de::Deserializer, se::Serializer};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[cfg_attr(feature = "generic-serialization", derive(Serialize, Deserialize))]
pub enum Error {
    /// a digest of the carried size was given where one of the second
    /// carried size was expected
    WrongSize(usize, usize),
    Hexadecimal(hex::Error),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Error::WrongSize(got, expected) => write!(
                f,
                "digest of {} bytes where {} were expected",
                got, expected
            ),
            &Error::Hexadecimal(_) => write!(f, "digest is not valid hexadecimal"),
        }
    }
}
impl From<hex::Error> for Error {
    fn from(e: hex::Error) -> Error {
        Error::Hexadecimal(e)
    }
}
impl ::std::error::Error for Error {
    fn cause(&self) -> Option<&(dyn ::std::error::Error)> {
        match self {
            Error::Hexadecimal(ref err) => Some(err),
            Error::WrongSize(_, _) => None,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

pub const HASH_SIZE_224: usize = 28;
pub const HASH_SIZE_256: usize = 32;

// the conversions, formatting and CBOR encoding shared by every digest
// newtype of this module
macro_rules! digest_newtype {
    ($name:ident, $size:expr) => {
        impl $name {
            pub const HASH_SIZE: usize = $size;

            pub fn as_hash_bytes(&self) -> &[u8; $size] {
                &self.0
            }
        }
        impl From<[u8; $size]> for $name {
            fn from(digest: [u8; $size]) -> Self {
                $name(digest)
            }
        }
        impl From<$name> for [u8; $size] {
            fn from(digest: $name) -> Self {
                digest.0
            }
        }
        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0[..]
            }
        }
        impl TryFromSlice for $name {
            type Error = Error;
            fn try_from_slice(slice: &[u8]) -> Result<Self> {
                let digest: &[u8; $size] = slice
                    .try_into()
                    .map_err(|_| Error::WrongSize(slice.len(), $size))?;
                Ok($name(*digest))
            }
        }
        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state)
            }
        }
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(&hex::encode(self.as_ref()))
            }
        }
        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, concat!(stringify!($name), "(0x{})"), hex::encode(self.as_ref()))
            }
        }
        impl FromStr for $name {
            type Err = Error;
            fn from_str(s: &str) -> Result<Self> {
                Self::try_from_slice(&hex::decode(s)?)
            }
        }
        impl cbor_event::se::Serialize for $name {
            fn serialize<'se, W: Write>(
                &self,
                serializer: &'se mut Serializer<W>,
            ) -> cbor_event::Result<&'se mut Serializer<W>> {
                serializer.write_bytes(self.as_ref())
            }
        }
        impl cbor_event::de::Deserialize for $name {
            fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
                let bytes = reader.bytes()?;
                Self::try_from_slice(&bytes)
                    .map_err(|_| cbor_event::Error::NotEnough(bytes.len(), $size))
            }
        }
    };
}

/// Blake2b with a 224 bit digest, the size of an address root
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct Blake2b224([u8; HASH_SIZE_224]);
digest_newtype!(Blake2b224, HASH_SIZE_224);
impl Blake2b224 {
    pub fn new(buf: &[u8]) -> Self {
        let mut context = Blake2b::new(Self::HASH_SIZE);
        let mut out = [0; Self::HASH_SIZE];
        context.input(buf);
        context.result(&mut out);
        Blake2b224(out)
    }
}

/// Blake2b with a 256 bit digest, the size of transaction and block
/// header identifiers
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct Blake2b256([u8; HASH_SIZE_256]);
digest_newtype!(Blake2b256, HASH_SIZE_256);
impl Blake2b256 {
    pub fn new(buf: &[u8]) -> Self {
        let mut context = Blake2b::new(Self::HASH_SIZE);
        let mut out = [0; Self::HASH_SIZE];
        context.input(buf);
        context.result(&mut out);
        Blake2b256(out)
    }
}

/// SHA3 with a 256 bit digest
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct Sha3_256([u8; HASH_SIZE_256]);
digest_newtype!(Sha3_256, HASH_SIZE_256);
impl Sha3_256 {
    pub fn new(buf: &[u8]) -> Self {
        let mut sha3 = Sha3::sha3_256();
        let mut out = [0; Self::HASH_SIZE];
        sha3.input(buf);
        sha3.result(&mut out);
        Sha3_256(out)
    }
}
