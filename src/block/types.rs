use crate::hash::Blake2b256;
use crate::util::try_from_slice::TryFromSlice;
use cbor_event::{self, de::Deserializer, se::Serializer};
use std::{
    fmt,
    io::{BufRead, Write},
    str::FromStr,
};

/// the hash of a block's header, used to identify a block and to chain
/// the blocks together.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct HeaderHash(Blake2b256);
impl HeaderHash {
    pub fn new(bytes: &[u8]) -> Self {
        HeaderHash(Blake2b256::new(bytes))
    }
}
impl fmt::Display for HeaderHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
impl TryFromSlice for HeaderHash {
    type Error = <Blake2b256 as TryFromSlice>::Error;
    fn try_from_slice(slice: &[u8]) -> ::std::result::Result<Self, Self::Error> {
        Ok(Self::from(Blake2b256::try_from_slice(slice)?))
    }
}
impl AsRef<[u8]> for HeaderHash {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}
impl From<HeaderHash> for [u8; Blake2b256::HASH_SIZE] {
    fn from(hash: HeaderHash) -> Self {
        hash.0.into()
    }
}
impl From<[u8; Blake2b256::HASH_SIZE]> for HeaderHash {
    fn from(hash: [u8; Blake2b256::HASH_SIZE]) -> Self {
        HeaderHash(Blake2b256::from(hash))
    }
}
impl From<Blake2b256> for HeaderHash {
    fn from(hash: Blake2b256) -> Self {
        HeaderHash(hash)
    }
}
impl FromStr for HeaderHash {
    type Err = <Blake2b256 as FromStr>::Err;
    fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
        Ok(Self::from(Blake2b256::from_str(s)?))
    }
}
impl cbor_event::se::Serialize for HeaderHash {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer.serialize(&self.0)
    }
}
impl cbor_event::de::Deserialize for HeaderHash {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        Ok(HeaderHash(cbor_event::de::Deserialize::deserialize(reader)?))
    }
}

/// number of blocks on the chain up to this block, wrapped in a
/// 1-element list on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChainDifficulty(u64);
impl From<u64> for ChainDifficulty {
    fn from(d: u64) -> Self {
        ChainDifficulty(d)
    }
}
impl fmt::Display for ChainDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl cbor_event::se::Serialize for ChainDifficulty {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer
            .write_array(cbor_event::Len::Len(1))?
            .write_unsigned_integer(self.0)
    }
}
impl cbor_event::de::Deserialize for ChainDifficulty {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(1, "ChainDifficulty")?;
        Ok(ChainDifficulty(reader.unsigned_integer()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_hash_renders_as_lowercase_hex() {
        let h = HeaderHash::new(b"deterministic input");
        let rendered = format!("{}", h);
        assert_eq!(rendered.len(), 64);
        assert!(rendered
            .chars()
            .all(|c| c.is_ascii_digit() || (c.is_ascii_lowercase() && c.is_ascii_hexdigit())));
        assert_eq!(HeaderHash::from_str(&rendered).unwrap(), h);
    }
}
