//! network discriminants
//!
//! The protocol magic keeps the main network, the test networks and any
//! fork mutually incompatible: it is mixed into every transaction
//! signature and, for non-mainnet networks, embedded in the addresses
//! themselves.

use cbor_event::{self, de::Deserializer, se::Serializer};
use std::{
    fmt,
    io::{BufRead, Write},
    ops::Deref,
};

/// the mainnet protocol magic
const MAINNET_MAGIC: u32 = 0x6D657269;

/// the 32 bit identifier of a network
///
/// # Default
///
/// defaults to the mainnet magic
///
/// ```
/// use meridian::config::ProtocolMagic;
///
/// assert_eq!(ProtocolMagic::default(), ProtocolMagic::from(0x6D657269));
/// ```
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[cfg_attr(feature = "generic-serialization", derive(Serialize, Deserialize))]
#[repr(C)]
pub struct ProtocolMagic(u32);

impl Default for ProtocolMagic {
    fn default() -> Self {
        ProtocolMagic(MAINNET_MAGIC)
    }
}
impl From<u32> for ProtocolMagic {
    fn from(v: u32) -> Self {
        ProtocolMagic(v)
    }
}
impl Deref for ProtocolMagic {
    type Target = u32;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl fmt::Display for ProtocolMagic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl cbor_event::se::Serialize for ProtocolMagic {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer.write_unsigned_integer(self.0 as u64)
    }
}
impl cbor_event::de::Deserialize for ProtocolMagic {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        Ok(ProtocolMagic(reader.unsigned_integer()? as u32))
    }
}

/// the discriminant as it appears in address attributes
///
/// Mainnet addresses carry no magic at all, every other network writes
/// its protocol magic under attribute key 2 so its addresses cannot
/// cross over.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[cfg_attr(feature = "generic-serialization", derive(Serialize, Deserialize))]
pub enum NetworkMagic {
    NoMagic,
    Magic(u32),
}

impl From<u32> for NetworkMagic {
    fn from(magic: u32) -> Self {
        if magic == MAINNET_MAGIC {
            NetworkMagic::NoMagic
        } else {
            NetworkMagic::Magic(magic)
        }
    }
}
impl From<ProtocolMagic> for NetworkMagic {
    fn from(pm: ProtocolMagic) -> Self {
        NetworkMagic::from(pm.0)
    }
}
