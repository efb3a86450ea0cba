//! epoch boundary blocks
//!
//! One opens every epoch. They never carry transactions: their body is
//! the slot-leader schedule of the epoch they introduce, and this
//! library only ever walks over them.

use super::types::{ChainDifficulty, HeaderHash};
use crate::cbor::hs::util::read_indefinite_array;
use crate::config::ProtocolMagic;
use crate::hash::Blake2b224;

use std::{
    fmt,
    io::{BufRead, Write},
};

use cbor_event::{self, de::Deserializer, se::Serializer};

/// the slot-leader schedule of the opened epoch, each leader named by
/// the digest of its public key
#[derive(Debug, Clone)]
pub struct Body {
    pub slot_leaders: Vec<Blake2b224>,
}
impl cbor_event::se::Serialize for Body {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        cbor_event::se::serialize_indefinite_array(self.slot_leaders.iter(), serializer)
    }
}
impl cbor_event::de::Deserialize for Body {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        Ok(Body {
            slot_leaders: read_indefinite_array(reader)?,
        })
    }
}

/// a boundary block header, a 5-tuple on the wire; the body proof and
/// the extra data round-trip unparsed
#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub protocol_magic: ProtocolMagic,
    pub previous_header: HeaderHash,
    pub body_proof: cbor_event::Value,
    pub consensus: Consensus,
    pub extra_data: cbor_event::Value,
}
impl fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "boundary block of epoch {}, magic {}, after {}",
            self.consensus.epoch, self.protocol_magic, self.previous_header
        )
    }
}
impl cbor_event::se::Serialize for BlockHeader {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer
            .write_array(cbor_event::Len::Len(5))?
            .serialize(&self.protocol_magic)?
            .serialize(&self.previous_header)?
            .serialize(&self.body_proof)?
            .serialize(&self.consensus)?
            .serialize(&self.extra_data)
    }
}
impl cbor_event::de::Deserialize for BlockHeader {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(5, "boundary::BlockHeader")?;
        Ok(BlockHeader {
            protocol_magic: reader.deserialize()?,
            previous_header: reader.deserialize()?,
            body_proof: reader.deserialize()?,
            consensus: reader.deserialize()?,
            extra_data: reader.deserialize()?,
        })
    }
}

/// a boundary block: its header, the schedule and the (unparsed)
/// extra field
#[derive(Debug, Clone)]
pub struct Block {
    pub header: BlockHeader,
    pub body: Body,
    pub extra: cbor_event::Value,
}
impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        write!(f, "{} slot leaders", self.body.slot_leaders.len())
    }
}
impl cbor_event::se::Serialize for Block {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer
            .write_array(cbor_event::Len::Len(3))?
            .serialize(&self.header)?
            .serialize(&self.body)?
            .serialize(&self.extra)
    }
}
impl cbor_event::de::Deserialize for Block {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(3, "boundary::Block")?;
        Ok(Block {
            header: reader.deserialize()?,
            body: reader.deserialize()?,
            extra: reader.deserialize()?,
        })
    }
}

/// the epoch this block opens and the accumulated chain difficulty
#[derive(Debug, Clone)]
pub struct Consensus {
    pub epoch: u64,
    pub chain_difficulty: ChainDifficulty,
}
impl cbor_event::se::Serialize for Consensus {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer
            .write_array(cbor_event::Len::Len(2))?
            .write_unsigned_integer(self.epoch)?
            .serialize(&self.chain_difficulty)
    }
}
impl cbor_event::de::Deserialize for Consensus {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(2, "boundary::Consensus")?;
        Ok(Consensus {
            epoch: reader.unsigned_integer()?,
            chain_difficulty: reader.deserialize()?,
        })
    }
}
