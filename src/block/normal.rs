//! main blocks, the ones carrying the transaction payload

use std::{
    fmt,
    io::{BufRead, Write},
};

use super::types::{ChainDifficulty, HeaderHash};
use crate::cbor::hs::util::read_indefinite_array;
use crate::config::ProtocolMagic;
use crate::hdwallet::XPub;
use crate::tx::TxAux;
use cbor_event::{self, de::Deserializer, se::Serializer};

/// the ordered signed transactions of a block, an indefinite-length
/// array on the wire
#[derive(Debug, Clone)]
pub struct TxPayload(Vec<TxAux>);

impl TxPayload {
    pub fn new(txaux: Vec<TxAux>) -> Self {
        TxPayload(txaux)
    }
    pub fn empty() -> Self {
        TxPayload(Vec::new())
    }
    pub fn iter<'a>(&'a self) -> std::slice::Iter<'a, TxAux> {
        self.0.iter()
    }
}
impl fmt::Display for TxPayload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<no transactions>");
        }
        for txaux in self.0.iter() {
            writeln!(f, "{}", txaux)?;
        }
        write!(f, "")
    }
}
impl IntoIterator for TxPayload {
    type Item = TxAux;
    type IntoIter = ::std::vec::IntoIter<TxAux>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
impl ::std::ops::Deref for TxPayload {
    type Target = Vec<TxAux>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl cbor_event::se::Serialize for TxPayload {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        cbor_event::se::serialize_indefinite_array(self.0.iter(), serializer)
    }
}
impl cbor_event::de::Deserialize for TxPayload {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        Ok(TxPayload(read_indefinite_array(reader)?))
    }
}

/// a main block body: the transaction payload is the part this library
/// works with, the shared-seed computation, delegation and update
/// payloads round-trip unparsed
#[derive(Debug, Clone)]
pub struct Body {
    pub tx: TxPayload,
    pub ssc: cbor_event::Value,
    pub delegation: cbor_event::Value,
    pub update: cbor_event::Value,
}
impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.tx.fmt(f)
    }
}
impl cbor_event::se::Serialize for Body {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer
            .write_array(cbor_event::Len::Len(4))?
            .serialize(&self.tx)?
            .serialize(&self.ssc)?
            .serialize(&self.delegation)?
            .serialize(&self.update)
    }
}
impl cbor_event::de::Deserialize for Body {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(4, "normal::Body")?;
        Ok(Body {
            tx: reader.deserialize()?,
            ssc: reader.deserialize()?,
            delegation: reader.deserialize()?,
            update: reader.deserialize()?,
        })
    }
}

/// a main block header, a 5-tuple on the wire; the body proof and the
/// extra data round-trip unparsed
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
            "main block at slot {}, magic {}, after {}",
            self.consensus.slot_id, self.protocol_magic, self.previous_header
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
        reader.tuple(5, "normal::BlockHeader")?;
        Ok(BlockHeader {
            protocol_magic: reader.deserialize()?,
            previous_header: reader.deserialize()?,
            body_proof: reader.deserialize()?,
            consensus: reader.deserialize()?,
            extra_data: reader.deserialize()?,
        })
    }
}

/// a main block: its header, its body and the (unparsed) extra field
#[derive(Debug, Clone)]
pub struct Block {
    pub header: BlockHeader,
    pub body: Body,
    pub extra: cbor_event::Value,
}
impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.header)?;
        self.body.fmt(f)
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
        reader.tuple(3, "normal::Block")?;
        Ok(Block {
            header: reader.deserialize()?,
            body: reader.deserialize()?,
            extra: reader.deserialize()?,
        })
    }
}

/// where a block sits in time: the epoch and the slot within it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochSlotId {
    pub epoch: u64,
    pub slotid: u16,
}
impl fmt::Display for EpochSlotId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.epoch, self.slotid)
    }
}
impl cbor_event::se::Serialize for EpochSlotId {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer
            .write_array(cbor_event::Len::Len(2))?
            .write_unsigned_integer(self.epoch)?
            .write_unsigned_integer(self.slotid as u64)
    }
}
impl cbor_event::de::Deserialize for EpochSlotId {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(2, "EpochSlotId")?;
        Ok(EpochSlotId {
            epoch: reader.unsigned_integer()?,
            slotid: reader.unsigned_integer()? as u16,
        })
    }
}

/// the consensus data of a main block: its slot, the key of the slot
/// leader, the chain difficulty and the (unparsed) block signature
#[derive(Debug, Clone)]
pub struct Consensus {
    pub slot_id: EpochSlotId,
    pub leader_key: XPub,
    pub chain_difficulty: ChainDifficulty,
    pub block_signature: cbor_event::Value,
}
impl cbor_event::se::Serialize for Consensus {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer
            .write_array(cbor_event::Len::Len(4))?
            .serialize(&self.slot_id)?
            .serialize(&self.leader_key)?
            .serialize(&self.chain_difficulty)?
            .serialize(&self.block_signature)
    }
}
impl cbor_event::de::Deserialize for Consensus {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(4, "normal::Consensus")?;
        Ok(Consensus {
            slot_id: reader.deserialize()?,
            leader_key: reader.deserialize()?,
            chain_difficulty: reader.deserialize()?,
            block_signature: reader.deserialize()?,
        })
    }
}
