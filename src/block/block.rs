//! either kind of block behind one type
//!
//! On the wire a block is the 2-element sum `[kind, block]`, kind 0 for
//! a boundary block and 1 for a main block; headers travel under the
//! same tagging on their own. The header hash — the block id — digests
//! the *tagged* header bytes.

use std::{
    fmt,
    io::{BufRead, Cursor, Write},
};

use super::boundary;
use super::normal;
use super::types::HeaderHash;
use crate::cbor::hs::util::decode_sum_type;
use crate::config::ProtocolMagic;
use cbor_event::{self, de::Deserializer, se::Serializer};

const KIND_BOUNDARY: u64 = 0;
const KIND_MAIN: u64 = 1;

/// a block as received from the network, undecoded
#[derive(Debug, Clone)]
pub struct RawBlock(pub Vec<u8>);

impl RawBlock {
    pub fn from_dat(dat: Vec<u8>) -> Self {
        RawBlock(dat)
    }

    pub fn decode(&self) -> cbor_event::Result<Block> {
        Deserializer::from(Cursor::new(&self.0)).deserialize_complete()
    }

    /// the serialized tagged header of this block
    pub fn to_header(&self) -> cbor_event::Result<RawBlockHeader> {
        Ok(self.decode()?.header().to_raw())
    }
}
impl AsRef<[u8]> for RawBlock {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// a tagged block header as received from the network, undecoded
#[derive(Debug, Clone)]
pub struct RawBlockHeader(pub Vec<u8>);

impl RawBlockHeader {
    pub fn from_dat(dat: Vec<u8>) -> Self {
        RawBlockHeader(dat)
    }

    pub fn decode(&self) -> cbor_event::Result<BlockHeader> {
        Deserializer::from(Cursor::new(&self.0)).deserialize_complete()
    }

    /// the block id these bytes hash to
    pub fn compute_hash(&self) -> HeaderHash {
        HeaderHash::new(&self.0)
    }
}
impl AsRef<[u8]> for RawBlockHeader {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// the header of either kind of block
#[derive(Debug, Clone)]
pub enum BlockHeader {
    BoundaryBlockHeader(boundary::BlockHeader),
    MainBlockHeader(normal::BlockHeader),
}

impl BlockHeader {
    pub fn is_boundary_block(&self) -> bool {
        match self {
            BlockHeader::BoundaryBlockHeader(_) => true,
            BlockHeader::MainBlockHeader(_) => false,
        }
    }

    /// the id of the block before this one
    pub fn get_previous_header(&self) -> HeaderHash {
        match self {
            BlockHeader::BoundaryBlockHeader(hdr) => hdr.previous_header.clone(),
            BlockHeader::MainBlockHeader(hdr) => hdr.previous_header.clone(),
        }
    }

    /// the id of this block: the digest of the tagged header, so the
    /// same fields hash differently under the boundary and the main
    /// tag
    pub fn compute_hash(&self) -> HeaderHash {
        self.to_raw().compute_hash()
    }

    /// serialize back to the tagged wire form
    pub fn to_raw(&self) -> RawBlockHeader {
        // encoding into a vector only fails on allocation failure
        RawBlockHeader(cbor!(self).unwrap())
    }
}
impl fmt::Display for BlockHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BlockHeader::BoundaryBlockHeader(hdr) => hdr.fmt(f),
            BlockHeader::MainBlockHeader(hdr) => hdr.fmt(f),
        }
    }
}

/// either kind of block
#[derive(Debug, Clone)]
pub enum Block {
    BoundaryBlock(boundary::Block),
    MainBlock(normal::Block),
}
impl Block {
    pub fn is_boundary_block(&self) -> bool {
        match self {
            Block::BoundaryBlock(_) => true,
            Block::MainBlock(_) => false,
        }
    }

    /// a copy of this block's header
    pub fn header(&self) -> BlockHeader {
        match self {
            Block::BoundaryBlock(blk) => BlockHeader::BoundaryBlockHeader(blk.header.clone()),
            Block::MainBlock(blk) => BlockHeader::MainBlockHeader(blk.header.clone()),
        }
    }

    pub fn has_transactions(&self) -> bool {
        self.get_transactions().map_or(false, |txs| !txs.is_empty())
    }

    /// the signed transactions of a main block; a boundary block never
    /// carries any
    pub fn get_transactions(&self) -> Option<normal::TxPayload> {
        match self {
            Block::BoundaryBlock(_) => None,
            Block::MainBlock(blk) => Some(blk.body.tx.clone()),
        }
    }

    pub fn get_protocol_magic(&self) -> ProtocolMagic {
        match self {
            Block::BoundaryBlock(blk) => blk.header.protocol_magic,
            Block::MainBlock(blk) => blk.header.protocol_magic,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Block::BoundaryBlock(blk) => blk.fmt(f),
            Block::MainBlock(blk) => blk.fmt(f),
        }
    }
}

// **************************************************************************
// CBOR implementations
// **************************************************************************

impl cbor_event::se::Serialize for Block {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        let serializer = serializer.write_array(cbor_event::Len::Len(2))?;
        match self {
            Block::BoundaryBlock(blk) => {
                serializer.write_unsigned_integer(KIND_BOUNDARY)?.serialize(blk)
            }
            Block::MainBlock(blk) => serializer.write_unsigned_integer(KIND_MAIN)?.serialize(blk),
        }
    }
}
impl cbor_event::de::Deserialize for Block {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        match decode_sum_type(reader)? {
            KIND_BOUNDARY => Ok(Block::BoundaryBlock(reader.deserialize()?)),
            KIND_MAIN => Ok(Block::MainBlock(reader.deserialize()?)),
            kind => Err(cbor_event::Error::CustomError(format!(
                "Unsupported Block: {}",
                kind
            ))),
        }
    }
}

impl cbor_event::se::Serialize for BlockHeader {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        let serializer = serializer.write_array(cbor_event::Len::Len(2))?;
        match self {
            BlockHeader::BoundaryBlockHeader(hdr) => {
                serializer.write_unsigned_integer(KIND_BOUNDARY)?.serialize(hdr)
            }
            BlockHeader::MainBlockHeader(hdr) => {
                serializer.write_unsigned_integer(KIND_MAIN)?.serialize(hdr)
            }
        }
    }
}
impl cbor_event::de::Deserialize for BlockHeader {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        match decode_sum_type(reader)? {
            KIND_BOUNDARY => Ok(BlockHeader::BoundaryBlockHeader(reader.deserialize()?)),
            KIND_MAIN => Ok(BlockHeader::MainBlockHeader(reader.deserialize()?)),
            kind => Err(cbor_event::Error::CustomError(format!(
                "Unsupported BlockHeader: {}",
                kind
            ))),
        }
    }
}
