//! the transaction model and its wire format
//!
//! [`Tx`](./struct.Tx.html) spends outputs designated by
//! [`TxoPointer`](./struct.TxoPointer.html)s into new
//! [`TxOut`](./struct.TxOut.html)s; one
//! [`TxInWitness`](./struct.TxInWitness.html) per input authorizes the
//! spending and [`TxAux`](./struct.TxAux.html) bundles it all for
//! broadcast. The CBOR layout here is normative: the transaction id is
//! the digest of these exact bytes.

use std::{
    fmt,
    io::{BufRead, Write},
};

use crate::hash::Blake2b256;

use crate::cbor::hs::util::{encode_cbor_in_tag24, raw_from_tag24, read_indefinite_array};
use crate::config::ProtocolMagic;
use cbor_event::{self, de::Deserializer, se::Serializer};

use crate::address::{ExtendedAddr, SpendingData};
use crate::coin::{self, Coin};
use crate::hdwallet::{Signature, XPrv, XPub, SIGNATURE_SIZE, XPUB_SIZE};

/// the first byte of every message signed on the chain names what is
/// being signed; a transaction witness signs under this tag
const SIGNING_TAG_TX: u64 = 0x01;

/// the id of a transaction: the Blake2b-256 of its CBOR, witnesses
/// excluded
pub type TxId = Blake2b256;

/// a designated output of an earlier transaction, the only way to
/// bring value into a new one
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TxoPointer {
    pub id: TxId,
    pub index: u32,
}
impl TxoPointer {
    pub fn new(id: TxId, index: u32) -> Self {
        TxoPointer { id, index }
    }
}
impl fmt::Display for TxoPointer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.index)
    }
}
impl cbor_event::se::Serialize for TxoPointer {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        let serializer = serializer
            .write_array(cbor_event::Len::Len(2))?
            .write_unsigned_integer(0)?;
        encode_cbor_in_tag24(&(&self.id, &self.index), serializer)
    }
}
impl cbor_event::de::Deserialize for TxoPointer {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(2, "TxoPointer")?;
        let kind = reader.unsigned_integer()?;
        if kind != 0 {
            return Err(cbor_event::Error::CustomError(format!(
                "Unsupported TxoPointer: {}",
                kind
            )));
        }
        let mut inner = Deserializer::from(std::io::Cursor::new(raw_from_tag24(reader)?));
        inner.tuple(2, "TxoPointer")?;
        let id = inner.deserialize()?;
        let index = inner.unsigned_integer()? as u32;
        Ok(TxoPointer::new(id, index))
    }
}

/// value sent to an address
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TxOut {
    pub address: ExtendedAddr,
    pub value: Coin,
}
impl TxOut {
    pub fn new(address: ExtendedAddr, value: Coin) -> Self {
        TxOut { address, value }
    }
}
impl fmt::Display for TxOut {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} -> {}", self.address, self.value)
    }
}
impl cbor_event::se::Serialize for TxOut {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer
            .write_array(cbor_event::Len::Len(2))?
            .serialize(&self.address)?
            .serialize(&self.value)
    }
}
impl cbor_event::de::Deserialize for TxOut {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(2, "TxOut")?;
        let address = reader.deserialize()?;
        let value = reader.deserialize()?;
        Ok(TxOut::new(address, value))
    }
}

/// a transaction: what it spends and what it creates
///
/// The protocol reserves an attribute map per transaction but defines
/// no attribute, so the map stays empty on the wire.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Tx {
    pub inputs: Vec<TxoPointer>,
    pub outputs: Vec<TxOut>,
}
impl Tx {
    pub fn new() -> Self {
        Tx::new_with(Vec::new(), Vec::new())
    }
    pub fn new_with(inputs: Vec<TxoPointer>, outputs: Vec<TxOut>) -> Self {
        Tx { inputs, outputs }
    }

    pub fn add_input(&mut self, input: TxoPointer) {
        self.inputs.push(input)
    }
    pub fn add_output(&mut self, output: TxOut) {
        self.outputs.push(output)
    }

    /// the identifier the witnesses sign and later transactions point
    /// to
    pub fn id(&self) -> TxId {
        TxId::new(&cbor!(self).expect("encode Tx"))
    }

    pub fn get_output_total(&self) -> coin::Result<Coin> {
        self.outputs
            .iter()
            .fold(Coin::new(0), |sum, out| sum.and_then(|v| v + out.value))
    }
}
impl fmt::Display for Tx {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for input in self.inputs.iter() {
            writeln!(f, "-> {}", input)?;
        }
        for output in self.outputs.iter() {
            writeln!(f, "   {} ->", output)?;
        }
        write!(f, "")
    }
}
impl cbor_event::se::Serialize for Tx {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        // the input and output streams are indefinite-length arrays,
        // the id digest depends on this exact encoding
        let serializer = serializer.write_array(cbor_event::Len::Len(3))?;
        let serializer = cbor_event::se::serialize_indefinite_array(self.inputs.iter(), serializer)?;
        let serializer =
            cbor_event::se::serialize_indefinite_array(self.outputs.iter(), serializer)?;
        serializer.write_map(cbor_event::Len::Len(0))
    }
}
impl cbor_event::de::Deserialize for Tx {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(3, "Tx")?;
        let inputs = read_indefinite_array(reader)?;
        let outputs = read_indefinite_array(reader)?;
        let attributes = reader.map()?;
        if attributes != cbor_event::Len::Len(0) {
            return Err(cbor_event::Error::CustomError(format!(
                "Invalid Tx: the attribute map must stay empty, received {:?} elements",
                attributes
            )));
        }
        Ok(Tx::new_with(inputs, outputs))
    }
}

/// the authorization of one input: the public key the spent output was
/// locked to and its signature over the signing tag, the protocol
/// magic and the transaction id
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TxInWitness {
    pub key: XPub,
    pub signature: Signature<Tx>,
}
impl TxInWitness {
    /// sign the transaction of the given id for one input
    pub fn new(protocol_magic: ProtocolMagic, key: &XPrv, txid: &TxId) -> Self {
        let message = signed_data(protocol_magic, txid);
        TxInWitness {
            key: key.public(),
            signature: key.sign(&message),
        }
    }

    /// a placeholder of the exact serialized size of a real witness,
    /// for fee estimation
    pub fn fake() -> Self {
        TxInWitness {
            key: XPub::from_bytes([0u8; XPUB_SIZE]),
            signature: Signature::from_bytes([0u8; SIGNATURE_SIZE]),
        }
    }

    /// check this witness' key is the one the given address is locked
    /// to
    pub fn verify_address(&self, address: &ExtendedAddr) -> bool {
        let reconstructed = ExtendedAddr::new(
            address.addr_type,
            SpendingData::PubKeyASD(self.key),
            address.attributes.clone(),
        );
        &reconstructed == address
    }

    /// check the signature authorizes the given transaction on the
    /// given network
    pub fn verify_tx(&self, protocol_magic: ProtocolMagic, tx: &Tx) -> bool {
        let message = signed_data(protocol_magic, &tx.id());
        self.key.verify(&message, &self.signature)
    }

    /// `verify_address` and `verify_tx` together
    pub fn verify(&self, protocol_magic: ProtocolMagic, address: &ExtendedAddr, tx: &Tx) -> bool {
        self.verify_address(address) && self.verify_tx(protocol_magic, tx)
    }
}

// the bytes a witness signs
fn signed_data(protocol_magic: ProtocolMagic, txid: &TxId) -> Vec<u8> {
    let mut se = Serializer::new_vec();
    se.write_unsigned_integer(SIGNING_TAG_TX)
        .expect("write the signing tag")
        .serialize(&protocol_magic)
        .expect("serialize protocol magic")
        .serialize(txid)
        .expect("serialize the Tx id");
    se.finalize()
}

const WITNESS_TAG_PUBKEY: u64 = 0;

impl cbor_event::se::Serialize for TxInWitness {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        let serializer = serializer
            .write_array(cbor_event::Len::Len(2))?
            .write_unsigned_integer(WITNESS_TAG_PUBKEY)?;
        encode_cbor_in_tag24(&(&self.key, &self.signature), serializer)
    }
}
impl cbor_event::de::Deserialize for TxInWitness {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(2, "TxInWitness")?;
        let kind = reader.unsigned_integer()?;
        if kind != WITNESS_TAG_PUBKEY {
            return Err(cbor_event::Error::CustomError(format!(
                "Unsupported TxInWitness: {}",
                kind
            )));
        }
        let mut inner = Deserializer::from(std::io::Cursor::new(raw_from_tag24(reader)?));
        inner.tuple(2, "TxInWitness")?;
        let key = inner.deserialize()?;
        let signature = inner.deserialize()?;
        Ok(TxInWitness { key, signature })
    }
}

/// the witnesses of a transaction, one per input and in the inputs'
/// order
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TxWitness(Vec<TxInWitness>);

impl TxWitness {
    pub fn new() -> Self {
        TxWitness(Vec::new())
    }
}
impl From<Vec<TxInWitness>> for TxWitness {
    fn from(witnesses: Vec<TxInWitness>) -> Self {
        TxWitness(witnesses)
    }
}
impl ::std::iter::FromIterator<TxInWitness> for TxWitness {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TxInWitness>,
    {
        TxWitness(Vec::from_iter(iter))
    }
}
impl ::std::ops::Deref for TxWitness {
    type Target = Vec<TxInWitness>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl ::std::ops::DerefMut for TxWitness {
    fn deref_mut(&mut self) -> &mut Vec<TxInWitness> {
        &mut self.0
    }
}
impl cbor_event::se::Serialize for TxWitness {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        txwitness_serialize(&self.0, serializer)
    }
}
impl cbor_event::de::Deserialize for TxWitness {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        Ok(TxWitness(reader.deserialize()?))
    }
}

pub fn txwitness_serialize<'se, W>(
    witnesses: &Vec<TxInWitness>,
    serializer: &'se mut Serializer<W>,
) -> cbor_event::Result<&'se mut Serializer<W>>
where
    W: Write,
{
    cbor_event::se::serialize_fixed_array(witnesses.iter(), serializer)
}

/// a transaction next to its witnesses, the unit of broadcast
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct TxAux {
    pub tx: Tx,
    pub witness: TxWitness,
}
impl TxAux {
    pub fn new(tx: Tx, witness: TxWitness) -> Self {
        TxAux { tx, witness }
    }
}
impl fmt::Display for TxAux {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Tx:\n{}", self.tx)?;
        writeln!(f, "witnesses: {:?}\n", self.witness)
    }
}
impl cbor_event::se::Serialize for TxAux {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        txaux_serialize(&self.tx, &self.witness, serializer)
    }
}
impl cbor_event::de::Deserialize for TxAux {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        reader.tuple(2, "TxAux")?;
        let tx = reader.deserialize()?;
        let witness = reader.deserialize()?;
        Ok(TxAux::new(tx, witness))
    }
}

pub fn txaux_serialize<'se, W>(
    tx: &Tx,
    witnesses: &Vec<TxInWitness>,
    serializer: &'se mut Serializer<W>,
) -> cbor_event::Result<&'se mut Serializer<W>>
where
    W: Write,
{
    let serializer = serializer
        .write_array(cbor_event::Len::Len(2))?
        .serialize(tx)?;
    txwitness_serialize(witnesses, serializer)
}

/// the byte size a signed transaction will have on the wire
pub fn txaux_serialize_size(tx: &Tx, witnesses: &Vec<TxInWitness>) -> usize {
    // TODO count the bytes without materializing them
    let mut se = Serializer::new_vec();
    txaux_serialize(tx, witnesses, &mut se).expect("serialize a txaux into memory");
    se.finalize().len()
}
