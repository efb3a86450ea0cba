//! protocol addresses
//!
//! An address names the hash of the data allowed to spend its outputs,
//! together with a small attribute map. The canonical value is the
//! [`ExtendedAddr`](./struct.ExtendedAddr.html) triple
//! `(root, attributes, type)`; on the wire it travels wrapped in a
//! tag 24 / CRC32 envelope, and that envelope rendered in base58 is
//! what users copy around.

use crate::hash::{Blake2b224, Sha3_256};

use crate::cbor::hs::util::{encode_with_crc32_, raw_with_crc32};
use crate::config::NetworkMagic;
use crate::hdpayload;
use crate::hdwallet::XPub;
use crate::util::{base58, try_from_slice::TryFromSlice};
use cbor_event::{self, de::Deserializer, se::Serializer};

use std::{
    fmt,
    io::{BufRead, Write},
    str::FromStr,
};

/// the kind of data allowed to spend from an address
///
/// Only public key addresses are ever produced here; the other two
/// kinds still decode so foreign addresses can be carried around.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub enum AddrType {
    ATPubKey,
    ATScript,
    ATRedeem,
}
impl AddrType {
    fn from_u64(v: u64) -> Option<Self> {
        match v {
            0 => Some(AddrType::ATPubKey),
            1 => Some(AddrType::ATScript),
            2 => Some(AddrType::ATRedeem),
            _ => None,
        }
    }
    fn to_byte(self) -> u8 {
        match self {
            AddrType::ATPubKey => 0,
            AddrType::ATScript => 1,
            AddrType::ATRedeem => 2,
        }
    }
}
impl fmt::Display for AddrType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AddrType::ATPubKey => write!(f, "Public Key"),
            AddrType::ATScript => write!(f, "Script"),
            AddrType::ATRedeem => write!(f, "Redeem"),
        }
    }
}
impl cbor_event::se::Serialize for AddrType {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer.write_unsigned_integer(self.to_byte() as u64)
    }
}
impl cbor_event::de::Deserialize for AddrType {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        match AddrType::from_u64(reader.unsigned_integer()?) {
            Some(addr_type) => Ok(addr_type),
            None => Err(cbor_event::Error::CustomError(format!("Invalid AddrType"))),
        }
    }
}

/// the data revealed when spending from an address, hashed into the
/// address root beforehand
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SpendingData {
    PubKeyASD(XPub),
}

const SPENDING_DATA_TAG_PUBKEY: u64 = 0;

impl cbor_event::se::Serialize for SpendingData {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        match self {
            SpendingData::PubKeyASD(ref xpub) => serializer
                .write_array(cbor_event::Len::Len(2))?
                .write_unsigned_integer(SPENDING_DATA_TAG_PUBKEY)?
                .serialize(xpub),
        }
    }
}

/// the attributes an address can carry
///
/// Every recognized attribute is optional and mainnet public key
/// addresses typically carry none: the encrypted derivation path only
/// appears on some legacy wallets' addresses and the network magic
/// only outside the mainnet.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct Attributes {
    pub derivation_path: Option<hdpayload::Payload>,
    pub network_magic: NetworkMagic,
}

const ATTRIBUTE_NAME_TAG_DERIVATION: u64 = 1;
const ATTRIBUTE_NAME_TAG_NETWORK_MAGIC: u64 = 2;

impl Attributes {
    pub fn new_bootstrap_era(
        derivation_path: Option<hdpayload::Payload>,
        network_magic: NetworkMagic,
    ) -> Self {
        Attributes {
            derivation_path,
            network_magic,
        }
    }
}

impl cbor_event::se::Serialize for Attributes {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        let count = self.derivation_path.iter().count()
            + match self.network_magic {
                NetworkMagic::NoMagic => 0,
                NetworkMagic::Magic(_) => 1,
            };
        let mut serializer = serializer.write_map(cbor_event::Len::Len(count as u64))?;
        if let Some(ref payload) = self.derivation_path {
            serializer = serializer
                .write_unsigned_integer(ATTRIBUTE_NAME_TAG_DERIVATION)?
                .serialize(payload)?;
        }
        if let NetworkMagic::Magic(magic) = self.network_magic {
            // the magic is CBOR wrapped in a byte string inside the map
            serializer = serializer
                .write_unsigned_integer(ATTRIBUTE_NAME_TAG_NETWORK_MAGIC)?
                .write_bytes(cbor!(&magic)?)?;
        }
        Ok(serializer)
    }
}
impl cbor_event::de::Deserialize for Attributes {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        let count = match reader.map()? {
            cbor_event::Len::Len(count) => count,
            len @ cbor_event::Len::Indefinite => {
                return Err(cbor_event::Error::CustomError(format!(
                    "Invalid Attributes: received map of {:?} elements",
                    len
                )));
            }
        };

        let mut attributes = Attributes::new_bootstrap_era(None, NetworkMagic::NoMagic);
        for _ in 0..count {
            match reader.unsigned_integer()? {
                ATTRIBUTE_NAME_TAG_DERIVATION => {
                    attributes.derivation_path = Some(reader.deserialize()?);
                }
                ATTRIBUTE_NAME_TAG_NETWORK_MAGIC => {
                    let bytes = reader.bytes()?;
                    let magic =
                        Deserializer::from(std::io::Cursor::new(bytes)).deserialize::<u32>()?;
                    attributes.network_magic = NetworkMagic::Magic(magic);
                }
                key => {
                    return Err(cbor_event::Error::CustomError(format!(
                        "invalid Attribute key {}",
                        key
                    )));
                }
            }
        }
        Ok(attributes)
    }
}

/// the root of an address: the double digest of its type, spending
/// data and attributes
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct AddrRoot(Blake2b224);

impl AddrRoot {
    pub fn new(addr_type: AddrType, spending_data: &SpendingData, attrs: &Attributes) -> Self {
        // Blake2b over SHA3, both over the CBOR of the triple
        let digest_data = cbor!(&(&addr_type, spending_data, attrs))
            .expect("serialize the data the address root digests");
        AddrRoot(Blake2b224::new(Sha3_256::new(&digest_data).as_ref()))
    }

    pub fn as_hash_bytes(&self) -> &[u8; Blake2b224::HASH_SIZE] {
        self.0.as_hash_bytes()
    }
}
impl fmt::Display for AddrRoot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
impl AsRef<[u8]> for AddrRoot {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}
impl From<[u8; Blake2b224::HASH_SIZE]> for AddrRoot {
    fn from(digest: [u8; Blake2b224::HASH_SIZE]) -> Self {
        AddrRoot(Blake2b224::from(digest))
    }
}
impl TryFromSlice for AddrRoot {
    type Error = <Blake2b224 as TryFromSlice>::Error;
    fn try_from_slice(slice: &[u8]) -> ::std::result::Result<Self, Self::Error> {
        Ok(AddrRoot(Blake2b224::try_from_slice(slice)?))
    }
}
impl FromStr for AddrRoot {
    type Err = <Blake2b224 as FromStr>::Err;
    fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
        Ok(AddrRoot(Blake2b224::from_str(s)?))
    }
}
impl cbor_event::se::Serialize for AddrRoot {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer.serialize(&self.0)
    }
}
impl cbor_event::de::Deserialize for AddrRoot {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        Ok(AddrRoot(reader.deserialize()?))
    }
}

/// an address in its deconstructed form
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExtendedAddr {
    pub root: AddrRoot,
    pub attributes: Attributes,
    pub addr_type: AddrType,
}
impl ExtendedAddr {
    pub fn new(addr_type: AddrType, spending_data: SpendingData, attributes: Attributes) -> Self {
        ExtendedAddr {
            root: AddrRoot::new(addr_type, &spending_data, &attributes),
            attributes,
            addr_type,
        }
    }

    /// the address of the given public key, without any attribute
    /// beyond the network discriminant
    pub fn new_simple(xpub: XPub, network_magic: NetworkMagic) -> Self {
        ExtendedAddr::new(
            AddrType::ATPubKey,
            SpendingData::PubKeyASD(xpub),
            Attributes::new_bootstrap_era(None, network_magic),
        )
    }

    /// the serialized form of this address
    pub fn to_address(&self) -> Addr {
        // a valid address always serializes
        Addr(cbor!(self).unwrap())
    }
}
impl TryFromSlice for ExtendedAddr {
    type Error = cbor_event::Error;
    fn try_from_slice(slice: &[u8]) -> ::std::result::Result<Self, Self::Error> {
        let mut reader = Deserializer::from(std::io::Cursor::new(slice));
        reader.deserialize::<Self>()
    }
}
impl cbor_event::se::Serialize for ExtendedAddr {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        encode_with_crc32_(
            &(&self.root, &self.attributes, &self.addr_type),
            serializer,
        )
    }
}
impl cbor_event::de::Deserialize for ExtendedAddr {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        let inner = raw_with_crc32(reader)?;
        let mut reader = Deserializer::from(std::io::Cursor::new(inner));
        reader.tuple(3, "ExtendedAddr")?;
        let root = reader.deserialize()?;
        let attributes = reader.deserialize()?;
        let addr_type = reader.deserialize()?;
        Ok(ExtendedAddr {
            root,
            attributes,
            addr_type,
        })
    }
}
impl fmt::Display for ExtendedAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}
impl FromStr for ExtendedAddr {
    type Err = ParseExtendedAddrError;
    fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
        let bytes = base58::decode(s).map_err(ParseExtendedAddrError::Base58Error)?;
        Self::try_from_slice(&bytes).map_err(ParseExtendedAddrError::EncodingError)
    }
}

#[derive(Debug)]
pub enum ParseExtendedAddrError {
    EncodingError(cbor_event::Error),
    Base58Error(base58::Error),
}

/// an address in its serialized form: the exact bytes of the CRC32
/// envelope, rendered in base58 by `Display`
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct Addr(Vec<u8>);

impl Addr {
    pub fn deconstruct(&self) -> ExtendedAddr {
        // the bytes were validated on the way in
        ExtendedAddr::try_from_slice(&self.0).unwrap()
    }
}
impl AsRef<[u8]> for Addr {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}
impl TryFromSlice for Addr {
    type Error = cbor_event::Error;
    fn try_from_slice(slice: &[u8]) -> ::std::result::Result<Self, Self::Error> {
        // validated, then kept as given so the envelope round-trips bit
        // exactly
        let _: ExtendedAddr = ExtendedAddr::try_from_slice(slice)?;
        Ok(Addr(slice.to_vec()))
    }
}
impl From<ExtendedAddr> for Addr {
    fn from(ea: ExtendedAddr) -> Self {
        ea.to_address()
    }
}
impl FromStr for Addr {
    type Err = ParseExtendedAddrError;
    fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
        let bytes = base58::decode(s).map_err(ParseExtendedAddrError::Base58Error)?;
        Self::try_from_slice(&bytes).map_err(ParseExtendedAddrError::EncodingError)
    }
}
impl fmt::Display for Addr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", base58::encode(&self.0))
    }
}
impl cbor_event::se::Serialize for Addr {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        // Addr is already serialized
        serializer.write_raw_bytes(&self.0)
    }
}
impl cbor_event::de::Deserialize for Addr {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        let ea: ExtendedAddr = reader.deserialize()?;
        Ok(ea.to_address())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkMagic;
    use crate::hdwallet::{Seed, XPrv, SEED_SIZE};
    use crate::util::{base58, hex};

    fn any_xpub(seed_byte: u8) -> XPub {
        let seed = Seed::from_bytes([seed_byte; SEED_SIZE]);
        XPrv::generate_from_seed(&seed).public()
    }

    #[test]
    fn addr_type_codec() {
        for t in [AddrType::ATPubKey, AddrType::ATScript, AddrType::ATRedeem].iter() {
            assert!(cbor_event::test_encode_decode(t).unwrap());
        }
        // 3 is not an address type
        let mut raw = Deserializer::from(std::io::Cursor::new(vec![0x03]));
        assert!(raw.deserialize::<AddrType>().is_err());
    }

    #[test]
    fn attributes_of_a_plain_mainnet_address_are_empty() {
        let ea = ExtendedAddr::new_simple(any_xpub(0), NetworkMagic::NoMagic);
        assert_eq!(ea.attributes.derivation_path, None);
        assert_eq!(ea.attributes.network_magic, NetworkMagic::NoMagic);
        assert_eq!(cbor!(&ea.attributes).unwrap(), vec![0xa0]);
    }

    #[test]
    fn testnet_magic_is_carried_in_the_attributes() {
        let ea = ExtendedAddr::new_simple(any_xpub(0), NetworkMagic::Magic(1));
        // {2: bytes<cbor<1>>}
        assert_eq!(cbor!(&ea.attributes).unwrap(), vec![0xa1, 0x02, 0x41, 0x01]);

        let r = ExtendedAddr::try_from_slice(&cbor!(&ea).unwrap()).unwrap();
        assert_eq!(r.attributes.network_magic, NetworkMagic::Magic(1));
    }

    #[test]
    fn decode_pinned_address() {
        // a public key address without attributes
        let bytes = hex::decode(
            "82d8185821\
             83581c102a74ca4405b8c18d20841e8c664fe1de7d66074808704f9179e0fa\
             a000\
             1aadf71068",
        )
        .unwrap();

        let r = ExtendedAddr::try_from_slice(&bytes).unwrap();

        assert_eq!(r.addr_type, AddrType::ATPubKey);
        assert_eq!(r.attributes.derivation_path, None);
        assert_eq!(r.attributes.network_magic, NetworkMagic::NoMagic);
        assert_eq!(
            format!("{}", r.root),
            "102a74ca4405b8c18d20841e8c664fe1de7d66074808704f9179e0fa"
        );
        assert_eq!(bytes, cbor!(r).unwrap())
    }

    #[test]
    fn base58_round_trip() {
        let ea = ExtendedAddr::new_simple(any_xpub(1), NetworkMagic::Magic(42));
        let encoded = format!("{}", ea);

        let decoded = ExtendedAddr::from_str(&encoded).unwrap();
        assert_eq!(ea, decoded);
        assert_eq!(encoded, format!("{}", decoded));
    }

    #[test]
    fn corrupted_crc_is_rejected() {
        let ea = ExtendedAddr::new_simple(any_xpub(1), NetworkMagic::NoMagic);
        let mut bytes = cbor!(&ea).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        assert!(ExtendedAddr::try_from_slice(&bytes).is_err());
    }

    #[test]
    fn addr_keeps_the_bytes_it_was_given() {
        let ea = ExtendedAddr::new_simple(any_xpub(2), NetworkMagic::NoMagic);
        let addr = ea.to_address();

        let recovered = Addr::from_str(&format!("{}", addr)).unwrap();
        assert_eq!(addr, recovered);
        assert_eq!(recovered.deconstruct(), ea);
        assert_eq!(base58::decode(&format!("{}", addr)).unwrap(), addr.as_ref());
    }

    #[test]
    fn unknown_attribute_keys_are_rejected() {
        // {3: 0} is not a recognized attribute map
        let mut raw = Deserializer::from(std::io::Cursor::new(vec![0xa1, 0x03, 0x00]));
        assert!(raw.deserialize::<Attributes>().is_err());
    }
}
