//! the encrypted derivation path attribute
//!
//! An address can carry its own derivation path, sealed with
//! ChaCha20Poly1305 under a key only the wallet can rebuild from its
//! root public key. Scanning the chain, the wallet recognizes its
//! addresses by opening this attribute; everyone else only sees an
//! opaque byte string.

use cryptoxide::chacha20poly1305::ChaCha20Poly1305;
use cryptoxide::hmac::Hmac;
use cryptoxide::pbkdf2::pbkdf2;
use cryptoxide::sha2::Sha512;

use std::{
    fmt,
    io::{BufRead, Write},
    ops::Deref,
};

use crate::hdwallet::XPub;
use cbor_event::{
    self,
    de::Deserializer,
    se::{self, Serializer},
};

use crate::util::{hex, securemem};

// the protocol fixes the AEAD inputs: the nonce is a constant and the
// key is derived from the wallet root public key with these parameters
const NONCE: &'static [u8] = b"serokellfore";
const KEY_SALT: &'static [u8] = b"address-hashing";
const KEY_ITERATIONS: u32 = 500;
const TAG_LEN: usize = 16;

/// ciphertexts longer than this are not even attempted: addresses are
/// small and a huge attribute cannot be a wallet's
pub const MAX_PAYLOAD_SIZE: usize = 48;

#[derive(Debug)]
pub enum Error {
    /// a payload key must be `PAYLOAD_KEY_SIZE` bytes
    InvalidKeySize(usize),
    /// the authentication tag did not check out: not this wallet's
    /// address, or not an encrypted path at all
    CannotDecrypt,
    /// the ciphertext is too short to even carry its tag
    NotEnoughEncryptedData,
    /// the ciphertext is longer than any sealed path can be
    PayloadIsTooLarge(usize),
    /// decryption succeeded but the plaintext is not a CBOR path
    CborError(cbor_event::Error),
}
impl From<cbor_event::Error> for Error {
    fn from(e: cbor_event::Error) -> Self {
        Error::CborError(e)
    }
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidKeySize(sz) => write!(
                f,
                "payload key of {} bytes where {} are expected",
                sz, PAYLOAD_KEY_SIZE
            ),
            Error::CannotDecrypt => write!(f, "payload cannot be decrypted with this key"),
            Error::NotEnoughEncryptedData => write!(
                f,
                "payload of less than the {} bytes of its authentication tag",
                TAG_LEN
            ),
            Error::PayloadIsTooLarge(len) => write!(
                f,
                "payload of {} bytes where at most {} are expected",
                len, MAX_PAYLOAD_SIZE
            ),
            Error::CborError(_) => write!(f, "payload decrypted to something else than a path"),
        }
    }
}
impl ::std::error::Error for Error {
    fn cause(&self) -> Option<&(dyn ::std::error::Error)> {
        match self {
            Error::CborError(ref err) => Some(err),
            _ => None,
        }
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;

/// a derivation path, the plaintext the attribute seals
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct Path(Vec<u32>);
impl Path {
    pub fn new(v: Vec<u32>) -> Self {
        Path(v)
    }
    fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let mut raw = Deserializer::from(std::io::Cursor::new(bytes));
        Ok(raw.deserialize()?)
    }
    fn cbor(&self) -> Vec<u8> {
        cbor!(self).expect("Serialize the given Path in cbor")
    }
}
impl Deref for Path {
    type Target = [u32];
    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}
impl AsRef<[u32]> for Path {
    fn as_ref(&self) -> &[u32] {
        self.0.as_ref()
    }
}
impl cbor_event::se::Serialize for Path {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        se::serialize_indefinite_array(self.0.iter(), serializer)
    }
}
impl cbor_event::de::Deserialize for Path {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        Ok(Path(reader.deserialize()?))
    }
}

pub const PAYLOAD_KEY_SIZE: usize = 32;

/// the symmetric key sealing the attribute, derived from the wallet
/// root public key
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct PayloadKey([u8; PAYLOAD_KEY_SIZE]);
impl PayloadKey {
    /// derive the key of the wallet owning the given root public key
    pub fn new(root_pub: &XPub) -> Self {
        let mut mac = Hmac::new(Sha512::new(), root_pub.as_ref());
        let mut key = [0; PAYLOAD_KEY_SIZE];
        pbkdf2(&mut mac, KEY_SALT, KEY_ITERATIONS, &mut key);
        PayloadKey(key)
    }

    pub fn from_bytes(bytes: [u8; PAYLOAD_KEY_SIZE]) -> Self {
        PayloadKey(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PAYLOAD_KEY_SIZE {
            return Err(Error::InvalidKeySize(bytes.len()));
        }
        let mut key = [0u8; PAYLOAD_KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(PayloadKey(key))
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut sealed = vec![0u8; plaintext.len() + TAG_LEN];
        {
            let (ciphertext, tag) = sealed.split_at_mut(plaintext.len());
            let mut context = ChaCha20Poly1305::new(&self.0, NONCE, &[]);
            context.encrypt(plaintext, ciphertext, tag);
        }
        sealed
    }

    pub fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() <= TAG_LEN {
            return Err(Error::NotEnoughEncryptedData);
        }
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);
        if ciphertext.len() >= MAX_PAYLOAD_SIZE {
            return Err(Error::PayloadIsTooLarge(ciphertext.len()));
        }

        let mut plaintext = vec![0u8; ciphertext.len()];
        let mut context = ChaCha20Poly1305::new(&self.0, NONCE, &[]);
        if context.decrypt(ciphertext, &mut plaintext, tag) {
            Ok(plaintext)
        } else {
            Err(Error::CannotDecrypt)
        }
    }

    /// seal a derivation path into an address attribute
    pub fn encrypt_path(&self, derivation_path: &Path) -> Payload {
        Payload::from_vec(self.encrypt(&derivation_path.cbor()))
    }

    /// open an address attribute back into its derivation path
    pub fn decrypt_path(&self, payload: &Payload) -> Result<Path> {
        Path::from_cbor(&self.decrypt(payload.as_ref())?)
    }
}
impl AsRef<[u8]> for PayloadKey {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}
impl Drop for PayloadKey {
    fn drop(&mut self) {
        securemem::zero(&mut self.0);
    }
}

/// the attribute itself: an encrypted derivation path plus its
/// authentication tag, opaque to anyone without the key
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct Payload(Vec<u8>);
impl Payload {
    pub fn from_vec(v: Vec<u8>) -> Self {
        Payload(v)
    }
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Payload(bytes.to_vec())
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
}
impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}
impl Deref for Payload {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_ref()))
    }
}
impl cbor_event::se::Serialize for Payload {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        // a byte string holding the CBOR of a byte string
        se::serialize_cbor_in_cbor(self.0.as_slice(), serializer)
    }
}
impl cbor_event::de::Deserialize for Payload {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        let mut inner = Deserializer::from(std::io::Cursor::new(reader.bytes()?));
        Ok(Payload(inner.bytes()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdwallet::{Seed, XPrv, SEED_SIZE};
    use crate::util::hex;

    fn wallet_key(seed_byte: u8) -> PayloadKey {
        let seed = Seed::from_bytes([seed_byte; SEED_SIZE]);
        PayloadKey::new(&XPrv::generate_from_seed(&seed).public())
    }

    #[test]
    fn seal_then_open() {
        let content = vec![42u8; MAX_PAYLOAD_SIZE - 1];
        let key = wallet_key(0);
        let sealed = key.encrypt(&content);
        assert_eq!(content, key.decrypt(&sealed).unwrap());
    }

    #[test]
    fn another_wallet_cannot_open() {
        let path = Path::new(vec![0, 1, 2]);
        let sealed = wallet_key(0).encrypt_path(&path);
        match wallet_key(1).decrypt_path(&sealed) {
            Err(Error::CannotDecrypt) => (),
            r => panic!("expecting Error::CannotDecrypt but got {:#?}", r),
        }
    }

    #[test]
    fn short_ciphertexts_are_rejected() {
        let key = wallet_key(0);
        match key.decrypt(&[42u8; TAG_LEN - 1]) {
            Err(Error::NotEnoughEncryptedData) => (),
            r => panic!("expecting Error::NotEnoughEncryptedData but got {:#?}", r),
        }
    }

    #[test]
    fn oversized_ciphertexts_are_rejected() {
        let key = wallet_key(0);
        match key.decrypt(&[42u8; 2 * MAX_PAYLOAD_SIZE]) {
            Err(Error::PayloadIsTooLarge(len)) => {
                assert_eq!(len, 2 * MAX_PAYLOAD_SIZE - TAG_LEN)
            }
            r => panic!("expecting Error::PayloadIsTooLarge but got {:#?}", r),
        }
    }

    #[test]
    fn path_is_an_indefinite_cbor_array() {
        let path = Path::new(vec![0, 1]);
        assert_eq!(path.cbor(), [0x9f, 0x00, 0x01, 0xff]);
        assert_eq!(Path::from_cbor(&path.cbor()).unwrap(), path);
    }

    #[test]
    fn sealed_path_round_trip() {
        let path = Path::new(vec![0, 1, 2]);
        let key = wallet_key(0);
        let sealed = key.encrypt_path(&path);
        assert_eq!(path, key.decrypt_path(&sealed).unwrap());
    }

    #[test]
    fn pinned_encryption() {
        let key = PayloadKey::from_bytes([0u8; PAYLOAD_KEY_SIZE]);
        let sealed = key.encrypt(&[0x9f, 0x00, 0x01, 0xff]);
        assert_eq!(
            hex::encode(&sealed),
            "daac4a55fca748f32ffaf49e2b41ab86f354db96"
        );
    }

    struct GoldenTest {
        /// root extended private key of the wallet
        xprv: &'static str,
        /// the payload key derived from its public part
        key: &'static str,
        /// the sealed attribute
        payload: &'static str,
        /// the path inside
        path: &'static [u32],
    }

    const GOLDEN_TESTS: &'static [GoldenTest] = &[
        GoldenTest {
            xprv: "200f5a406b71d084b5c79ec052f677bd50171f5fdbc65e2712a6aeba8bb1f352\
                   caafabf1d9d065e5143c5472d6014928198eef16ef92425279ce1678182d7e42\
                   d06c72c8dfdb3c624b76023868e644d7e51ff188a547b0e7bd7db3d3a342bad2",
            key: "600348f1611a35266e6b95698bfacb7d49980cc39e36544563efea7ab1b33bc8",
            payload: "331cd6c3025d59a16a5f829ed7f24cf874f3ab50",
            path: &[0, 0],
        },
        GoldenTest {
            xprv: "200f5a406b71d084b5c79ec052f677bd50171f5fdbc65e2712a6aeba8bb1f352\
                   caafabf1d9d065e5143c5472d6014928198eef16ef92425279ce1678182d7e42\
                   d06c72c8dfdb3c624b76023868e644d7e51ff188a547b0e7bd7db3d3a342bad2",
            key: "600348f1611a35266e6b95698bfacb7d49980cc39e36544563efea7ab1b33bc8",
            payload: "3306563c02d02f381e78df8404c3505676d55e457193e74a34b690ec",
            path: &[0x80000000, 0x80000000],
        },
    ];

    fn run_golden_test(golden: &GoldenTest) {
        let xprv = XPrv::from_slice(&hex::decode(golden.xprv).unwrap()).unwrap();
        let key = PayloadKey::from_slice(&hex::decode(golden.key).unwrap()).unwrap();
        let payload = Payload::from_vec(hex::decode(golden.payload).unwrap());
        let path = Path::new(golden.path.to_vec());

        assert_eq!(key, PayloadKey::new(&xprv.public()));
        assert_eq!(payload, key.encrypt_path(&path));
        assert_eq!(path, key.decrypt_path(&payload).unwrap());
    }

    #[test]
    fn golden_tests() {
        for golden in GOLDEN_TESTS {
            run_golden_test(golden)
        }
    }
}
