//! BIP39 mnemonics
//!
//! The human readable backup of a wallet: entropy is spelled out as a
//! phrase of dictionary words carrying 11 bits each, with a checksum
//! drawn from the SHA-256 of the entropy folded into the last word.
//!
//! See [Bitcoin Improvement Proposal 39](https://github.com/bitcoin/bips/blob/master/bip-0039.mediawiki)
//! for the full construction.
//!
//! # Example
//!
//! Generating a wallet:
//!
//! ```
//! extern crate meridian;
//! extern crate rand;
//!
//! use meridian::bip::bip39::*;
//!
//! // the entropy is the wallet: keep it, or keep the phrase
//! let entropy = Entropy::generate(Type::Type18Words, rand::random);
//!
//! let phrase = entropy.to_mnemonics().to_string(&dictionary::ENGLISH);
//! let seed = Seed::from_mnemonic_string(&phrase, b"some password");
//! ```
//!
//! Recovering one:
//!
//! ```
//! use meridian::bip::bip39::*;
//!
//! let mnemonics = "mimic left ask vacant toast follow bitter join diamond gate attend obey";
//!
//! let phrase = MnemonicString::new(&dictionary::ENGLISH, mnemonics.to_owned())
//!     .expect("the given mnemonics are valid English words");
//! let seed = Seed::from_mnemonic_string(&phrase, b"some password");
//! ```

use crate::util::{
    bits::{BitReaderBy11, BitWriterBy11},
    hex, securemem,
};
use cryptoxide::digest::Digest;
use cryptoxide::hmac::Hmac;
use cryptoxide::pbkdf2::pbkdf2;
use cryptoxide::sha2::{Sha256, Sha512};
use std::{error, fmt, ops::Deref, result, str};

/// Error regarding BIP39 operations
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// a phrase was given with a number of words outside of
    /// {12, 15, 18, 21, 24}
    WrongNumberOfWords(usize),

    /// entropy was given with a bit size matching none of the
    /// supported phrase lengths
    WrongKeySize(usize),

    /// a raw mnemonic index does not fit the 11 bits of a word
    MnemonicOutOfBound(u16),

    /// a word of the phrase is not part of the dictionary
    LanguageError(dictionary::Error),

    /// a seed must be exactly `SEED_SIZE` bytes
    InvalidSeedSize(usize),

    /// the phrase carries a checksum (first parameter) that does not
    /// match the one recomputed from its entropy (second parameter):
    /// some words were mistyped, misordered or swapped
    InvalidChecksum(u8, u8),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidSeedSize(sz) => {
                write!(f, "seed of {} bytes where {} are expected", sz, SEED_SIZE)
            }
            Error::WrongNumberOfWords(count) => {
                write!(f, "phrases of {} words are not supported", count)
            }
            Error::WrongKeySize(sz) => write!(f, "entropy of {} bits is not supported", sz),
            Error::MnemonicOutOfBound(index) => {
                write!(f, "mnemonic index {} is beyond the dictionary", index)
            }
            Error::LanguageError(_) => write!(f, "unknown mnemonic word"),
            Error::InvalidChecksum(found, computed) => write!(
                f,
                "checksum {:08b} does not match the recomputed {:08b}",
                found, computed
            ),
        }
    }
}
impl From<dictionary::Error> for Error {
    fn from(e: dictionary::Error) -> Self {
        Error::LanguageError(e)
    }
}
impl error::Error for Error {
    fn cause(&self) -> Option<&dyn error::Error> {
        match self {
            Error::LanguageError(ref error) => Some(error),
            _ => None,
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// the supported phrase lengths
///
/// | number of words | entropy size (bits) | checksum size (bits) |
/// | --------------- | ------------------- | -------------------- |
/// | 12              | 128                 | 4                    |
/// | 15              | 160                 | 5                    |
/// | 18              | 192                 | 6                    |
/// | 21              | 224                 | 7                    |
/// | 24              | 256                 | 8                    |
///
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[cfg_attr(feature = "generic-serialization", derive(Serialize, Deserialize))]
pub enum Type {
    Type12Words,
    Type15Words,
    Type18Words,
    Type21Words,
    Type24Words,
}
impl Type {
    pub fn from_word_count(count: usize) -> Result<Self> {
        match count {
            12 => Ok(Type::Type12Words),
            15 => Ok(Type::Type15Words),
            18 => Ok(Type::Type18Words),
            21 => Ok(Type::Type21Words),
            24 => Ok(Type::Type24Words),
            _ => Err(Error::WrongNumberOfWords(count)),
        }
    }

    pub fn from_entropy_size(bits: usize) -> Result<Self> {
        match bits {
            128 => Ok(Type::Type12Words),
            160 => Ok(Type::Type15Words),
            192 => Ok(Type::Type18Words),
            224 => Ok(Type::Type21Words),
            256 => Ok(Type::Type24Words),
            _ => Err(Error::WrongKeySize(bits)),
        }
    }

    pub fn mnemonic_count(&self) -> usize {
        match self {
            Type::Type12Words => 12,
            Type::Type15Words => 15,
            Type::Type18Words => 18,
            Type::Type21Words => 21,
            Type::Type24Words => 24,
        }
    }

    /// the entropy bytes behind a phrase of this length
    pub fn entropy_size(&self) -> usize {
        // 32 entropy bits per 3 words
        self.mnemonic_count() * 32 / 3 / 8
    }

    /// the bits of checksum folded into the phrase, one per 32 entropy
    /// bits
    pub fn checksum_size_bits(&self) -> usize {
        self.entropy_size() / 4
    }
}
impl Default for Type {
    fn default() -> Type {
        Type::Type18Words
    }
}
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic_count())
    }
}
impl str::FromStr for Type {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.parse::<usize>() {
            Ok(count) => Type::from_word_count(count),
            Err(_) => Err(Error::WrongNumberOfWords(0)),
        }
    }
}

const MAX_ENTROPY_SIZE: usize = 32;

/// the random material a wallet is built from
///
/// It always comes in one of the sizes of [`Type`](./enum.Type.html)
/// and zeroes its memory when going out of scope.
#[derive(Clone)]
pub struct Entropy {
    bytes: [u8; MAX_ENTROPY_SIZE],
    t: Type,
}
impl Entropy {
    /// wrap the given bytes, whose length must match one of the
    /// supported entropy sizes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let t = Type::from_entropy_size(bytes.len() * 8)?;
        let mut entropy = Entropy {
            bytes: [0; MAX_ENTROPY_SIZE],
            t,
        };
        entropy.bytes[..bytes.len()].copy_from_slice(bytes);
        Ok(entropy)
    }

    /// draw fresh entropy of the given type, one byte per call to the
    /// given generator
    ///
    /// # Example
    ///
    /// ```
    /// extern crate rand;
    /// # extern crate meridian;
    /// # use meridian::bip::bip39::*;
    ///
    /// let entropy = Entropy::generate(Type::Type15Words, rand::random);
    /// ```
    pub fn generate<G>(t: Type, gen: G) -> Self
    where
        G: Fn() -> u8,
    {
        let mut entropy = Entropy {
            bytes: [0; MAX_ENTROPY_SIZE],
            t,
        };
        for byte in entropy.bytes[..t.entropy_size()].iter_mut() {
            *byte = gen();
        }
        entropy
    }

    #[inline]
    pub fn get_type(&self) -> Type {
        self.t
    }

    /// the checksum of the entropy: the top `checksum_size_bits` bits
    /// of the first byte of its SHA-256, right aligned
    pub fn checksum(&self) -> u8 {
        let mut sha = Sha256::new();
        let mut digest = [0u8; 32];
        sha.input(self.as_ref());
        sha.result(&mut digest);
        digest[0] >> (8 - self.t.checksum_size_bits())
    }

    /// recover the entropy from a validated phrase
    ///
    /// # Example
    ///
    /// ```
    /// # use meridian::bip::bip39::*;
    ///
    /// const MNEMONICS : &'static str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    /// let mnemonics = Mnemonics::from_string(&dictionary::ENGLISH, MNEMONICS)
    ///     .expect("validating the given mnemonics phrase");
    ///
    /// let entropy = Entropy::from_mnemonics(&mnemonics)
    ///     .expect("retrieving the entropy from the mnemonics");
    /// ```
    ///
    /// # Error
    ///
    /// fails with `InvalidChecksum` when the phrase encodes an entropy
    /// whose checksum does not match the one spelled in its last word,
    /// i.e. the user mistyped the phrase.
    pub fn from_mnemonics(mnemonics: &Mnemonics) -> Result<Self> {
        let t = mnemonics.get_type();

        let mut packed = BitWriterBy11::new();
        for index in mnemonics.iter() {
            packed.write(index.0);
        }
        let packed = packed.to_bytes();

        let entropy = Self::from_slice(&packed[..t.entropy_size()])?;

        let found = packed[t.entropy_size()] >> (8 - t.checksum_size_bits());
        let computed = entropy.checksum();
        if found != computed {
            return Err(Error::InvalidChecksum(found, computed));
        }

        Ok(entropy)
    }

    /// spell the entropy out as a phrase
    pub fn to_mnemonics(&self) -> Mnemonics {
        let t = self.get_type();
        let mut with_checksum = Vec::with_capacity(self.as_ref().len() + 1);
        with_checksum.extend_from_slice(self.as_ref());
        with_checksum.push(self.checksum() << (8 - t.checksum_size_bits()));

        let mut reader = BitReaderBy11::new(&with_checksum);
        let words = (0..t.mnemonic_count())
            // an 11 bit group can only hold a valid mnemonic index
            .map(|_| MnemonicIndex(reader.read()))
            .collect();

        // the number of words is correct by construction
        Mnemonics::from_mnemonics(words).unwrap()
    }
}
impl PartialEq for Entropy {
    fn eq(&self, other: &Self) -> bool {
        self.t == other.t && self.as_ref() == other.as_ref()
    }
}
impl Eq for Entropy {}
impl fmt::Display for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_ref()))
    }
}
impl fmt::Debug for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_ref()))
    }
}
impl AsRef<[u8]> for Entropy {
    fn as_ref(&self) -> &[u8] {
        &self.bytes[..self.t.entropy_size()]
    }
}
impl Drop for Entropy {
    fn drop(&mut self) {
        securemem::zero(&mut self.bytes);
    }
}

/// the expected size of a seed, in bytes.
pub const SEED_SIZE: usize = 64;

/// the seed stretched out of a mnemonic phrase and a password, the
/// input of the wallet root key generation
pub struct Seed([u8; SEED_SIZE]);
impl Seed {
    /// create a Seed by taking ownership of the given array
    pub fn from_bytes(buf: [u8; SEED_SIZE]) -> Self {
        Seed(buf)
    }

    /// create a Seed by copying the given slice into a new array
    pub fn from_slice(buf: &[u8]) -> Result<Self> {
        if buf.len() != SEED_SIZE {
            return Err(Error::InvalidSeedSize(buf.len()));
        }
        let mut bytes = [0u8; SEED_SIZE];
        bytes.copy_from_slice(buf);
        Ok(Seed(bytes))
    }

    /// stretch the phrase and password into a seed
    ///
    /// Note the seed derives from the phrase string, not from the
    /// entropy: translating a phrase to another dictionary preserves
    /// the entropy yet changes the seed.
    ///
    /// # Example
    ///
    /// ```
    /// # use meridian::bip::bip39::*;
    ///
    /// const MNEMONICS : &'static str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
    /// let mnemonics = MnemonicString::new(&dictionary::ENGLISH, MNEMONICS.to_owned())
    ///     .expect("valid Mnemonic phrase");
    ///
    /// let seed = Seed::from_mnemonic_string(&mnemonics, b"Bourbaki team rocks!");
    /// ```
    pub fn from_mnemonic_string(mnemonics: &MnemonicString, password: &[u8]) -> Self {
        let mut salt = Vec::with_capacity(8 + password.len());
        salt.extend_from_slice(b"mnemonic");
        salt.extend_from_slice(password);

        let mut mac = Hmac::new(Sha512::new(), mnemonics.0.as_bytes());
        let mut out = [0; SEED_SIZE];
        pbkdf2(&mut mac, &salt, 2048, &mut out);
        Seed(out)
    }
}
impl PartialEq for Seed {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_ref() == other.0.as_ref()
    }
}
impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_ref()))
    }
}
impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_ref()))
    }
}
impl AsRef<[u8]> for Seed {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
impl Drop for Seed {
    fn drop(&mut self) {
        securemem::zero(&mut self.0);
    }
}

/// a phrase whose words have all been found in a dictionary
///
/// Only the seed derivation consumes this type: everything else goes
/// through the dictionary independent [`Mnemonics`](./struct.Mnemonics.html).
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
#[cfg_attr(feature = "generic-serialization", derive(Serialize, Deserialize))]
pub struct MnemonicString(String);
impl MnemonicString {
    /// validate the given phrase against the dictionary and wrap it
    ///
    /// # Error
    ///
    /// fails if any word is not part of the given
    /// [`Language`](./dictionary/trait.Language.html).
    pub fn new<D>(dic: &D, s: String) -> Result<Self>
    where
        D: dictionary::Language,
    {
        let _ = Mnemonics::from_string(dic, &s)?;
        Ok(MnemonicString(s))
    }
}
impl Deref for MnemonicString {
    type Target = str;
    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}
impl fmt::Display for MnemonicString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// the maximum authorized value for a mnemonic. i.e. 2047
pub const MAX_MNEMONIC_VALUE: u16 = 2047;

/// a word of a phrase, as its position in the dictionary
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
pub struct MnemonicIndex(pub u16);

impl MnemonicIndex {
    /// wrap the given value, checking it can name a dictionary word
    ///
    /// # Example
    ///
    /// ```
    /// # use meridian::bip::bip39::*;
    /// #
    /// assert!(MnemonicIndex::new(1029).is_ok());
    /// assert_eq!(MnemonicIndex::new(4029), Err(Error::MnemonicOutOfBound(4029)));
    /// ```
    pub fn new(m: u16) -> Result<Self> {
        if m <= MAX_MNEMONIC_VALUE {
            Ok(MnemonicIndex(m))
        } else {
            Err(Error::MnemonicOutOfBound(m))
        }
    }

    /// the dictionary word this index names
    pub fn to_word<D>(self, dic: &D) -> String
    where
        D: dictionary::Language,
    {
        // every index below the bound has a word
        dic.lookup_word(self).unwrap()
    }

    /// the index of the given word in the dictionary
    pub fn from_word<D>(dic: &D, word: &str) -> Result<Self>
    where
        D: dictionary::Language,
    {
        Ok(dic.lookup_mnemonic(word)?)
    }
}

/// a phrase in its dictionary independent form, a sequence of word
/// indices
///
/// This is the hinge between dictionaries: the same `Mnemonics` spells
/// different strings (and thus different seeds) in different languages
/// while encoding the same [`Entropy`](./struct.Entropy.html).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Mnemonics(Vec<MnemonicIndex>);

impl AsRef<[MnemonicIndex]> for Mnemonics {
    fn as_ref(&self) -> &[MnemonicIndex] {
        &self.0[..]
    }
}

impl Mnemonics {
    pub fn get_type(&self) -> Type {
        // the length was checked on construction
        Type::from_word_count(self.0.len()).unwrap()
    }

    pub fn iter(&self) -> ::std::slice::Iter<MnemonicIndex> {
        self.0.iter()
    }

    /// spell the phrase in the given
    /// [`Language`](./dictionary/trait.Language.html).
    pub fn to_string<D>(&self, dic: &D) -> MnemonicString
    where
        D: dictionary::Language,
    {
        let words: Vec<String> = self.0.iter().map(|m| m.to_word(dic)).collect();
        MnemonicString(words.join(dic.separator()))
    }

    /// look every word of the string up and build the phrase
    ///
    /// Words are matched case insensitively.
    ///
    /// # Error
    ///
    /// fails if a word is not part of the given
    /// [`Language`](./dictionary/trait.Language.html), or if the word
    /// count is unsupported.
    pub fn from_string<D>(dic: &D, mnemonics: &str) -> Result<Self>
    where
        D: dictionary::Language,
    {
        let words: Result<Vec<MnemonicIndex>> = mnemonics
            .split(dic.separator())
            .map(|word| MnemonicIndex::from_word(dic, word))
            .collect();
        Mnemonics::from_mnemonics(words?)
    }

    /// wrap the given indices, checking the count is a supported
    /// phrase length
    pub fn from_mnemonics(mnemonics: Vec<MnemonicIndex>) -> Result<Self> {
        let _ = Type::from_word_count(mnemonics.len())?;
        Ok(Mnemonics(mnemonics))
    }
}

pub mod dictionary {
    //! the dictionaries words are looked up in
    //!
    //! The shipped dictionary is the standard English one; the trait is
    //! public so callers can plug other word lists. Inputs are expected
    //! in UTF-8 NFKD, which for English is plain ASCII.

    use std::{error, fmt, result};

    use super::MnemonicIndex;

    /// Errors associated to a given language/dictionary
    #[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
    pub enum Error {
        /// this means the given word is not in the Dictionary of the Language.
        MnemonicWordNotFoundInDictionary(String),
    }
    impl fmt::Display for Error {
        fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
            match self {
                &Error::MnemonicWordNotFoundInDictionary(ref s) => {
                    write!(f, "Mnemonic word not found in dictionary \"{}\"", s)
                }
            }
        }
    }
    impl error::Error for Error {}

    pub type Result<T> = result::Result<T, Error>;

    /// a language and its dictionary of mnemonic words
    pub trait Language {
        fn name(&self) -> &'static str;
        fn separator(&self) -> &'static str;
        fn lookup_mnemonic(&self, word: &str) -> Result<MnemonicIndex>;
        fn lookup_word(&self, mnemonic: MnemonicIndex) -> Result<String>;
    }

    /// a dictionary backed by a sorted array of 2048 words, the shape
    /// the standard word lists come in
    pub struct DefaultDictionary {
        pub words: [&'static str; 2048],
        pub name: &'static str,
    }
    impl Language for DefaultDictionary {
        fn name(&self) -> &'static str {
            self.name
        }
        fn separator(&self) -> &'static str {
            " "
        }
        fn lookup_mnemonic(&self, word: &str) -> Result<MnemonicIndex> {
            let word = word.to_lowercase();
            match self.words.binary_search(&word.as_str()) {
                // the position of a word in a 2048 entry array always
                // fits a mnemonic index
                Ok(index) => Ok(MnemonicIndex::new(index as u16).unwrap()),
                Err(_) => Err(Error::MnemonicWordNotFoundInDictionary(word)),
            }
        }
        fn lookup_word(&self, mnemonic: MnemonicIndex) -> Result<String> {
            Ok(self.words[mnemonic.0 as usize].to_string())
        }
    }

    /// the English dictionary of the
    /// [BIP39 standard](https://github.com/bitcoin/bips/blob/master/bip-0039/bip-0039-wordlists.md#wordlists)
    pub const ENGLISH: DefaultDictionary = DefaultDictionary {
        words: include!("bip39_english.txt"),
        name: "english",
    };
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::random;

    extern crate unicode_normalization;
    use self::unicode_normalization::UnicodeNormalization;

    use crate::bip::bip39::dictionary::Language;

    #[test]
    fn sizes() {
        assert_eq!(Type::Type12Words.entropy_size(), 16);
        assert_eq!(Type::Type12Words.checksum_size_bits(), 4);
        assert_eq!(Type::Type24Words.entropy_size(), 32);
        assert_eq!(Type::Type24Words.checksum_size_bits(), 8);
        assert!(Type::from_word_count(9).is_err());
        assert!(Type::from_entropy_size(96).is_err());
    }

    #[test]
    fn english_dic() {
        let dic = &dictionary::ENGLISH;

        assert_eq!(dic.lookup_mnemonic("abandon"), Ok(MnemonicIndex(0)));
        assert_eq!(dic.lookup_mnemonic("crack"), Ok(MnemonicIndex(398)));
        assert_eq!(dic.lookup_mnemonic("shell"), Ok(MnemonicIndex(1579)));
        assert_eq!(dic.lookup_mnemonic("zoo"), Ok(MnemonicIndex(2047)));

        assert_eq!(dic.lookup_word(MnemonicIndex(0)), Ok("abandon".to_string()));
        assert_eq!(dic.lookup_word(MnemonicIndex(398)), Ok("crack".to_string()));
        assert_eq!(dic.lookup_word(MnemonicIndex(1579)), Ok("shell".to_string()));
        assert_eq!(dic.lookup_word(MnemonicIndex(2047)), Ok("zoo".to_string()));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let dic = &dictionary::ENGLISH;

        assert_eq!(dic.lookup_mnemonic("Abandon"), Ok(MnemonicIndex(0)));
        assert_eq!(dic.lookup_mnemonic("ZOO"), Ok(MnemonicIndex(2047)));
    }

    #[test]
    fn unknown_word_is_rejected() {
        let dic = &dictionary::ENGLISH;

        assert_eq!(
            dic.lookup_mnemonic("blockchain"),
            Err(dictionary::Error::MnemonicWordNotFoundInDictionary(
                "blockchain".to_string()
            ))
        );
    }

    #[test]
    fn wrong_word_count_is_rejected() {
        let r = Mnemonics::from_string(&dictionary::ENGLISH, "abandon abandon abandon");
        assert_eq!(r, Err(Error::WrongNumberOfWords(3)));
    }

    #[test]
    fn mistyped_phrase_fails_its_checksum() {
        // the valid phrase for the all-zero entropy ends in `about`
        let phrase = "abandon abandon abandon abandon abandon abandon \
                      abandon abandon abandon abandon abandon abandon";
        let mnemonics =
            Mnemonics::from_string(&dictionary::ENGLISH, phrase).expect("all words are valid");
        match Entropy::from_mnemonics(&mnemonics) {
            Err(Error::InvalidChecksum(_, _)) => (),
            r => panic!("expected an invalid checksum, got {:?}", r),
        }
    }

    #[test]
    fn entropy_of_every_size_round_trips() {
        for t in [
            Type::Type12Words,
            Type::Type15Words,
            Type::Type18Words,
            Type::Type21Words,
            Type::Type24Words,
        ]
        .iter()
        {
            let entropy = Entropy::generate(*t, random);
            let recovered = Entropy::from_mnemonics(&entropy.to_mnemonics()).unwrap();
            assert_eq!(entropy, recovered);
        }
    }

    quickcheck! {
        fn prop_mnemonic_roundtrip(bytes: Vec<u8>) -> bool {
            let mut buf = [0u8; 20];
            for (slot, byte) in buf.iter_mut().zip(bytes.iter()) {
                *slot = *byte;
            }
            let entropy = Entropy::from_slice(&buf).unwrap();
            let recovered = Entropy::from_mnemonics(&entropy.to_mnemonics()).unwrap();
            entropy == recovered
        }
    }

    #[derive(Debug)]
    struct TestVector {
        entropy: &'static str,
        mnemonics: &'static str,
        seed: &'static str,
        passphrase: &'static str,
    }

    fn run_vector(test: &TestVector) {
        // decompose the UTF8 inputs before processing:
        let mnemonics: String = test.mnemonics.nfkd().collect();
        let passphrase: String = test.passphrase.nfkd().collect();

        let dic = &dictionary::ENGLISH;

        let phrase = Mnemonics::from_string(dic, &mnemonics).expect("valid mnemonics");
        let phrase_str = MnemonicString::new(dic, mnemonics).expect("valid mnemonics string");
        let entropy = Entropy::from_slice(&hex::decode(test.entropy).unwrap())
            .expect("decode entropy from hex");

        assert_eq!(phrase.get_type(), entropy.get_type());
        assert_eq!(entropy.to_mnemonics(), phrase);
        assert_eq!(
            entropy,
            Entropy::from_mnemonics(&phrase).expect("retrieve entropy from mnemonics")
        );

        let seed = Seed::from_mnemonic_string(&phrase_str, passphrase.as_bytes());
        assert_eq!(test.seed, hex::encode(seed.as_ref()));
    }

    #[test]
    fn test_vectors_english() {
        for test in TEST_VECTORS {
            run_vector(test);
        }
    }

    const TEST_VECTORS: &'static [TestVector] = &[
        TestVector {
            entropy: "00000000000000000000000000000000",
            mnemonics: "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
            seed: "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04",
            passphrase: "TREZOR",
        },
        TestVector {
            entropy: "7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f7f",
            mnemonics: "legal winner thank year wave sausage worth useful legal winner thank yellow",
            seed: "2e8905819b8723fe2c1d161860e5ee1830318dbf49a83bd451cfb8440c28bd6fa457fe1296106559a3c80937a1c1069be3a3a5bd381ee6260e8d9739fce1f607",
            passphrase: "TREZOR",
        },
        TestVector {
            entropy: "80808080808080808080808080808080",
            mnemonics: "letter advice cage absurd amount doctor acoustic avoid letter advice cage above",
            seed: "d71de856f81a8acc65e6fc851a38d4d7ec216fd0796d0a6827a3ad6ed5511a30fa280f12eb2e47ed2ac03b5c462a0358d18d69fe4f985ec81778c1b370b652a8",
            passphrase: "TREZOR",
        },
        TestVector {
            entropy: "ffffffffffffffffffffffffffffffff",
            mnemonics: "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong",
            seed: "ac27495480225222079d7be181583751e86f571027b0497b5b5d11218e0a8a13332572917f0f8e5a589620c6f15b11c61dee327651a14c34e18231052e48c069",
            passphrase: "TREZOR",
        },
        TestVector {
            entropy: "9e885d952ad362caeb4efe34a8e91bd2",
            mnemonics: "ozone drill grab fiber curtain grace pudding thank cruise elder eight picnic",
            seed: "274ddc525802f7c828d8ef7ddbcdc5304e87ac3535913611fbbfa986d0c9e5476c91689f9c8a54fd55bd38606aa6a8595ad213d4c9c9f9aca3fb217069a41028",
            passphrase: "TREZOR",
        },
        TestVector {
            entropy: "23db8160a31d3e0dca3688ed941adbf3",
            mnemonics: "cat swing flag economy stadium alone churn speed unique patch report train",
            seed: "deb5f45449e615feff5640f2e49f933ff51895de3b4381832b3139941c57b59205a42480c52175b6efcffaa58a2503887c1e8b363a707256bdd2b587b46541f5",
            passphrase: "TREZOR",
        },
        TestVector {
            entropy: "f585c11aec520db57dd353c69554b21a89b20fb0650966fa0a9d6f74fd989d8f",
            mnemonics: "void come effort suffer camp survey warrior heavy shoot primary clutch crush open amazing screen patrol group space point ten exist slush involve unfold",
            seed: "01f5bced59dec48e362f2c45b5de68b9fd6c92c6634f44d6d40aab69056506f0e35524a518034ddc1192e1dacd32c1ed3eaa3c3b131c88ed8e7e54c49a5d0998",
            passphrase: "TREZOR",
        },
    ];
}
