//! base58 rendering of the binary address envelope
//!
//! The alphabet is the common bitcoin one: the visually ambiguous
//! `0`, `O`, `I` and `l` are left out. A leading zero byte maps to a
//! leading `1` in the text and back.
//!
//! # Example
//!
//! ```
//! use meridian::util::base58;
//!
//! let encoded = r"TcgsE5dzphUWfjcb9i5";
//! let decoded = b"Hello World...";
//!
//! assert_eq!(decoded, base58::decode(encoded).unwrap().as_slice());
//! assert_eq!(encoded, base58::encode(decoded));
//! ```

pub const ALPHABET: &'static str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const BASE: u32 = 58;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Copy, Clone)]
#[cfg_attr(feature = "generic-serialization", derive(Serialize, Deserialize))]
pub enum Error {
    /// the character at the carried index is not part of `ALPHABET`
    UnknownSymbol(usize),
}
impl ::std::fmt::Display for Error {
    fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
        match self {
            &Error::UnknownSymbol(idx) => write!(f, "Unknown symbol at byte index {}", idx),
        }
    }
}
impl ::std::error::Error for Error {}

pub type Result<T> = ::std::result::Result<T, Error>;

/// encode the given bytes in base58
pub fn encode(input: &[u8]) -> String {
    let zeroes = input.iter().take_while(|b| **b == 0).count();

    // base58 digits of the remaining big-endian number, least
    // significant first
    let mut digits: Vec<u8> = Vec::with_capacity(input.len() * 2);
    for byte in input[zeroes..].iter() {
        let mut carry = *byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % BASE) as u8;
            carry /= BASE;
        }
        while carry > 0 {
            digits.push((carry % BASE) as u8);
            carry /= BASE;
        }
    }

    let alphabet = ALPHABET.as_bytes();
    let mut out = String::with_capacity(zeroes + digits.len());
    for _ in 0..zeroes {
        out.push(alphabet[0] as char);
    }
    for digit in digits.iter().rev() {
        out.push(alphabet[*digit as usize] as char);
    }
    out
}

/// decode the given base58 string
pub fn decode(input: &str) -> Result<Vec<u8>> {
    let symbols = input.as_bytes();
    let alphabet = ALPHABET.as_bytes();
    let ones = symbols.iter().take_while(|c| **c == alphabet[0]).count();

    // bytes of the decoded big-endian number, least significant first
    let mut number: Vec<u8> = Vec::with_capacity(input.len());
    for (idx, symbol) in symbols.iter().enumerate().skip(ones) {
        let value = match alphabet.iter().position(|c| c == symbol) {
            Some(v) => v as u32,
            None => return Err(Error::UnknownSymbol(idx)),
        };
        let mut carry = value;
        for byte in number.iter_mut() {
            carry += *byte as u32 * BASE;
            *byte = carry as u8;
            carry >>= 8;
        }
        while carry > 0 {
            number.push(carry as u8);
            carry >>= 8;
        }
    }

    let mut out = vec![0u8; ones];
    out.extend(number.iter().rev());
    Ok(out)
}

#[cfg(test)]
mod tests {
    fn encode(input: &[u8], expected: &str) {
        assert_eq!(super::encode(input), expected);
    }
    fn decode(expected: &[u8], input: &str) {
        assert_eq!(super::decode(input).unwrap().as_slice(), expected);
    }

    #[test]
    fn leading_zeroes() {
        encode(b"\0\0\0\0", "1111");
        decode(b"\0\0\0\0", "1111");
        encode(b"\0abc", "1ZiCa");
        decode(b"\0abc", "1ZiCa");
        encode(b"\0\0abc", "11ZiCa");
        decode(b"\0\0abc", "11ZiCa");
    }

    #[test]
    fn text() {
        encode(b"This is awesome!", "BRY7dK2V98Sgi7CFWiZbap");
        decode(b"This is awesome!", "BRY7dK2V98Sgi7CFWiZbap");
        encode(b"Hello World...", "TcgsE5dzphUWfjcb9i5");
        decode(b"Hello World...", "TcgsE5dzphUWfjcb9i5");
        encode(
            b"abcdefghijklmnopqrstuvwxyz",
            "3yxU3u1igY8WkgtjK92fbJQCd4BZiiT1v25f",
        );
        decode(
            b"abcdefghijklmnopqrstuvwxyz",
            "3yxU3u1igY8WkgtjK92fbJQCd4BZiiT1v25f",
        );
    }

    #[test]
    fn empty() {
        encode(b"", "");
        decode(b"", "");
    }

    #[test]
    fn rejects_ambiguous_characters() {
        assert_eq!(super::decode("2O"), Err(super::Error::UnknownSymbol(1)));
    }

    quickcheck! {
        fn round_trip(bytes: Vec<u8>) -> bool {
            super::decode(&super::encode(&bytes)).unwrap() == bytes
        }
    }
}
