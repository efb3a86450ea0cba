//! the protocol's monetary value
//!
//! This represents the type value and has some properties associated
//! such as a min bound of 0 and a max bound of `MAX_COIN`.
//!

use cbor_event::{self, de::Deserializer, se::Serializer};
use std::{
    fmt,
    io::{BufRead, Write},
    ops, result,
};

/// maximum value of a Coin.
pub const MAX_COIN: u64 = 45_000_000_000__000_000;

/// error type relating to `Coin` operations
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[cfg_attr(feature = "generic-serialization", derive(Serialize, Deserialize))]
pub enum Error {
    /// means that the given value was out of bound
    ///
    /// Max bound being: `MAX_COIN`.
    OutOfBound(u64),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Error::OutOfBound(v) => write!(
                f,
                "Coin of value {} is out of bound. Max coin value: {}.",
                v, MAX_COIN
            ),
        }
    }
}
impl ::std::error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
#[cfg_attr(feature = "generic-serialization", derive(Serialize, Deserialize))]
pub struct Coin(u64);
impl Coin {
    /// create a coin of value `0`.
    pub fn zero() -> Self {
        Coin(0)
    }

    /// create a coin of the given value
    ///
    /// # Example
    ///
    /// ```
    /// use meridian::coin::Coin;
    ///
    /// let coin = Coin::new(42);
    /// let invalid = Coin::new(45000000000000001);
    ///
    /// assert!(coin.is_ok());
    /// assert!(invalid.is_err());
    /// ```
    pub fn new(v: u64) -> Result<Self> {
        if v <= MAX_COIN {
            Ok(Coin(v))
        } else {
            Err(Error::OutOfBound(v))
        }
    }

    /// compare this coin against another, keeping the sign of the
    /// difference.
    ///
    /// # Example
    ///
    /// ```
    /// use meridian::coin::{Coin, CoinDiff};
    ///
    /// let a = Coin::new(42).unwrap();
    /// let b = Coin::new(12).unwrap();
    ///
    /// assert_eq!(a.differential(b), CoinDiff::Positive(Coin::new(30).unwrap()));
    /// assert_eq!(b.differential(a), CoinDiff::Negative(Coin::new(30).unwrap()));
    /// assert_eq!(a.differential(a), CoinDiff::Zero);
    /// ```
    pub fn differential(self, against: Self) -> CoinDiff {
        if self.0 == against.0 {
            CoinDiff::Zero
        } else if self.0 > against.0 {
            CoinDiff::Positive(Coin(self.0 - against.0))
        } else {
            CoinDiff::Negative(Coin(against.0 - self.0))
        }
    }
}
impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<Coin> for u64 {
    fn from(c: Coin) -> u64 {
        c.0
    }
}
impl cbor_event::se::Serialize for Coin {
    fn serialize<'se, W: Write>(
        &self,
        serializer: &'se mut Serializer<W>,
    ) -> cbor_event::Result<&'se mut Serializer<W>> {
        serializer.write_unsigned_integer(self.0)
    }
}
impl cbor_event::de::Deserialize for Coin {
    fn deserialize<R: BufRead>(reader: &mut Deserializer<R>) -> cbor_event::Result<Self> {
        Coin::new(reader.unsigned_integer()?).map_err(|err| match err {
            Error::OutOfBound(v) => cbor_event::Error::CustomError(format!(
                "coin ({}) out of bound, max: {}",
                v, MAX_COIN
            )),
        })
    }
}
impl ops::Add for Coin {
    type Output = Result<Coin>;
    fn add(self, other: Coin) -> Self::Output {
        // the sum of two coins bounded by MAX_COIN fits in a u64
        Coin::new(self.0 + other.0)
    }
}
impl<'a> ops::Add<&'a Coin> for Coin {
    type Output = Result<Coin>;
    fn add(self, other: &'a Coin) -> Self::Output {
        Coin::new(self.0 + other.0)
    }
}
impl ops::Sub for Coin {
    type Output = Option<Coin>;
    fn sub(self, other: Coin) -> Self::Output {
        if other.0 > self.0 {
            None
        } else {
            Some(Coin(self.0 - other.0))
        }
    }
}
impl<'a> ops::Sub<&'a Coin> for Coin {
    type Output = Option<Coin>;
    fn sub(self, other: &'a Coin) -> Self::Output {
        if other.0 > self.0 {
            None
        } else {
            Some(Coin(self.0 - other.0))
        }
    }
}

/// signed difference between two coin amounts
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CoinDiff {
    /// the left-hand side is greater, by the carried amount
    Positive(Coin),
    /// both sides are equal
    Zero,
    /// the right-hand side is greater, by the carried amount
    Negative(Coin),
}

pub fn sum_coins(coins: &[Coin]) -> Result<Coin> {
    coins
        .iter()
        .fold(Coin::new(0), |acc, c| acc.and_then(|v| v + *c))
}
