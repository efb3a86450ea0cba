//! the linear fee policy
//!
//! A transaction pays `constant + coefficient * size` where the size is
//! the byte length of the signed transaction. The policy constants are
//! rationals with three fractional digits, so the computation is done
//! in thousandths over integers and rounded up at the very end: two
//! implementations can never disagree by a floating point ulp.

use crate::coin::{self, Coin};
use crate::tx::{txaux_serialize_size, Tx, TxAux, TxInWitness};
use cbor_event;
use std::{
    fmt,
    ops::{Add, Mul},
    result,
};

/// a fee, either estimated or actually paid
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
#[cfg_attr(feature = "generic-serialization", derive(Serialize, Deserialize))]
pub struct Fee(Coin);
impl Fee {
    pub fn new(coin: Coin) -> Self {
        Fee(coin)
    }
    pub fn to_coin(&self) -> Coin {
        self.0
    }
}

#[derive(Debug)]
pub enum Error {
    Coin(coin::Error),
    Cbor(cbor_event::Error),
}

pub type Result<T> = result::Result<T, Error>;

impl From<coin::Error> for Error {
    fn from(e: coin::Error) -> Error {
        Error::Coin(e)
    }
}
impl From<cbor_event::Error> for Error {
    fn from(e: cbor_event::Error) -> Error {
        Error::Cbor(e)
    }
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Cbor(_) => write!(f, "fee cannot be computed over an unencodable transaction"),
            Error::Coin(_) => write!(f, "fee does not fit a coin value"),
        }
    }
}
impl ::std::error::Error for Error {
    fn cause(&self) -> Option<&(dyn ::std::error::Error)> {
        match self {
            Error::Cbor(ref err) => Some(err),
            Error::Coin(ref err) => Some(err),
        }
    }
}

/// a non-negative decimal with three fractional digits, stored as a
/// count of thousandths
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
#[cfg_attr(feature = "generic-serialization", derive(Serialize, Deserialize))]
pub struct Milli(u64);
impl Milli {
    /// build from the integral and fractional parts, the fractional
    /// part is given in thousandths
    pub fn new(integral: u64, thousandths: u64) -> Self {
        Milli(integral * 1000 + thousandths % 1000)
    }
    pub fn integral(integral: u64) -> Self {
        Milli(integral * 1000)
    }
    /// round up to the next integer, the payer's rounding
    pub fn ceil(self) -> u64 {
        (self.0 + 999) / 1000
    }
    pub fn as_millis(self) -> u64 {
        self.0
    }
}
impl Add for Milli {
    type Output = Milli;
    fn add(self, other: Self) -> Self {
        Milli(self.0 + other.0)
    }
}
impl Mul for Milli {
    type Output = Milli;
    fn mul(self, other: Self) -> Self {
        // widen so size * coefficient cannot wrap, the result is
        // truncated back to thousandths
        Milli((self.0 as u128 * other.0 as u128 / 1000) as u64)
    }
}

/// the affine policy `constant + coefficient * bytes(txaux)`
#[derive(PartialEq, Eq, PartialOrd, Debug, Clone, Copy)]
#[cfg_attr(feature = "generic-serialization", derive(Serialize, Deserialize))]
pub struct LinearFee {
    /// the minimal fee, paid by an hypothetical empty transaction
    pub constant: Milli,
    /// the price of each serialized byte
    pub coefficient: Milli,
}
impl LinearFee {
    pub fn new(constant: Milli, coefficient: Milli) -> Self {
        LinearFee {
            constant,
            coefficient,
        }
    }

    pub fn estimate(&self, sz: usize) -> Result<Fee> {
        let priced = self.constant + self.coefficient * Milli::integral(sz as u64);
        Ok(Fee(Coin::new(priced.ceil())?))
    }
}
impl Default for LinearFee {
    fn default() -> Self {
        LinearFee::new(Milli::integral(155381), Milli::new(43, 946))
    }
}

/// how a fee is derived from a transaction
pub trait FeeAlgorithm {
    fn calculate_for_txaux(&self, txaux: &TxAux) -> Result<Fee>;
    fn calculate_for_txaux_component(&self, tx: &Tx, witnesses: &Vec<TxInWitness>) -> Result<Fee>;
}

impl FeeAlgorithm for LinearFee {
    fn calculate_for_txaux(&self, txaux: &TxAux) -> Result<Fee> {
        let bytes = cbor!(txaux)?;
        self.estimate(bytes.len())
    }
    fn calculate_for_txaux_component(&self, tx: &Tx, witnesses: &Vec<TxInWitness>) -> Result<Fee> {
        self.estimate(txaux_serialize_size(tx, witnesses))
    }
}

impl<'a, F: FeeAlgorithm> FeeAlgorithm for &'a F {
    fn calculate_for_txaux(&self, txaux: &TxAux) -> Result<Fee> {
        (*self).calculate_for_txaux(txaux)
    }
    fn calculate_for_txaux_component(&self, tx: &Tx, witnesses: &Vec<TxInWitness>) -> Result<Fee> {
        (*self).calculate_for_txaux_component(tx, witnesses)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn milli_keeps_three_digits() {
        assert_eq!(Milli::new(43, 946).as_millis(), 43_946);
        assert_eq!(Milli::new(43, 1946).as_millis(), 43_946);
        assert_eq!(Milli::integral(155381).as_millis(), 155_381_000);
    }

    #[test]
    fn milli_ceil() {
        assert_eq!(Milli::new(12, 0).ceil(), 12);
        assert_eq!(Milli::new(12, 1).ceil(), 13);
        assert_eq!(Milli::new(12, 999).ceil(), 13);
    }

    #[test]
    fn milli_mul_truncates_to_thousandths() {
        // 1.5 * 1.5 = 2.25
        assert_eq!(Milli::new(1, 500) * Milli::new(1, 500), Milli::new(2, 250));
        // 0.001 * 0.1 = 0.0001, truncated away
        assert_eq!(Milli::new(0, 1) * Milli::new(0, 100), Milli::new(0, 0));
    }

    #[test]
    fn default_policy_rounds_up() {
        let policy = LinearFee::default();
        // 155381 + 43.946 * 42 = 157226.732, the payer rounds up
        let fee = policy.estimate(42).unwrap();
        assert_eq!(u64::from(fee.to_coin()), 157227);
    }

    quickcheck! {
        fn estimate_is_monotonic(a: u16, b: u16) -> bool {
            let policy = LinearFee::default();
            let (small, large) = (a.min(b) as usize, a.max(b) as usize);
            policy.estimate(small).unwrap() <= policy.estimate(large).unwrap()
        }
    }
}
