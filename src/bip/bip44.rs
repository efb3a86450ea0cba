//! BIP44 addressing
//!
//! The five level derivation path of sequential wallets:
//! `purpose' / coin_type' / account' / change / index`. The first three
//! levels are hardened, the last two soft; each level gets a newtype so
//! an index can never be used at the wrong depth.
//!
//! # Example
//!
//! ```
//! # extern crate meridian;
//! use meridian::bip::bip44::{Account, Change, Addressing};
//!
//! let scheme_value = Account::new(0).unwrap()
//!     .external().unwrap()
//!     .get_scheme_value();
//!
//! assert!(scheme_value == 0);
//! ```

use crate::hdpayload::Path;
use std::{error, fmt, result};

/// the BIP44 derivation path has a specific length
pub const BIP44_PATH_LENGTH: usize = 5;
/// the BIP44 derivation path has a specific purpose
pub const BIP44_PURPOSE: u32 = 0x8000002C;
/// the BIP44 coin type is set, by default, to the protocol's registered coin
pub const BIP44_COIN_TYPE: u32 = 0x80000717;

/// the soft derivation is upper bounded
pub const BIP44_SOFT_UPPER_BOUND: u32 = 0x80000000;

/// the way a `Path` can fail to be a BIP44 one
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub enum Error {
    /// not five levels
    InvalidLength(usize),
    /// a purpose other than `BIP44_PURPOSE`
    InvalidPurpose(u32),
    /// a coin type other than `BIP44_COIN_TYPE`
    InvalidType(u32),
    /// the account level must be a valid hardened index
    AccountOutOfBound(u32),
    /// the change level must be a valid soft index
    ChangeOutOfBound(u32),
    /// the address level must be a valid soft index
    IndexOutOfBound(u32),
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidLength(given) => write!(
                f,
                "path of {} levels where {} are expected",
                given, BIP44_PATH_LENGTH
            ),
            Error::InvalidPurpose(given) => write!(
                f,
                "purpose 0x{:x} where 0x{:x} is expected",
                given, BIP44_PURPOSE
            ),
            Error::InvalidType(given) => write!(
                f,
                "coin type 0x{:x} where 0x{:x} is expected",
                given, BIP44_COIN_TYPE
            ),
            Error::AccountOutOfBound(given) => {
                write!(f, "account 0x{:x} is not a derivable account number", given)
            }
            Error::ChangeOutOfBound(given) => {
                write!(f, "change 0x{:x} is not a soft derivation index", given)
            }
            Error::IndexOutOfBound(given) => {
                write!(f, "index 0x{:x} is not a soft derivation index", given)
            }
        }
    }
}
impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;

/// the account level: the number is the caller facing value, the
/// derivation uses its hardened form
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Account(u32);
impl Account {
    pub fn new(account: u32) -> Result<Self> {
        if account >= BIP44_SOFT_UPPER_BOUND {
            return Err(Error::AccountOutOfBound(account));
        }
        Ok(Account(account))
    }

    pub fn get_account_number(&self) -> u32 {
        self.0
    }
    pub fn get_scheme_value(&self) -> u32 {
        self.0 | BIP44_SOFT_UPPER_BOUND
    }

    pub fn change(&self, typ: AddrType) -> Result<Change> {
        match typ {
            AddrType::Internal => self.internal(),
            AddrType::External => self.external(),
        }
    }

    pub fn internal(&self) -> Result<Change> {
        Change::new(*self, 1)
    }
    pub fn external(&self) -> Result<Change> {
        Change::new(*self, 0)
    }
}
impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// the address level, a soft index
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Index(u32);
impl Index {
    pub fn new(index: u32) -> Result<Self> {
        if index >= BIP44_SOFT_UPPER_BOUND {
            return Err(Error::IndexOutOfBound(index));
        }
        Ok(Index(index))
    }

    pub fn get_scheme_value(&self) -> u32 {
        self.0
    }

    pub fn incr(&self, by: u32) -> Result<Self> {
        if by >= BIP44_SOFT_UPPER_BOUND {
            return Err(Error::IndexOutOfBound(by));
        }
        Index::new(self.0 + by)
    }
}

/// the change level of an account: 0 receives, 1 keeps the change
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Change {
    account: Account,
    change: u32,
}
impl Change {
    pub fn new(account: Account, change: u32) -> Result<Self> {
        if change >= BIP44_SOFT_UPPER_BOUND {
            return Err(Error::ChangeOutOfBound(change));
        }
        Ok(Change { account, change })
    }

    pub fn get_scheme_value(&self) -> u32 {
        self.change
    }

    pub fn index(&self, index: u32) -> Result<Addressing> {
        Ok(Addressing {
            account: self.account,
            change: self.change,
            index: Index::new(index)?,
        })
    }
}

/// which of the two soft chains of an account an address belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddrType {
    Internal,
    External,
}

/// a full BIP44 coordinate below the coin type level
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Addressing {
    pub account: Account,
    pub change: u32,
    pub index: Index,
}
impl fmt::Display for Addressing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.account.0, self.change, self.index.0)
    }
}

impl Addressing {
    /// build a coordinate out of its three caller facing values
    ///
    /// # example
    ///
    /// ```
    /// use meridian::bip::bip44::{Addressing, AddrType};
    ///
    /// let addr = Addressing::new(0, AddrType::External, 0).unwrap();
    ///
    /// assert!(Addressing::new(0x80000000, AddrType::External, 0).is_err());
    /// ```
    pub fn new(account: u32, typ: AddrType, index: u32) -> Result<Self> {
        Account::new(account)?.change(typ)?.index(index)
    }

    pub fn address_type(&self) -> AddrType {
        if self.change == 0 {
            AddrType::External
        } else {
            AddrType::Internal
        }
    }

    /// the five level derivation path of this coordinate
    pub fn to_path(&self) -> Path {
        Path::new(vec![
            BIP44_PURPOSE,
            BIP44_COIN_TYPE,
            self.account.get_scheme_value(),
            self.change,
            self.index.get_scheme_value(),
        ])
    }

    /// read a coordinate back from a derivation path
    pub fn from_path(path: Path) -> Result<Self> {
        match path.as_ref() {
            &[purpose, coin_type, account, change, index] => {
                if purpose != BIP44_PURPOSE {
                    return Err(Error::InvalidPurpose(purpose));
                }
                if coin_type != BIP44_COIN_TYPE {
                    return Err(Error::InvalidType(coin_type));
                }
                if account < BIP44_SOFT_UPPER_BOUND {
                    return Err(Error::AccountOutOfBound(account));
                }
                if change > 1 {
                    return Err(Error::ChangeOutOfBound(change));
                }
                Account::new(account - BIP44_SOFT_UPPER_BOUND)?
                    .change(if change == 0 {
                        AddrType::External
                    } else {
                        AddrType::Internal
                    })?
                    .index(index)
            }
            levels => Err(Error::InvalidLength(levels.len())),
        }
    }

    /// the coordinate `by` addresses further down the same chain
    ///
    /// # Example
    ///
    /// ```
    /// use meridian::bip::bip44::{Addressing, AddrType, Index};
    ///
    /// let addr = Addressing::new(0, AddrType::External, 0).unwrap();
    ///
    /// let next = addr.incr(32).unwrap().incr(10).unwrap();
    ///
    /// assert!(next.index == Index::new(42).unwrap());
    /// assert!(next.incr(0x80000000).is_err());
    /// ```
    pub fn incr(&self, by: u32) -> Result<Self> {
        let mut next = *self;
        next.index = next.index.incr(by)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_bounds() {
        assert!(Account::new(0).is_ok());
        assert!(Account::new(0x7fffffff).is_ok());
        assert_eq!(
            Account::new(0x80000000),
            Err(Error::AccountOutOfBound(0x80000000))
        );
    }

    #[test]
    fn path_round_trip() {
        let addressing = Addressing::new(2, AddrType::Internal, 42).unwrap();
        assert_eq!(Addressing::from_path(addressing.to_path()), Ok(addressing));
    }

    #[test]
    fn foreign_paths_are_rejected() {
        let path = Path::new(vec![0x80000000, BIP44_COIN_TYPE, 0x80000000, 0, 0]);
        assert_eq!(
            Addressing::from_path(path),
            Err(Error::InvalidPurpose(0x80000000))
        );

        let path = Path::new(vec![BIP44_PURPOSE, BIP44_COIN_TYPE, 0x80000000]);
        assert_eq!(Addressing::from_path(path), Err(Error::InvalidLength(3)));
    }

    #[test]
    fn change_is_binary() {
        let path = Path::new(vec![BIP44_PURPOSE, BIP44_COIN_TYPE, 0x80000000, 2, 0]);
        assert_eq!(
            Addressing::from_path(path),
            Err(Error::ChangeOutOfBound(2))
        );
    }
}
