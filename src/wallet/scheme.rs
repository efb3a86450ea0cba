//! the interfaces a wallet model exposes
//!
//! A wallet holds accounts, an account mints addresses, and the wallet
//! signs the transactions spending from them. How keys are organized
//! behind those three operations is the wallet scheme's business, which
//! is what these traits abstract over.

use crate::address::ExtendedAddr;
use crate::config::{NetworkMagic, ProtocolMagic};
use crate::tx::{TxId, TxInWitness};

pub trait Wallet {
    /// the account type of this scheme, see
    /// [`Account`](./trait.Account.html)
    type Account: Account;

    /// how the scheme stores its created accounts
    type Accounts;

    /// how the scheme points at one of its keys, i.e. what it needs to
    /// know to re-derive the key of an address
    type Addressing: Clone;

    /// create (and remember) an account; the alias is a lookup helper
    /// and never takes part in any derivation
    fn create_account(&mut self, alias: &str, id: u32) -> Self::Account;

    /// every account created so far
    fn list_accounts<'a>(&'a self) -> &'a Self::Accounts;

    /// one witness per addressing, in the iterator's order, over the
    /// given transaction id
    fn sign_tx<I>(
        &self,
        protocol_magic: ProtocolMagic,
        txid: &TxId,
        addresses: I,
    ) -> Vec<TxInWitness>
    where
        I: Iterator<Item = Self::Addressing>;
}

pub trait Account {
    /// how the account points at one of its addresses
    type Addressing;

    /// the addresses at the given coordinates
    fn generate_addresses<'a, I>(
        &'a self,
        addresses: I,
        network_magic: NetworkMagic,
    ) -> Vec<ExtendedAddr>
    where
        I: Iterator<Item = &'a Self::Addressing>;
}
