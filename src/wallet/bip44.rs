//! the sequential (BIP44) wallet
//!
//! Keys hang off the root in the five level hierarchy
//! `purpose' / coin_type' / account' / change / index`; the wallet
//! caches the key at the coin type level and every account, chain and
//! address key is derived on demand below it. Address discovery is
//! sequential: a wallet scans each chain upwards from index 0.

use crate::address::ExtendedAddr;
use crate::bip::bip39;
use crate::bip::bip44::{BIP44_COIN_TYPE, BIP44_PURPOSE, BIP44_SOFT_UPPER_BOUND};
use crate::config::{NetworkMagic, ProtocolMagic};
use crate::hdwallet::{self, DerivationIndex, XPrv, XPub, XPRV_SIZE};
use crate::tx::{TxId, TxInWitness};
use crate::wallet::keygen;
use std::{collections::BTreeMap, ops::Deref};

use super::scheme;

pub use crate::bip::bip44::{self, AddrType, Addressing, Change, Index};

/// a wallet over sequential indices
///
/// See [BIP44](https://github.com/bitcoin/bips/blob/master/bip-0044.mediawiki)
/// for the addressing conventions.
pub struct Wallet {
    cached_root_key: RootLevel<XPrv>,
    accounts: BTreeMap<String, Account<XPrv>>,
}
impl Wallet {
    /// rebuild a wallet from a saved coin-type level key
    ///
    /// The key is secret material: whoever stores it must protect it.
    pub fn from_cached_key(cached_root_key: RootLevel<XPrv>) -> Self {
        Wallet {
            cached_root_key,
            accounts: BTreeMap::new(),
        }
    }

    /// build the wallet of the given root key, deriving and caching the
    /// purpose and coin type levels
    pub fn from_root_key(root_key: XPrv) -> Self {
        let coin_type_key = root_key.derive(BIP44_PURPOSE).derive(BIP44_COIN_TYPE);
        Wallet::from_cached_key(RootLevel(coin_type_key))
    }

    /// the standard construction: stretch the wallet entropy under the
    /// spending password into the root key
    pub fn from_entropy(entropy: &bip39::Entropy, password: &[u8]) -> Self {
        let mut master = [0u8; XPRV_SIZE];
        keygen::generate_seed(entropy, password, &mut master);
        Wallet::from_root_key(XPrv::normalize_bytes(master))
    }

    /// build the wallet of a standard BIP39 seed
    pub fn from_bip39_seed(seed: &bip39::Seed) -> Self {
        Wallet::from_root_key(XPrv::generate_from_bip39(seed))
    }

    /// build the wallet of a validated mnemonic phrase
    pub fn from_bip39_mnemonics(
        mnemonics_phrase: &bip39::MnemonicString,
        password: &[u8],
    ) -> Self {
        Wallet::from_bip39_seed(&bip39::Seed::from_mnemonic_string(mnemonics_phrase, password))
    }
}
impl Deref for Wallet {
    type Target = RootLevel<XPrv>;
    fn deref(&self) -> &Self::Target {
        &self.cached_root_key
    }
}
impl scheme::Wallet for Wallet {
    type Account = Account<XPrv>;
    type Accounts = BTreeMap<String, Self::Account>;
    type Addressing = Addressing;

    fn create_account(&mut self, alias: &str, id: u32) -> Self::Account {
        let account = Account {
            cached_root_key: self.cached_root_key.account(id),
        };
        self.accounts.insert(alias.to_owned(), account.clone());
        account
    }
    fn list_accounts<'a>(&'a self) -> &'a Self::Accounts {
        &self.accounts
    }
    fn sign_tx<I>(
        &self,
        protocol_magic: ProtocolMagic,
        txid: &TxId,
        addresses: I,
    ) -> Vec<TxInWitness>
    where
        I: Iterator<Item = Addressing>,
    {
        addresses
            .map(|addressing| {
                let key = self
                    .cached_root_key
                    .account(addressing.account.get_account_number())
                    .change(addressing.address_type())
                    .index(addressing.index.get_scheme_value());
                TxInWitness::new(protocol_magic, &key, txid)
            })
            .collect()
    }
}

/// an account of a wallet, over either key side
#[derive(Clone)]
pub struct Account<K> {
    cached_root_key: AccountLevel<K>,
}
impl<K> Account<K> {
    pub fn new(cached_root_key: AccountLevel<K>) -> Self {
        Account { cached_root_key }
    }
}
impl Account<XPrv> {
    /// the watch-only side of this account: it can mint addresses but
    /// cannot sign
    pub fn public(&self) -> Account<XPub> {
        Account {
            cached_root_key: self.cached_root_key.public(),
        }
    }
}
impl Deref for Account<XPrv> {
    type Target = AccountLevel<XPrv>;
    fn deref(&self) -> &Self::Target {
        &self.cached_root_key
    }
}
impl Deref for Account<XPub> {
    type Target = AccountLevel<XPub>;
    fn deref(&self) -> &Self::Target {
        &self.cached_root_key
    }
}
impl scheme::Account for Account<XPub> {
    type Addressing = (AddrType, u32);

    fn generate_addresses<'a, I>(
        &'a self,
        addresses: I,
        network_magic: NetworkMagic,
    ) -> Vec<ExtendedAddr>
    where
        I: Iterator<Item = &'a Self::Addressing>,
    {
        addresses
            .map(|&(addr_type, index)| {
                let key = self
                    .cached_root_key
                    .change(addr_type)
                    .expect("soft derivation of a chain key")
                    .index(index)
                    .expect("soft derivation of an address key");
                ExtendedAddr::new_simple(*key.deref(), network_magic)
            })
            .collect()
    }
}
impl scheme::Account for Account<XPrv> {
    type Addressing = (AddrType, u32);

    fn generate_addresses<'a, I>(
        &'a self,
        addresses: I,
        network_magic: NetworkMagic,
    ) -> Vec<ExtendedAddr>
    where
        I: Iterator<Item = &'a Self::Addressing>,
    {
        addresses
            .map(|&(addr_type, index)| {
                let key = self.cached_root_key.change(addr_type).index(index).public();
                ExtendedAddr::new_simple(*key.deref(), network_magic)
            })
            .collect()
    }
}

/// the coin type level of the hierarchy, the root every wallet
/// operation derives below
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootLevel<T>(T);
impl RootLevel<XPrv> {
    /// the hardened account key of the given account number
    pub fn account(&self, id: u32) -> AccountLevel<XPrv> {
        assert!(id < BIP44_SOFT_UPPER_BOUND);
        AccountLevel(self.0.derive(BIP44_SOFT_UPPER_BOUND | id))
    }
}
impl<T> Deref for RootLevel<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}
impl From<XPrv> for RootLevel<XPrv> {
    fn from(xprv: XPrv) -> Self {
        RootLevel(xprv)
    }
}

/// the account level of the hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountLevel<T>(T);
impl AccountLevel<XPrv> {
    pub fn external(&self) -> ChangeLevel<XPrv> {
        ChangeLevel(self.0.derive(0))
    }
    pub fn internal(&self) -> ChangeLevel<XPrv> {
        ChangeLevel(self.0.derive(1))
    }
    pub fn change(&self, addr_type: AddrType) -> ChangeLevel<XPrv> {
        match addr_type {
            AddrType::Internal => self.internal(),
            AddrType::External => self.external(),
        }
    }
    pub fn public(&self) -> AccountLevel<XPub> {
        AccountLevel(self.0.public())
    }
}
impl AccountLevel<XPub> {
    pub fn external(&self) -> hdwallet::Result<ChangeLevel<XPub>> {
        Ok(ChangeLevel(self.0.derive(0)?))
    }
    pub fn internal(&self) -> hdwallet::Result<ChangeLevel<XPub>> {
        Ok(ChangeLevel(self.0.derive(1)?))
    }
    pub fn change(&self, addr_type: AddrType) -> hdwallet::Result<ChangeLevel<XPub>> {
        match addr_type {
            AddrType::Internal => self.internal(),
            AddrType::External => self.external(),
        }
    }
}
impl From<XPrv> for AccountLevel<XPrv> {
    fn from(xprv: XPrv) -> Self {
        AccountLevel(xprv)
    }
}
impl From<XPub> for AccountLevel<XPub> {
    fn from(xpub: XPub) -> Self {
        AccountLevel(xpub)
    }
}
impl<T> Deref for AccountLevel<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

/// the change level of the hierarchy: external receives, internal
/// keeps the change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLevel<T>(T);
impl ChangeLevel<XPrv> {
    pub fn index(&self, index: DerivationIndex) -> IndexLevel<XPrv> {
        assert!(index < BIP44_SOFT_UPPER_BOUND);
        IndexLevel(self.0.derive(index))
    }
    pub fn public(&self) -> ChangeLevel<XPub> {
        ChangeLevel(self.0.public())
    }
}
impl ChangeLevel<XPub> {
    pub fn index(&self, index: DerivationIndex) -> hdwallet::Result<IndexLevel<XPub>> {
        assert!(index < BIP44_SOFT_UPPER_BOUND);
        Ok(IndexLevel(self.0.derive(index)?))
    }
}
impl From<XPrv> for ChangeLevel<XPrv> {
    fn from(xprv: XPrv) -> Self {
        ChangeLevel(xprv)
    }
}
impl From<XPub> for ChangeLevel<XPub> {
    fn from(xpub: XPub) -> Self {
        ChangeLevel(xpub)
    }
}
impl<T> Deref for ChangeLevel<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

/// the bottom of the hierarchy, the key behind one address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLevel<T>(T);
impl IndexLevel<XPrv> {
    pub fn public(&self) -> IndexLevel<XPub> {
        IndexLevel(self.0.public())
    }
}
impl From<XPrv> for IndexLevel<XPrv> {
    fn from(xprv: XPrv) -> Self {
        IndexLevel(xprv)
    }
}
impl From<XPub> for IndexLevel<XPub> {
    fn from(xpub: XPub) -> Self {
        IndexLevel(xpub)
    }
}
impl<T> Deref for IndexLevel<T> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::Coin;
    use crate::tx::{TxOut, TxoPointer};
    use crate::txbuild::{TxBuilder, TxFinalized};
    use crate::util::hex;
    use crate::wallet::scheme::{Account as _, Wallet as _};

    const WALLET_ENTROPY: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

    fn test_wallet() -> Wallet {
        let entropy = bip39::Entropy::from_slice(&WALLET_ENTROPY).expect("valid entropy size");
        Wallet::from_entropy(&entropy, b"password")
    }

    #[test]
    fn wrong_entropy_size_is_rejected() {
        assert!(bip39::Entropy::from_slice(&[0u8; 17]).is_err());
    }

    #[test]
    fn account_aliases_are_bookkeeping_only() {
        let mut wallet = test_wallet();
        let by_alias = wallet.create_account("main", 0);
        let by_other_alias = wallet.create_account("spending", 0);

        assert_eq!(
            by_alias.public().cached_root_key,
            by_other_alias.public().cached_root_key
        );
        assert_eq!(wallet.list_accounts().len(), 2);
    }

    #[test]
    fn public_and_private_accounts_generate_the_same_addresses() {
        let mut wallet = test_wallet();
        let account = wallet.create_account("main", 0);

        let addressing = [(AddrType::External, 0), (AddrType::Internal, 1)];
        let network_magic = NetworkMagic::Magic(1);
        let from_prv = account.generate_addresses(addressing.iter(), network_magic);
        let from_pub = account
            .public()
            .generate_addresses(addressing.iter(), network_magic);

        assert_eq!(from_prv, from_pub);
    }

    #[test]
    fn signing_covers_the_expected_addresses() {
        let mut wallet = test_wallet();
        let account = wallet.create_account("main", 0);
        let network_magic = NetworkMagic::Magic(1);
        let protocol_magic = ProtocolMagic::from(1);

        let addresses =
            account.generate_addresses([(AddrType::External, 0)].iter(), network_magic);

        let txid = TxId::new(&[1; 32]);
        let witnesses = wallet.sign_tx(
            protocol_magic,
            &txid,
            [Addressing::new(0, AddrType::External, 0).unwrap()]
                .iter()
                .cloned(),
        );

        assert_eq!(witnesses.len(), 1);
        assert!(witnesses[0].verify_address(&addresses[0]));
    }

    // transaction pinned by the project test vectors: wallet from the
    // incremental 16 byte entropy and the password "password", account 0,
    // external chain, 1000 coins sent to the address of index 1, one
    // input (zero txid, index 1) and a single all-zero key witness over
    // the zero txid, all under the protocol magic 1.
    const GOLDEN_TXAUX: &'static str =
        "82839f8200d81858248258200000000000000000000000000000000000000000\
         00000000000000000000000001ff9f8282d818582483581c79f9b94b0a8c4b83\
         89ae1dc1be33181545d44c8e7bd7e7bcab538f55a1024101001a648f73a01903\
         e8ffa0818200d818588582584001000000000000000000000000000000000000\
         0000000000000000000000000000000000000000000000000000000000000000\
         0000000000000000000000000058400aa8f4830604f63f3e616df960e59ed1c2\
         db3235d0799a934b4b5fa288a6acb9def0381f124f40e09bba88cdacb4a04286\
         7bb92d14cb246f27f9cfcfd3ae3109";

    #[test]
    fn golden_signed_transaction() {
        let protocol_magic = ProtocolMagic::from(1);
        let mut wallet = test_wallet();
        let account = wallet.create_account("main", 0).public();

        let addresses = account.generate_addresses(
            [(AddrType::External, 0), (AddrType::External, 1)].iter(),
            NetworkMagic::from(protocol_magic),
        );

        let zero_txid = TxId::from([0u8; 32]);
        let mut builder = TxBuilder::new();
        builder.add_input(&TxoPointer::new(zero_txid.clone(), 1), Coin::new(1000).unwrap());
        builder.add_output_value(&TxOut::new(addresses[1].clone(), Coin::new(1000).unwrap()));
        let tx = builder.make_tx().unwrap();

        let mut finalized = TxFinalized::new(tx);
        let zero_xprv = XPrv::from_slice(&[0u8; XPRV_SIZE]).unwrap();
        finalized
            .add_witness(TxInWitness::new(protocol_magic, &zero_xprv, &zero_txid))
            .unwrap();
        let txaux = finalized.make_txaux().unwrap();

        assert_eq!(hex::encode(&cbor!(&txaux).unwrap()), GOLDEN_TXAUX);
    }
}
