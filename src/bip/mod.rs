//! Bitcoin Improvement Proposals the wallet layer builds upon
//!
//! * BIP 39: mnemonic phrases and the seed they encode
//! * BIP 44: multi-account hierarchy for deterministic wallets

pub mod bip39;
pub mod bip44;
