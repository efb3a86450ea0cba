//! wallet maintenance stuff, the wallet scheme with the sequential
//! (BIP44) indexing and the key generation helpers.

pub mod bip44;
pub mod keygen;
pub mod scheme;
