//! wallet master key generation

use crate::bip::bip39;

use cryptoxide::hmac::Hmac;
use cryptoxide::pbkdf2::pbkdf2;
use cryptoxide::sha2::Sha512;

/// stretch the wallet entropy, under the spending password, into key
/// material of the size of the output slice
pub fn generate_seed(entropy: &bip39::Entropy, password: &[u8], output: &mut [u8]) {
    let mut mac = Hmac::new(Sha512::new(), password);
    pbkdf2(&mut mac, entropy.as_ref(), 4096, output)
}
