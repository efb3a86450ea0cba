use crate::address::ExtendedAddr;
use crate::coin::{self, Coin};
use crate::tx::*;

/// Output Policy chosen.
///
/// For now this is just a placeholder of a single address,
/// but adding a ratio driven list of addresses seems
/// a useful flexibility to have
#[derive(Debug, Clone)]
pub enum OutputPolicy {
    One(ExtendedAddr),
}

pub fn output_sum<'a, O: 'a + Iterator<Item = &'a TxOut>>(o: O) -> coin::Result<Coin> {
    o.fold(Coin::new(0), |acc, c| acc.and_then(|v| v + c.value))
}
