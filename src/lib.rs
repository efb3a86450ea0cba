#![cfg_attr(feature = "with-bench", feature(test))]

#[cfg(feature = "generic-serialization")]
#[macro_use]
extern crate serde_derive;
#[cfg(feature = "generic-serialization")]
extern crate serde;

#[cfg(test)]
#[cfg(feature = "with-bench")]
extern crate test;

#[cfg(test)]
#[macro_use]
extern crate quickcheck;

extern crate cryptoxide;
#[macro_use]
extern crate cbor_event;

mod crc32;
pub mod util;
pub mod config;
pub mod hdwallet;
pub mod address;
pub mod hdpayload;
pub mod tx;
pub mod txutils;
pub mod txbuild;
pub mod fee;
pub mod coin;
pub mod hash;

pub mod cbor;
pub mod bip;
pub mod wallet;
pub mod block;
