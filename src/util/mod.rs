pub mod base58;
pub mod bits;
pub mod hex;
pub mod securemem;
pub mod try_from_slice;
