pub mod hs;
