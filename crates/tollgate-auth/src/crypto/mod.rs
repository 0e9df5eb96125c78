//! Cryptographic utilities.

pub mod cipher;

pub use cipher::{CipherAlgorithm, CipherError, SymmetricCipher};
