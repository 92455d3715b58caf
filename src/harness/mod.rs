//! Concrete oracles for exercising the attacks.
//!
//! The attacks only ever see the [`EncryptionOracle`](crate::EncryptionOracle)
//! and [`ValidityOracle`](crate::ValidityOracle) capabilities. This module wires
//! real RustCrypto block ciphers (`aes`, `des`) up to those capabilities so the
//! attacks can be demonstrated and tested end to end.
mod ctr;
mod modes;
mod oracles;

pub use ctr::{ctr_decrypt, ctr_encrypt, CtrCounter, NONCE_SIZE};
pub use modes::{cbc_decrypt, cbc_encrypt, ecb_decrypt, ecb_encrypt};
pub use oracles::{
    random_bytes, random_cipher, CbcOracle, CtrOracle, EcbOracle, PaddingOracle,
};
