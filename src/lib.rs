mod config;
mod error;
mod oracle;

pub mod cbc;
pub mod ecb;
pub mod harness;
pub mod padding;

pub use cbc::{cbc_padding_oracle_decrypt, cbc_padding_oracle_decrypt_parallel};
pub use config::AttackConfig;
pub use ecb::{
    discover_block_size, ecb_suffix_decrypt, ecb_suffix_decrypt_parallel, is_ecb, locate_prefix,
    BlockGeometry, PrefixLocation,
};
pub use error::AttackError;
pub use oracle::{EncryptionOracle, ValidityOracle};
pub use padding::{pad, padding_valid, unpad, unpad_strict};
