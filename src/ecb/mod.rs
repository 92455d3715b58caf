mod byte_at_a_time;
mod mode;
mod prefix;
mod size;

pub use byte_at_a_time::{ecb_suffix_decrypt, ecb_suffix_decrypt_parallel};
pub use mode::{count_block_repetitions, is_ecb};
pub use prefix::{locate_prefix, PrefixLocation};
pub use size::{discover_block_size, BlockGeometry, CANDIDATE_BLOCK_SIZES};
