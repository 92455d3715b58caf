// Block size discovery
//
// Feed the oracle longer and longer runs of a single byte. While the plaintext
// fits in the same number of blocks the ciphertext length does not move; the
// first filler length that pushes it over a block boundary makes the output
// grow by a whole block. From that point, adding exactly one more block's
// worth of filler is the smallest step that grows the output again, which
// pins down the block size. Output that grows by anything other than a whole
// candidate block, as a stream cipher's does, is rejected.
use crate::{AttackConfig, AttackError, EncryptionOracle};

/// Block sizes tried, smallest first.
pub const CANDIDATE_BLOCK_SIZES: [usize; 4] = [8, 16, 24, 32];

const FILLER: u8 = b'A';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    pub block_size: usize,
    /// The filler length at which the ciphertext first grows. With PKCS#7
    /// this equals the number of padding bytes the oracle adds to its fixed
    /// content.
    pub padding_overhead: usize,
}

pub fn discover_block_size<O: EncryptionOracle + ?Sized>(
    oracle: &O,
    config: &AttackConfig,
) -> Result<BlockGeometry, AttackError> {
    let calibration_failure = AttackError::CalibrationFailure {
        stage: "block size discovery",
        limit: config.max_probes,
    };

    let mut last_len = oracle.encrypt(&[]).len();
    let (boundary, boundary_len) = (1..=config.max_probes)
        .find_map(|n_filler| {
            let len = oracle.encrypt(&vec![FILLER; n_filler]).len();
            if len > last_len {
                Some((n_filler, len))
            } else {
                last_len = len;
                None
            }
        })
        .ok_or_else(|| calibration_failure.clone())?;
    let jump = boundary_len - last_len;

    // A block cipher grows by exactly one block, then holds that length for
    // another `size - 1` filler bytes.
    let output_len = |n_filler: usize| oracle.encrypt(&vec![FILLER; n_filler]).len();
    let block_size = CANDIDATE_BLOCK_SIZES
        .into_iter()
        .find(|&size| {
            jump == size
                && output_len(boundary + size - 1) == boundary_len
                && output_len(boundary + size) == boundary_len + size
        })
        .ok_or(calibration_failure)?;

    log::debug!("discovered block size {block_size} with padding overhead {boundary}");
    Ok(BlockGeometry {
        block_size,
        padding_overhead: boundary,
    })
}
