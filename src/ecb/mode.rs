// Detect ECB mode
use std::collections::HashMap;

/// Decide whether `ciphertext` was produced in ECB mode.
///
/// Every `block_size` window is counted, at every byte offset rather than only
/// at block boundaries, so an unknown prefix does not have to be aligned. The
/// ciphertext is called ECB when the number of windows exceeds the number of
/// distinct windows by at least `threshold`. A threshold of zero accepts any
/// ciphertext.
///
/// The signal is only as good as the plaintext behind it: the probe should
/// contain at least two full blocks of identical bytes wherever it lands,
/// i.e. `3 * block_size` repeated bytes when the alignment is unknown.
pub fn is_ecb(ciphertext: &[u8], block_size: usize, threshold: usize) -> bool {
    let (n_windows, n_distinct) = count_windows(ciphertext, block_size);
    n_windows >= n_distinct + threshold
}

/// Number of repeated window occurrences, i.e. windows that duplicate one
/// seen earlier.
pub fn count_block_repetitions(ciphertext: &[u8], block_size: usize) -> usize {
    let (n_windows, n_distinct) = count_windows(ciphertext, block_size);
    n_windows - n_distinct
}

fn count_windows(bytes: &[u8], block_size: usize) -> (usize, usize) {
    if block_size == 0 || bytes.len() < block_size {
        return (0, 0);
    }
    let mut seen_blocks = HashMap::<&[u8], usize>::new();
    for window in bytes.windows(block_size) {
        *seen_blocks.entry(window).or_default() += 1;
    }
    (seen_blocks.values().sum(), seen_blocks.len())
}
