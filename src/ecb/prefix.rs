// Locate the oracle's fixed prefix
//
// Encrypt runs of n and n - 1 filler bytes and measure how many leading
// ciphertext bytes the two outputs share. Blocks made only of prefix bytes
// are always shared. The block holding the end of the prefix joins them once
// the filler completes it in both encryptions, i.e. the first time the run
// is one byte longer than the gap left in that block:
//
//      n - 1 filler
//      <-- prefix --> A A A A || suffix[0] suffix[1] ...
//      n filler
//      <-- prefix --> A A A A || A suffix[0] ...
//                             ↑
//                  shared length, rounded down to a block
//
// At that point `prefix_len = shared - n + 1`. The first probe sets the
// baseline, since shared prefix blocks are visible from the start. A suffix
// beginning with the filler byte can complete the block one probe early, so
// every candidate is confirmed with a second filler byte.
use crate::{AttackConfig, AttackError, EncryptionOracle};

const FILLER: u8 = b'A';
const CONFIRM_FILLER: u8 = b'B';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixLocation {
    /// Exact length of the unknown prefix.
    pub prefix_len: usize,
    /// A block boundary at or after the end of the prefix. Filling
    /// `block_end - prefix_len` bytes aligns attacker input to a block.
    pub block_end: usize,
}

impl PrefixLocation {
    pub fn filler_len(&self) -> usize {
        self.block_end - self.prefix_len
    }
}

pub fn locate_prefix<O: EncryptionOracle + ?Sized>(
    oracle: &O,
    block_size: usize,
    config: &AttackConfig,
) -> Result<PrefixLocation, AttackError> {
    if block_size == 0 {
        return Err(AttackError::InvalidInput("block size must be non-zero".into()));
    }
    let shared_blocks = |byte: u8, n_filler: usize| -> usize {
        let current = oracle.encrypt(&vec![byte; n_filler]);
        let last = oracle.encrypt(&vec![byte; n_filler - 1]);
        common_prefix_len(&current, &last) / block_size
    };

    let mut last = oracle.encrypt(&[]);
    let mut baseline_blocks = None;
    for n_filler in 1..=config.max_probes {
        let current = oracle.encrypt(&vec![FILLER; n_filler]);
        let n_shared = common_prefix_len(&current, &last) / block_size;
        last = current;

        let Some(baseline) = baseline_blocks else {
            baseline_blocks = Some(n_shared);
            continue;
        };
        if n_shared <= baseline || shared_blocks(CONFIRM_FILLER, n_filler) < n_shared {
            continue;
        }

        let shared_len = n_shared * block_size;
        let Some(prefix_len) = (shared_len + 1).checked_sub(n_filler) else {
            continue;
        };
        // When the run exactly fills a block plus one byte, the prefix ended
        // on a boundary one block earlier.
        let block_end = if n_filler % block_size == 1 {
            shared_len - block_size
        } else {
            shared_len
        };
        log::debug!("prefix is {prefix_len} bytes, aligned at {block_end}");
        return Ok(PrefixLocation {
            prefix_len,
            block_end,
        });
    }

    Err(AttackError::CalibrationFailure {
        stage: "prefix localization",
        limit: config.max_probes,
    })
}

/// Length of the longest common prefix of `x` and `y`.
fn common_prefix_len(x: &[u8], y: &[u8]) -> usize {
    x.iter().zip(y).take_while(|(a, b)| a == b).count()
}
