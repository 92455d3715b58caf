// Byte-at-a-time ECB decryption
//
// The oracle encrypts prefix || input || suffix in ECB mode. Once the prefix
// has been padded out to a block boundary we choose how many filler bytes
// precede the suffix, so we can make any suffix byte the last byte of a block
// whose other bytes we already know:
//
//      <-- prefix --> F F || A A A A A A A s[0] || s[1] ...
//                     ↑                    ↑
//                  filler          byte being recovered
//
// Encrypting the same block with each candidate in place of s[0] gives a
// dictionary; the candidate whose ciphertext block matches is s[0]. Shrinking
// the run of A's by one and appending the recovered bytes moves the next
// suffix byte into the same slot.
use std::ops::Range;

use rayon::prelude::*;

use super::mode::is_ecb;
use super::prefix::{locate_prefix, PrefixLocation};
use super::size::{discover_block_size, BlockGeometry};
use crate::{AttackConfig, AttackError, EncryptionOracle};

const FILLER: u8 = b'A';

/// Recover the unknown suffix an ECB oracle appends to attacker input.
///
/// Candidates are tried from `alphabet` in order, defaulting to all 256 byte
/// values. The oracle must be deterministic and must map plaintext to
/// ciphertext one-to-one; otherwise, or when the alphabet lacks a suffix
/// byte, the attack stops with [`AttackError::ByteNotFound`].
pub fn ecb_suffix_decrypt<O: EncryptionOracle + ?Sized>(
    oracle: &O,
    alphabet: Option<&[u8]>,
    config: &AttackConfig,
) -> Result<Vec<u8>, AttackError> {
    let alphabet = alphabet_or_all_bytes(alphabet);
    recover_suffix(oracle, config, |input, window, target| {
        alphabet
            .iter()
            .copied()
            .find(|&byte| candidate_matches(oracle, input, byte, &window, target))
    })
}

/// As [`ecb_suffix_decrypt`], sweeping candidates on the rayon pool when
/// `config.parallel` is set. The oracle must tolerate concurrent calls.
pub fn ecb_suffix_decrypt_parallel<O: EncryptionOracle + Sync + ?Sized>(
    oracle: &O,
    alphabet: Option<&[u8]>,
    config: &AttackConfig,
) -> Result<Vec<u8>, AttackError> {
    if !config.parallel {
        return ecb_suffix_decrypt(oracle, alphabet, config);
    }
    let alphabet = alphabet_or_all_bytes(alphabet);
    recover_suffix(oracle, config, |input, window, target| {
        alphabet
            .par_iter()
            .copied()
            .find_first(|&byte| candidate_matches(oracle, input, byte, &window, target))
    })
}

fn alphabet_or_all_bytes(alphabet: Option<&[u8]>) -> Vec<u8> {
    alphabet.map_or_else(|| (0..=u8::MAX).collect(), <[u8]>::to_vec)
}

fn candidate_matches<O: EncryptionOracle + ?Sized>(
    oracle: &O,
    input: &[u8],
    byte: u8,
    window: &Range<usize>,
    target: &[u8],
) -> bool {
    let candidate_msg = [input, &[byte]].concat();
    oracle.encrypt(&candidate_msg).get(window.clone()) == Some(target)
}

fn recover_suffix<O, F>(oracle: &O, config: &AttackConfig, sweep: F) -> Result<Vec<u8>, AttackError>
where
    O: EncryptionOracle + ?Sized,
    F: Fn(&[u8], Range<usize>, &[u8]) -> Option<u8>,
{
    if !oracle.is_deterministic() {
        log::warn!("refusing byte-at-a-time attack on a non-deterministic oracle");
        return Err(AttackError::ByteNotFound { position: 0 });
    }

    let geometry = discover_block_size(oracle, config)?;
    let block_size = geometry.block_size;
    let probe = vec![FILLER; 3 * block_size];
    if !is_ecb(&oracle.encrypt(&probe), block_size, config.ecb_threshold) {
        return Err(AttackError::ModeMismatch);
    }
    let location = locate_prefix(oracle, block_size, config)?;
    let filler = vec![FILLER; location.filler_len()];
    let suffix_len = suffix_length(oracle, &geometry, &location, &filler)?;
    log::debug!("recovering {suffix_len} suffix bytes");

    let mut recovered: Vec<u8> = Vec::with_capacity(suffix_len);
    while recovered.len() < suffix_len {
        let position = recovered.len();
        let n_align = block_size - (position % block_size) - 1;
        let window_end = location.block_end + block_size * (position / block_size + 1);
        let window = (window_end - block_size)..window_end;

        let mut input = filler.clone();
        input.resize(filler.len() + n_align, FILLER);
        let reference = oracle.encrypt(&input);
        let target = reference
            .get(window.clone())
            .ok_or(AttackError::ByteNotFound { position })?;

        input.extend_from_slice(&recovered);
        let byte = sweep(&input, window, target).ok_or(AttackError::ByteNotFound { position })?;
        log::trace!("suffix[{position}] = {byte:#04x}");
        recovered.push(byte);
    }
    Ok(recovered)
}

// The oracle output for `filler` ends with the suffix plus its padding, and
// the padding length follows from where the ciphertext first grew.
fn suffix_length<O: EncryptionOracle + ?Sized>(
    oracle: &O,
    geometry: &BlockGeometry,
    location: &PrefixLocation,
    filler: &[u8],
) -> Result<usize, AttackError> {
    let block_size = geometry.block_size;
    let n_pad = match (geometry.padding_overhead % block_size + block_size
        - filler.len() % block_size)
        % block_size
    {
        0 => block_size,
        n => n,
    };
    oracle
        .encrypt(filler)
        .len()
        .checked_sub(location.block_end + n_pad)
        .ok_or(AttackError::CalibrationFailure {
            stage: "suffix length",
            limit: 1,
        })
}
