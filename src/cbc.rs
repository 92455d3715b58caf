// CBC padding oracle attack
//
// CBC decrypts a block as
//
//                 P_i = D(C_i) ⊕ C_{i-1}.
//
// If we send the oracle C_i preceded by a block X that we control instead of
// C_{i-1}, it decrypts
//
//                P'_i = D(C_i) ⊕ X = P_i ⊕ C_{i-1} ⊕ X,
//
// and tells us whether P'_i ends in valid padding. Sweeping the last byte of X
// until the oracle accepts means P'_i most likely ends in \x01, so
//
//              P_i[n-1] = C_{i-1}[n-1] ⊕ \x01 ⊕ X[n-1].
//
// With that byte known we set the tail of X so P'_i ends in \x02 and sweep
// the byte before it, and so on to the start of the block. Every block but
// the first has a known predecessor, so the first block stays hidden.
//
// The last byte is the one place where two candidates can pass: the true one
// giving \x01, and one giving \x02 when P'_i[n-2] already happens to be \x02
// (or \x03\x03 and so on). Randomising the rest of X breaks the coincidence.
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::{AttackConfig, AttackError, ValidityOracle};

/// Recover the plaintext of every block of `ciphertext` after the first.
///
/// `ciphertext` must be a whole number of `block_size` blocks, at least two of
/// them. Its first block is used only as the predecessor of the second, so
/// when attacking `iv || C` the output is the full padded plaintext of `C`.
/// Padding is left in place; strip it with
/// [`unpad_strict`](crate::padding::unpad_strict).
pub fn cbc_padding_oracle_decrypt<O: ValidityOracle + ?Sized>(
    ciphertext: &[u8],
    block_size: usize,
    oracle: &O,
    config: &AttackConfig,
) -> Result<Vec<u8>, AttackError> {
    recover_plaintext(ciphertext, block_size, oracle, config, |forged, position, block| {
        (0..=u8::MAX)
            .filter(|&candidate| padding_accepted(oracle, forged, position, candidate, block))
            .collect()
    })
}

/// As [`cbc_padding_oracle_decrypt`], sweeping the 256 candidates for each
/// byte on the rayon pool when `config.parallel` is set.
pub fn cbc_padding_oracle_decrypt_parallel<O: ValidityOracle + Sync + ?Sized>(
    ciphertext: &[u8],
    block_size: usize,
    oracle: &O,
    config: &AttackConfig,
) -> Result<Vec<u8>, AttackError> {
    if !config.parallel {
        return cbc_padding_oracle_decrypt(ciphertext, block_size, oracle, config);
    }
    recover_plaintext(ciphertext, block_size, oracle, config, |forged, position, block| {
        (0..=u8::MAX)
            .into_par_iter()
            .filter(|&candidate| padding_accepted(oracle, forged, position, candidate, block))
            .collect()
    })
}

fn recover_plaintext<O, F>(
    ciphertext: &[u8],
    block_size: usize,
    oracle: &O,
    config: &AttackConfig,
    sweep: F,
) -> Result<Vec<u8>, AttackError>
where
    O: ValidityOracle + ?Sized,
    F: Fn(&[u8], usize, &[u8]) -> Vec<u8>,
{
    validate_ciphertext(ciphertext, block_size)?;
    let blocks: Vec<&[u8]> = ciphertext.chunks(block_size).collect();
    if !oracle.is_deterministic() {
        log::warn!("refusing padding oracle attack on a non-deterministic oracle");
        return Err(AttackError::NoValidPadding {
            block: blocks.len() - 1,
            position: block_size - 1,
        });
    }

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut plaintext_blocks = Vec::with_capacity(blocks.len() - 1);
    for block_idx in (1..blocks.len()).rev() {
        let attack = BlockAttack {
            oracle,
            previous: blocks[block_idx - 1],
            block: blocks[block_idx],
            block_idx,
            config,
        };
        plaintext_blocks.push(attack.recover(&mut rng, &sweep)?);
        log::debug!("recovered block {block_idx}");
    }
    plaintext_blocks.reverse();
    Ok(plaintext_blocks.concat())
}

fn validate_ciphertext(ciphertext: &[u8], block_size: usize) -> Result<(), AttackError> {
    if block_size == 0 || block_size > u8::MAX as usize {
        return Err(AttackError::InvalidInput(format!(
            "block size {block_size} cannot carry pkcs7 padding"
        )));
    }
    if ciphertext.len() % block_size != 0 {
        return Err(AttackError::InvalidInput(format!(
            "ciphertext length {} is not a multiple of {block_size}",
            ciphertext.len()
        )));
    }
    if ciphertext.len() < 2 * block_size {
        return Err(AttackError::InvalidInput(
            "ciphertext must contain at least two blocks".into(),
        ));
    }
    Ok(())
}

/// Submit `forged || block` with `candidate` at `position` of the forged
/// predecessor.
fn padding_accepted<O: ValidityOracle + ?Sized>(
    oracle: &O,
    forged: &[u8],
    position: usize,
    candidate: u8,
    block: &[u8],
) -> bool {
    let mut query = Vec::with_capacity(forged.len() + block.len());
    query.extend_from_slice(forged);
    query[position] = candidate;
    query.extend_from_slice(block);
    oracle.is_valid(&query)
}

struct BlockAttack<'a, O: ?Sized> {
    oracle: &'a O,
    previous: &'a [u8],
    block: &'a [u8],
    block_idx: usize,
    config: &'a AttackConfig,
}

impl<O: ValidityOracle + ?Sized> BlockAttack<'_, O> {
    fn recover<F>(&self, rng: &mut StdRng, sweep: &F) -> Result<Vec<u8>, AttackError>
    where
        F: Fn(&[u8], usize, &[u8]) -> Vec<u8>,
    {
        let block_size = self.block.len();
        let mut recovered = vec![0u8; block_size];
        for position in (0..block_size).rev() {
            let pad_len = (block_size - position) as u8;
            let mut forged = vec![0u8; block_size];
            for idx in position + 1..block_size {
                forged[idx] = self.previous[idx] ^ recovered[idx] ^ pad_len;
            }

            let mut hits = sweep(&forged, position, self.block);
            let mut n_retries = 0;
            while hits.len() > 1 && n_retries < self.config.max_retries {
                n_retries += 1;
                log::warn!(
                    "{} candidates valid at block {}, byte {position}; retrying with a random prefix",
                    hits.len(),
                    self.block_idx
                );
                rng.fill_bytes(&mut forged[..position]);
                hits = sweep(&forged, position, self.block);
            }

            let candidate = match hits[..] {
                [] => {
                    return Err(AttackError::NoValidPadding {
                        block: self.block_idx,
                        position,
                    })
                }
                [candidate] => candidate,
                _ => self.disambiguate(&forged, position, &hits).ok_or(
                    AttackError::CalibrationFailure {
                        stage: "padding ambiguity",
                        limit: self.config.max_retries,
                    },
                )?,
            };
            recovered[position] = self.previous[position] ^ pad_len ^ candidate;
            log::trace!(
                "block {} byte {position} = {:#04x}",
                self.block_idx,
                recovered[position]
            );
        }
        Ok(recovered)
    }

    // A candidate that only passed because the preceding plaintext byte
    // completed a longer padding run fails once that byte is disturbed.
    fn disambiguate(&self, forged: &[u8], position: usize, hits: &[u8]) -> Option<u8> {
        let preceding = position.checked_sub(1)?;
        let mut disturbed = forged.to_vec();
        disturbed[preceding] ^= 0x01;
        let mut survivors = hits.iter().copied().filter(|&candidate| {
            padding_accepted(self.oracle, &disturbed, position, candidate, self.block)
        });
        match (survivors.next(), survivors.next()) {
            (Some(candidate), None) => Some(candidate),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use aes::Aes128;
    use rstest::rstest;

    use crate::harness::PaddingOracle;
    use crate::padding::{pad, padding_valid, unpad_strict};

    const BLOCK_SIZE: usize = 16;

    fn xor(x: &[u8], y: &[u8]) -> Vec<u8> {
        x.iter().zip(y).map(|(a, b)| a ^ b).collect()
    }

    // CBC over the identity "cipher": C_i = P_i ⊕ C_{i-1}. Lets a test choose
    // ciphertext bytes directly.
    fn xor_chain_encrypt(iv: &[u8], plaintext: &[u8]) -> Vec<u8> {
        let mut previous = iv.to_vec();
        let mut out = iv.to_vec();
        for block in plaintext.chunks(BLOCK_SIZE) {
            previous = xor(block, &previous);
            out.extend_from_slice(&previous);
        }
        out
    }

    fn xor_chain_oracle(ciphertext: &[u8]) -> bool {
        let n = ciphertext.len();
        if n < 2 * BLOCK_SIZE || n % BLOCK_SIZE != 0 {
            return false;
        }
        let last = xor(
            &ciphertext[n - 2 * BLOCK_SIZE..n - BLOCK_SIZE],
            &ciphertext[n - BLOCK_SIZE..],
        );
        padding_valid(&last, BLOCK_SIZE as u8)
    }

    #[rstest]
    #[case(b"YELLOW SUBMARINE")]
    #[case(b"I'm back and I'm ringin' the bell")]
    #[case(b"Now that the party is jumping. With the bass kicked in and the Vega's are pumpin'. Cooking MC's like a pound of bacon")]
    fn cbc_padding_oracle_decrypt_recovers_plaintext(#[case] plaintext: &[u8]) {
        let oracle = PaddingOracle::<Aes128>::new();
        let ciphertext = oracle.encrypt(plaintext);

        let recovered = cbc_padding_oracle_decrypt(
            &ciphertext[BLOCK_SIZE..],
            BLOCK_SIZE,
            &oracle,
            &AttackConfig::default(),
        )
        .unwrap();

        assert_eq!(recovered.len(), ciphertext.len() - 2 * BLOCK_SIZE);
        assert_eq!(
            unpad_strict(&recovered, BLOCK_SIZE as u8).unwrap(),
            &plaintext[BLOCK_SIZE.min(plaintext.len())..]
        );
    }

    #[test]
    fn cbc_padding_oracle_decrypt_recovers_blocks_after_iv() {
        let oracle = PaddingOracle::<Aes128>::new();
        let ciphertext = oracle.encrypt(b"attack at dawn");

        let recovered =
            cbc_padding_oracle_decrypt(&ciphertext, BLOCK_SIZE, &oracle, &AttackConfig::default())
                .unwrap();

        assert_eq!(recovered, b"attack at dawn\x02\x02");
    }

    #[rstest]
    #[case(AttackConfig::default().with_seed(101))]
    #[case(AttackConfig::default().with_max_retries(0))]
    fn cbc_padding_oracle_decrypt_resolves_two_valid_candidates(#[case] config: AttackConfig) {
        let mut plaintext = pad(b"first block data second block!!", BLOCK_SIZE as u8);
        // Make the attacked block's ciphertext byte 14 equal \x02, so a zero
        // forged prefix also accepts \x02\x02 padding for the last byte.
        plaintext[BLOCK_SIZE + 14] = plaintext[14] ^ 0x02;
        let ciphertext = xor_chain_encrypt(&[0; BLOCK_SIZE], &plaintext);
        assert_eq!(ciphertext[2 * BLOCK_SIZE + 14], 0x02);

        let recovered = cbc_padding_oracle_decrypt(
            &ciphertext[BLOCK_SIZE..],
            BLOCK_SIZE,
            &xor_chain_oracle,
            &config,
        )
        .unwrap();

        assert_eq!(recovered, &plaintext[BLOCK_SIZE..]);
    }

    #[test]
    fn cbc_padding_oracle_decrypt_fails_when_nothing_is_valid() {
        let oracle = |_: &[u8]| false;

        let result =
            cbc_padding_oracle_decrypt(&[0; 48], BLOCK_SIZE, &oracle, &AttackConfig::default());

        assert_eq!(
            result,
            Err(AttackError::NoValidPadding {
                block: 2,
                position: 15
            })
        );
    }

    #[test]
    fn cbc_padding_oracle_decrypt_fails_when_everything_is_valid() {
        let oracle = |_: &[u8]| true;
        let config = AttackConfig::default().with_max_retries(2);

        let result = cbc_padding_oracle_decrypt(&[0; 32], BLOCK_SIZE, &oracle, &config);

        assert_eq!(
            result,
            Err(AttackError::CalibrationFailure {
                stage: "padding ambiguity",
                limit: 2
            })
        );
    }

    #[test]
    fn cbc_padding_oracle_decrypt_refuses_non_deterministic_oracle() {
        struct Flaky;

        impl ValidityOracle for Flaky {
            fn is_valid(&self, _: &[u8]) -> bool {
                true
            }

            fn is_deterministic(&self) -> bool {
                false
            }
        }

        let result =
            cbc_padding_oracle_decrypt(&[0; 32], BLOCK_SIZE, &Flaky, &AttackConfig::default());

        assert_eq!(
            result,
            Err(AttackError::NoValidPadding {
                block: 1,
                position: 15
            })
        );
    }

    #[rstest]
    #[case(&[0; 33], 16)]
    #[case(&[0; 16], 16)]
    #[case(&[], 16)]
    #[case(&[0; 32], 0)]
    #[case(&[0; 512], 256)]
    fn cbc_padding_oracle_decrypt_rejects_malformed_ciphertext(
        #[case] ciphertext: &[u8],
        #[case] block_size: usize,
    ) {
        let oracle = |_: &[u8]| true;

        let result =
            cbc_padding_oracle_decrypt(ciphertext, block_size, &oracle, &AttackConfig::default());

        assert!(matches!(result, Err(AttackError::InvalidInput(_))));
    }

    #[test]
    fn parallel_sweep_matches_sequential_result() {
        let oracle = PaddingOracle::<Aes128>::new();
        let ciphertext = oracle.encrypt(b"Cooking MC's like a pound of bacon");
        let config = AttackConfig::default().with_parallel(true).with_seed(7);

        let sequential = cbc_padding_oracle_decrypt(&ciphertext, BLOCK_SIZE, &oracle, &config);
        let parallel =
            cbc_padding_oracle_decrypt_parallel(&ciphertext, BLOCK_SIZE, &oracle, &config);

        assert_eq!(parallel, sequential);
        assert_eq!(
            unpad_strict(&parallel.unwrap(), 16).unwrap(),
            b"Cooking MC's like a pound of bacon"
        );
    }
}
