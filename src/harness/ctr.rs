// AES-128 in CTR mode with an 8 byte nonce and an 8 byte little-endian
// counter. The nonce travels in front of the ciphertext.
use aes::Aes128;
use cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use rand::RngCore;

use crate::AttackError;

pub const NONCE_SIZE: usize = 8;

/// Produces successive counter blocks `nonce || counter_le`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtrCounter {
    nonce: [u8; NONCE_SIZE],
    counter: u64,
}

impl CtrCounter {
    pub fn new(nonce: [u8; NONCE_SIZE]) -> Self {
        Self::starting_at(nonce, 0)
    }

    pub fn starting_at(nonce: [u8; NONCE_SIZE], counter: u64) -> Self {
        Self { nonce, counter }
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Return the current counter block and advance. The counter wraps.
    pub fn next_block(&mut self) -> [u8; 16] {
        let mut block = [0u8; 16];
        block[..NONCE_SIZE].copy_from_slice(&self.nonce);
        block[NONCE_SIZE..].copy_from_slice(&self.counter.to_le_bytes());
        self.counter = self.counter.wrapping_add(1);
        block
    }
}

/// Encrypt under `key`, drawing a random nonce when none is given.
pub fn ctr_encrypt(key: &[u8; 16], plaintext: &[u8], nonce: Option<[u8; NONCE_SIZE]>) -> Vec<u8> {
    let nonce = nonce.unwrap_or_else(|| {
        let mut nonce = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce);
        nonce
    });
    let mut out = nonce.to_vec();
    out.extend(apply_keystream(key, CtrCounter::new(nonce), plaintext));
    out
}

/// Decrypt the output of [`ctr_encrypt`].
pub fn ctr_decrypt(key: &[u8; 16], ciphertext: &[u8]) -> Result<Vec<u8>, AttackError> {
    if ciphertext.len() < NONCE_SIZE {
        return Err(AttackError::InvalidInput(format!(
            "ctr ciphertext of {} bytes has no room for a nonce",
            ciphertext.len()
        )));
    }
    let (nonce, body) = ciphertext.split_at(NONCE_SIZE);
    let mut nonce_buf = [0u8; NONCE_SIZE];
    nonce_buf.copy_from_slice(nonce);
    Ok(apply_keystream(key, CtrCounter::new(nonce_buf), body))
}

fn apply_keystream(key: &[u8; 16], mut counter: CtrCounter, data: &[u8]) -> Vec<u8> {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut out = Vec::with_capacity(data.len());
    for chunk in data.chunks(16) {
        let mut keystream = GenericArray::from(counter.next_block());
        cipher.encrypt_block(&mut keystream);
        out.extend(chunk.iter().zip(keystream.iter()).map(|(b, k)| b ^ k));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_blocks_carry_nonce_and_little_endian_count() {
        let mut counter = CtrCounter::starting_at(*b"noncenon", 0x0102);

        let first = counter.next_block();
        let second = counter.next_block();

        assert_eq!(&first[..8], b"noncenon");
        assert_eq!(first[8..], [0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(second[8..], [0x03, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(counter.counter(), 0x0104);
    }

    #[test]
    fn counter_wraps_around() {
        let mut counter = CtrCounter::starting_at([0; 8], u64::MAX);

        counter.next_block();

        assert_eq!(counter.counter(), 0);
    }

    #[test]
    fn ctr_decrypt_inverts_ctr_encrypt() {
        let key = *b"YELLOW SUBMARINE";
        let msg = b"stream ciphers need no padding at all";

        let ciphertext = ctr_encrypt(&key, msg, None);

        assert_eq!(ciphertext.len(), NONCE_SIZE + msg.len());
        assert_eq!(ctr_decrypt(&key, &ciphertext).unwrap(), msg);
    }

    #[test]
    fn ctr_encrypt_is_deterministic_for_fixed_nonce() {
        let key = *b"YELLOW SUBMARINE";

        let first = ctr_encrypt(&key, b"same input", Some([9; 8]));
        let second = ctr_encrypt(&key, b"same input", Some([9; 8]));

        assert_eq!(first, second);
    }

    #[test]
    fn ctr_decrypt_rejects_truncated_nonce() {
        let result = ctr_decrypt(b"YELLOW SUBMARINE", &[1, 2, 3]);

        assert!(matches!(result, Err(AttackError::InvalidInput(_))));
    }
}
