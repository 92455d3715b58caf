// Oracles backed by a real block cipher under a hidden random key.
use cipher::{BlockDecrypt, BlockEncrypt, Key, KeyInit};
use rand::RngCore;

use super::ctr::{ctr_encrypt, NONCE_SIZE};
use super::modes::{cbc_decrypt, cbc_encrypt, ecb_encrypt};
use crate::{EncryptionOracle, ValidityOracle};

/// Construct a block cipher under a fresh random key.
pub fn random_cipher<C: KeyInit>() -> C {
    let mut key = Key::<C>::default();
    rand::thread_rng().fill_bytes(&mut key);
    C::new(&key)
}

pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn surround(prefix: &[u8], input: &[u8], suffix: &[u8]) -> Vec<u8> {
    [prefix, input, suffix].concat()
}

/// Encrypts `prefix || input || suffix` in ECB mode.
pub struct EcbOracle<C> {
    cipher: C,
    prefix: Vec<u8>,
    suffix: Vec<u8>,
}

impl<C: KeyInit> EcbOracle<C> {
    pub fn new(prefix: Vec<u8>, suffix: Vec<u8>) -> Self {
        Self::with_cipher(random_cipher(), prefix, suffix)
    }
}

impl<C> EcbOracle<C> {
    pub fn with_cipher(cipher: C, prefix: Vec<u8>, suffix: Vec<u8>) -> Self {
        Self {
            cipher,
            prefix,
            suffix,
        }
    }

    pub fn suffix(&self) -> &[u8] {
        &self.suffix
    }
}

impl<C: BlockEncrypt> EncryptionOracle for EcbOracle<C> {
    fn encrypt(&self, input: &[u8]) -> Vec<u8> {
        ecb_encrypt(&self.cipher, &surround(&self.prefix, input, &self.suffix))
    }
}

/// Encrypts `prefix || input || suffix` in CBC mode under a fixed IV.
pub struct CbcOracle<C> {
    cipher: C,
    iv: Vec<u8>,
    prefix: Vec<u8>,
    suffix: Vec<u8>,
}

impl<C: KeyInit + BlockEncrypt> CbcOracle<C> {
    pub fn new(prefix: Vec<u8>, suffix: Vec<u8>) -> Self {
        let mut iv = vec![0u8; C::block_size()];
        rand::thread_rng().fill_bytes(&mut iv);
        Self {
            cipher: random_cipher(),
            iv,
            prefix,
            suffix,
        }
    }
}

impl<C: BlockEncrypt> EncryptionOracle for CbcOracle<C> {
    fn encrypt(&self, input: &[u8]) -> Vec<u8> {
        cbc_encrypt(
            &self.cipher,
            &self.iv,
            &surround(&self.prefix, input, &self.suffix),
        )
    }
}

/// Encrypts `prefix || input || suffix` with AES-128-CTR under a fixed nonce.
pub struct CtrOracle {
    key: [u8; 16],
    nonce: [u8; NONCE_SIZE],
    prefix: Vec<u8>,
    suffix: Vec<u8>,
}

impl CtrOracle {
    pub fn new(prefix: Vec<u8>, suffix: Vec<u8>) -> Self {
        Self {
            key: random_bytes(),
            nonce: random_bytes(),
            prefix,
            suffix,
        }
    }
}

impl EncryptionOracle for CtrOracle {
    fn encrypt(&self, input: &[u8]) -> Vec<u8> {
        ctr_encrypt(
            &self.key,
            &surround(&self.prefix, input, &self.suffix),
            Some(self.nonce),
        )
    }
}

/// Holds a hidden key and answers whether `iv || ciphertext` decrypts to valid
/// PKCS#7 padding.
pub struct PaddingOracle<C> {
    cipher: C,
    iv: Vec<u8>,
}

impl<C: KeyInit + BlockEncrypt + BlockDecrypt> PaddingOracle<C> {
    pub fn new() -> Self {
        let mut iv = vec![0u8; C::block_size()];
        rand::thread_rng().fill_bytes(&mut iv);
        Self::with_iv(iv)
    }

    pub fn with_iv(iv: Vec<u8>) -> Self {
        Self {
            cipher: random_cipher(),
            iv,
        }
    }

    /// Encrypt `plaintext` and return `iv || ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut out = self.iv.clone();
        out.extend(cbc_encrypt(&self.cipher, &self.iv, plaintext));
        out
    }
}

impl<C: KeyInit + BlockEncrypt + BlockDecrypt> Default for PaddingOracle<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: BlockDecrypt> ValidityOracle for PaddingOracle<C> {
    fn is_valid(&self, ciphertext: &[u8]) -> bool {
        let block_size = C::block_size();
        if ciphertext.len() < 2 * block_size {
            return false;
        }
        let (iv, body) = ciphertext.split_at(block_size);
        cbc_decrypt(&self.cipher, iv, body).is_ok()
    }
}
