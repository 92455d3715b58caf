// ECB and CBC over any RustCrypto block cipher, with PKCS#7 padding.
use cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt};

use crate::padding::{pad, unpad_strict};
use crate::AttackError;

pub fn ecb_encrypt<C: BlockEncrypt>(cipher: &C, plaintext: &[u8]) -> Vec<u8> {
    let mut buf = pad(plaintext, C::block_size() as u8);
    for block in buf.chunks_exact_mut(C::block_size()) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    buf
}

pub fn ecb_decrypt<C: BlockDecrypt>(cipher: &C, ciphertext: &[u8]) -> Result<Vec<u8>, AttackError> {
    let block_size = C::block_size();
    check_block_aligned(ciphertext, block_size)?;

    let mut buf = ciphertext.to_vec();
    for block in buf.chunks_exact_mut(block_size) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }
    strip_padding(buf, block_size)
}

/// Encrypt in CBC mode. `iv` must be one block long; the IV is not included
/// in the output.
pub fn cbc_encrypt<C: BlockEncrypt>(cipher: &C, iv: &[u8], plaintext: &[u8]) -> Vec<u8> {
    let mut buf = pad(plaintext, C::block_size() as u8);
    let mut last_block = iv.to_vec();
    for block in buf.chunks_exact_mut(C::block_size()) {
        block
            .iter_mut()
            .zip(&last_block)
            .for_each(|(b, prev)| *b ^= prev);
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        last_block = block.to_vec();
    }
    buf
}

/// Decrypt in CBC mode and strictly remove the padding.
pub fn cbc_decrypt<C: BlockDecrypt>(
    cipher: &C,
    iv: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, AttackError> {
    let block_size = C::block_size();
    check_block_aligned(ciphertext, block_size)?;
    if iv.len() != block_size {
        return Err(AttackError::InvalidInput(format!(
            "iv is {} bytes, expected {block_size}",
            iv.len()
        )));
    }

    let mut buf = ciphertext.to_vec();
    let mut last_block = iv.to_vec();
    for block in buf.chunks_exact_mut(block_size) {
        let ciphertext_block = block.to_vec();
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        block
            .iter_mut()
            .zip(&last_block)
            .for_each(|(b, prev)| *b ^= prev);
        last_block = ciphertext_block;
    }
    strip_padding(buf, block_size)
}

fn check_block_aligned(ciphertext: &[u8], block_size: usize) -> Result<(), AttackError> {
    if ciphertext.is_empty() || ciphertext.len() % block_size != 0 {
        return Err(AttackError::InvalidInput(format!(
            "ciphertext of {} bytes is not a non-empty multiple of {block_size}",
            ciphertext.len()
        )));
    }
    Ok(())
}

fn strip_padding(mut buf: Vec<u8>, block_size: usize) -> Result<Vec<u8>, AttackError> {
    let message_len = unpad_strict(&buf, block_size as u8)?.len();
    buf.truncate(message_len);
    Ok(buf)
}
