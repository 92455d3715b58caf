// PKCS#7 padding
use crate::AttackError;

/// Append `block_size - (len % block_size)` bytes of that value. Aligned input
/// gains a full block of padding.
///
/// # Panics
///
/// If `block_size` is zero.
pub fn pad(bytes: &[u8], block_size: u8) -> Vec<u8> {
    assert!(block_size > 0, "pkcs7 block size must be non-zero");
    let block_size = block_size as usize;
    let n_pad = block_size - (bytes.len() % block_size);
    let mut out = Vec::with_capacity(bytes.len() + n_pad);
    out.extend_from_slice(bytes);
    out.resize(bytes.len() + n_pad, n_pad as u8);
    out
}

/// Strip as many trailing bytes as the final byte says, without checking them.
pub fn unpad(bytes: &[u8]) -> &[u8] {
    match bytes.last() {
        Some(&n_pad) => &bytes[..bytes.len().saturating_sub(n_pad as usize)],
        None => bytes,
    }
}

/// Strip padding, failing with [`AttackError::InvalidPadding`] unless the last
/// byte `v` is in `1..=block_size` and the final `v` bytes all equal `v`.
pub fn unpad_strict(bytes: &[u8], block_size: u8) -> Result<&[u8], AttackError> {
    match pkcs7_padding_len(bytes, block_size) {
        Some(n_pad) => Ok(&bytes[..bytes.len() - n_pad]),
        None => Err(AttackError::InvalidPadding),
    }
}

pub fn padding_valid(bytes: &[u8], block_size: u8) -> bool {
    pkcs7_padding_len(bytes, block_size).is_some()
}

fn pkcs7_padding_len(bytes: &[u8], block_size: u8) -> Option<usize> {
    let n_pad = *bytes.last()?;
    if n_pad == 0 || n_pad > block_size || n_pad as usize > bytes.len() {
        return None;
    }
    let padded = &bytes[bytes.len() - n_pad as usize..];
    padded
        .iter()
        .all(|&el| el == n_pad)
        .then_some(n_pad as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[rstest]
    #[case("YELL", 4, "YELL\x04\x04\x04\x04")]
    #[case("YELLOWS!!!", 6, "YELLOWS!!!\x02\x02")]
    #[case("YELLOW SUBMARINE", 20, "YELLOW SUBMARINE\x04\x04\x04\x04")]
    #[case("", 8, "\x08\x08\x08\x08\x08\x08\x08\x08")]
    fn pad_pads_message(#[case] msg: &str, #[case] block_size: u8, #[case] expected: &str) {
        let padded = pad(msg.as_bytes(), block_size);

        assert_eq!(padded, expected.as_bytes());
    }

    #[test]
    #[should_panic]
    fn pad_panics_given_zero_block_size() {
        pad(b"data", 0);
    }

    #[test]
    fn pad_output_is_block_aligned_and_strictly_unpads() {
        for block_size in [8u8, 16, 24, 32] {
            for len in 0..3 * block_size as usize {
                let msg: Vec<u8> = (0..len).map(|i| i as u8).collect();

                let padded = pad(&msg, block_size);

                assert_eq!(padded.len() % block_size as usize, 0);
                assert!(padded.len() > msg.len());
                assert_eq!(unpad_strict(&padded, block_size).unwrap(), msg.as_slice());
            }
        }
    }

    #[test]
    fn unpad_strips_without_validation() {
        assert_eq!(unpad(b"ICE ICE BABY\x01\x02\x03\x04"), b"ICE ICE BABY");
        assert_eq!(unpad(b"ABC\x09"), b"");
        assert_eq!(unpad(b""), b"");
    }

    #[test]
    fn unpad_strict_unpads_message() {
        let msg = b"ICE ICE BABY\x04\x04\x04\x04";

        let unpadded = unpad_strict(msg, 16);

        assert_eq!(unpadded, Ok(b"ICE ICE BABY".as_ref()));
    }

    #[rstest]
    #[case("ICE ICE BABY\x05\x05\x05\x05")]
    #[case("ICE ICE BABY\x01\x02\x03\x04")]
    #[case("ICE ICE BABY\x00")]
    #[case("ICE ICE BABY\x11")]
    #[case("\x03\x03")]
    #[case("")]
    fn unpad_strict_returns_err_given_invalid_padding(#[case] padded: &str) {
        let unpadded = unpad_strict(padded.as_bytes(), 16);

        assert_eq!(unpadded, Err(AttackError::InvalidPadding));
    }

    #[test]
    fn unpad_strict_rejects_every_out_of_range_final_byte() {
        let block_size = 16;
        for last in (0..=u8::MAX).filter(|&b| b == 0 || b > block_size) {
            let msg = vec![last; 32];

            assert!(!padding_valid(&msg, block_size), "accepted final byte {last}");
        }
    }

    #[test]
    fn unpad_strict_rejects_each_mismatched_trailing_byte() {
        let block_size = 16;
        for n_pad in 2..=block_size {
            for bad_idx in (32 - n_pad as usize)..31 {
                let mut msg = vec![b'x'; 32 - n_pad as usize];
                msg.resize(32, n_pad);
                msg[bad_idx] ^= 0x80;

                assert_eq!(
                    unpad_strict(&msg, block_size),
                    Err(AttackError::InvalidPadding),
                    "accepted pad {n_pad} corrupted at {bad_idx}"
                );
            }
        }
    }

    #[test]
    fn unpad_strict_accepts_full_block_of_padding() {
        let msg = b"ICE ICE BABY\x0C\x0C\x0C\x0C\x0C\x0C\x0C\x0C\x0C\x0C\x0C\x0C";

        assert_eq!(unpad_strict(msg, 12), Ok(b"ICE ICE BABY".as_ref()));
    }
}
