// Capabilities through which the attacks talk to a target system.
//
// Neither trait says anything about transport: an oracle may be an in-process
// cipher, an HTTP endpoint or a recorded trace. Both do assume that the same
// input always yields the same relevant answer. Implementations that cannot
// promise that should override `is_deterministic`, and the attacks will refuse
// to run rather than produce garbage.

/// Encrypts `fixed_prefix || input || fixed_suffix` under a hidden key.
pub trait EncryptionOracle {
    fn encrypt(&self, input: &[u8]) -> Vec<u8>;

    fn is_deterministic(&self) -> bool {
        true
    }
}

/// Reports whether a block-aligned ciphertext of at least two blocks decrypts
/// to correctly PKCS#7 padded plaintext.
pub trait ValidityOracle {
    fn is_valid(&self, ciphertext: &[u8]) -> bool;

    fn is_deterministic(&self) -> bool {
        true
    }
}

impl<F> EncryptionOracle for F
where
    F: Fn(&[u8]) -> Vec<u8>,
{
    fn encrypt(&self, input: &[u8]) -> Vec<u8> {
        self(input)
    }
}

impl<F> ValidityOracle for F
where
    F: Fn(&[u8]) -> bool,
{
    fn is_valid(&self, ciphertext: &[u8]) -> bool {
        self(ciphertext)
    }
}
