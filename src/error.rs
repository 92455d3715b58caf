/// Failures reported by the padding codec and the oracle attacks.
///
/// Calibration and recovery never return partial plaintext: an attack either
/// yields every byte it set out to recover or one of these errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttackError {
    /// The byte-at-a-time attack was pointed at an oracle that is not ECB.
    #[error("oracle ciphertext shows no ECB block repetition")]
    ModeMismatch,

    /// A discovery loop did not stabilise within its probe or retry bound.
    #[error("{stage} did not stabilise within {limit} attempts")]
    CalibrationFailure { stage: &'static str, limit: usize },

    /// No candidate in the alphabet reproduced the target ECB block.
    #[error("no candidate byte matched suffix position {position}")]
    ByteNotFound { position: usize },

    /// Every forged predecessor was rejected by the validity oracle.
    #[error("no candidate produced valid padding at block {block}, byte {position}")]
    NoValidPadding { block: usize, position: usize },

    #[error("invalid pkcs7 padding")]
    InvalidPadding,

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
