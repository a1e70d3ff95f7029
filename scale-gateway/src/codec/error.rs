//! Decode-time errors for the upload frame codec.

/// Errors produced while decoding an upload frame.
///
/// None of these, on their own, prevent the server from answering the scale
/// with a well-formed response (see [`crate::ingest`]); they are recorded on
/// the raw upload row so the operator can diagnose firmware variance.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Fewer bytes were present than the frame's own header/metadata declared.
    #[error("frame too short: need at least {needed} bytes, got {got}")]
    ShortFrame { needed: usize, got: usize },

    /// Byte 0 was not the only protocol version this codec understands (3).
    #[error("unsupported protocol version {0:#x}")]
    BadProtocolVersion(u8),

    /// The declared measurement count exceeds the sanity ceiling.
    #[error("measurement count {0} exceeds maximum of {max}", max = super::MAX_MEASUREMENTS)]
    BadMeasurementCount(u16),
}

/// Non-fatal decode warning: the frame parsed, but its CRC did not match.
///
/// Kept distinct from [`DecodeError`] because it never aborts decoding --
/// firmware variance means some scales in the field send frames with a
/// stale or miscalculated CRC, and the frame must still be processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrcMismatch {
    pub expected: u16,
    pub computed: u16,
}
