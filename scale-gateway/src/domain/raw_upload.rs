//! Raw upload records.

use time::OffsetDateTime;

/// The verbatim bytes of one inbound `/scale/upload` request, retained for
/// debugging regardless of parse outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct RawUpload {
    pub id: i64,
    pub received_at: OffsetDateTime,
    /// Best-effort MAC extracted before full decode; absent if the buffer
    /// was too short even for that.
    pub scale_mac: Option<String>,
    pub request_bytes: Vec<u8>,
    pub response_bytes: Vec<u8>,
    pub parse_ok: bool,
    /// Comma-joined decode/validation flags (`crc_mismatch`,
    /// `weight_out_of_range`, ...), or `None` if the frame was clean.
    pub error: Option<String>,
}
