//! Pure encode/decode of the scale wire protocol.
//!
//! Nothing in this module touches I/O, the clock, or persistence. Frames are
//! read and written explicitly big-endian, field by field -- we never lean
//! on struct packing to describe the wire format.

pub mod crc;
pub mod error;
pub mod response;
pub mod upload;

/// Upload frame header length in bytes (protocol version through auth code).
pub const HEADER_LEN: usize = 30;

/// Upload frame metadata section length in bytes.
pub const METADATA_LEN: usize = 16;

/// Length in bytes of a single measurement record.
pub const MEASUREMENT_LEN: usize = 32;

/// Measurement counts above this are rejected outright as nonsensical.
pub const MAX_MEASUREMENTS: usize = 64;

/// Trailer appended after the response CRC.
pub const RESPONSE_TRAILER: [u8; 2] = [0x66, 0x00];

pub use crc::crc16_xmodem;
pub use error::{CrcMismatch, DecodeError};
pub use response::{
    decode_response, encode_response, ResponseFrame, UserProfileBlock, WeightUnit, STATUS_OK,
    USER_SLOT_COUNT,
};
pub use upload::{decode_upload, encode_upload, extract_mac_best_effort, DecodedUpload, RawMeasurementRecord, UploadFrame};
