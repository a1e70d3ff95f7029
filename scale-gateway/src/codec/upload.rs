//! Upload frame: decode and (for tests/tools) re-encode.
//!
//! Layout is big-endian throughout, read explicitly field by field -- we do
//! not rely on struct packing to match the wire format. This module is the
//! only place that should know the byte layout.

use bytes::{Buf, BufMut, BytesMut};

use super::crc::crc16_xmodem;
use super::error::{CrcMismatch, DecodeError};
use super::{HEADER_LEN, MAX_MEASUREMENTS, MEASUREMENT_LEN, METADATA_LEN};

/// Protocol version this codec understands. Firmware variants that send
/// anything else are rejected at decode time.
pub const PROTOCOL_VERSION: u8 = 0x03;

/// A single measurement record as it appears on the wire, unvalidated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMeasurementRecord {
    pub measurement_id: u32,
    pub impedance_ohms: u16,
    pub weight_grams: u32,
    pub timestamp: u32,
    pub user_slot: u8,
    pub fat_raw_1: u16,
    pub fat_raw_2: u16,
    pub covariance: u16,
    /// Trailing reserved bytes, preserved verbatim for round-tripping.
    pub reserved: [u8; MEASUREMENT_LEN - 21],
}

/// A fully decoded upload frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFrame {
    pub protocol_version: u8,
    /// Firmware version as read from the header preamble (byte 2). Some
    /// firmware variants disagree with the metadata section's own firmware
    /// byte; both are kept rather than silently picking one.
    pub header_firmware_hint: u8,
    pub battery_percent: u8,
    pub mac: [u8; 6],
    /// 16 raw bytes starting at header offset 14, per §9's note that the
    /// authorization code straddles the header/metadata boundary in
    /// observed captures. `auth_code[0]` is the same wire byte as `mac[5]`.
    pub auth_code: [u8; 16],
    pub firmware_version: u8,
    pub scale_timestamp: u32,
    /// Measurement count as declared in the metadata section. May exceed
    /// `measurements.len()` if the frame was truncated.
    pub declared_measurement_count: u16,
    pub metadata_reserved: [u8; METADATA_LEN - 7],
    pub measurements: Vec<RawMeasurementRecord>,
}

impl UploadFrame {
    /// True if fewer measurement records were present than declared.
    pub fn truncated(&self) -> bool {
        self.measurements.len() < self.declared_measurement_count as usize
    }
}

/// Result of a successful decode: the frame plus a non-fatal CRC flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedUpload {
    pub frame: UploadFrame,
    pub crc_mismatch: Option<CrcMismatch>,
}

/// Best-effort MAC extraction for raw-upload logging before full decode.
///
/// Returns `None` if the buffer is too short even for that; the raw upload
/// row is then recorded with no MAC, which is acceptable since it will be
/// flagged `short_frame` anyway.
pub fn extract_mac_best_effort(data: &[u8]) -> Option<[u8; 6]> {
    data.get(9..15)?.try_into().ok()
}

/// Decode an upload frame from `data`.
///
/// Returns `Err` only for the hard-fail conditions in §4.1 (`short_frame`,
/// `bad_protocol_version`, `bad_measurement_count`). A CRC mismatch is
/// reported via `DecodedUpload::crc_mismatch`, not as an error -- the frame
/// is still processed.
pub fn decode_upload(data: &[u8]) -> Result<DecodedUpload, DecodeError> {
    if data.len() < HEADER_LEN + METADATA_LEN {
        return Err(DecodeError::ShortFrame {
            needed: HEADER_LEN + METADATA_LEN,
            got: data.len(),
        });
    }

    let mut header = &data[..HEADER_LEN];
    let protocol_version = header.get_u8();
    if protocol_version != PROTOCOL_VERSION {
        return Err(DecodeError::BadProtocolVersion(protocol_version));
    }

    // bytes 1..8: firmware preamble, firmware version lives at byte 2.
    let preamble = &data[1..8];
    let header_firmware_hint = preamble[1];

    let battery_percent = data[8];
    let mac: [u8; 6] = data[9..15].try_into().expect("slice length checked above");
    let auth_code: [u8; 16] = data[14..30].try_into().expect("slice length checked above");

    let metadata = &data[HEADER_LEN..HEADER_LEN + METADATA_LEN];
    let mut meta_cursor = metadata;
    let firmware_version = meta_cursor.get_u8();
    let scale_timestamp = meta_cursor.get_u32();
    let declared_measurement_count = meta_cursor.get_u16();

    if declared_measurement_count as usize > MAX_MEASUREMENTS {
        return Err(DecodeError::BadMeasurementCount(declared_measurement_count));
    }

    let mut metadata_reserved = [0u8; METADATA_LEN - 7];
    metadata_reserved.copy_from_slice(meta_cursor.chunk());

    let body_start = HEADER_LEN + METADATA_LEN;
    let body = &data[body_start..];
    let available_measurements = body.len() / MEASUREMENT_LEN;
    let to_read = available_measurements.min(declared_measurement_count as usize);

    let mut measurements = Vec::with_capacity(to_read);
    for i in 0..to_read {
        let rec = &body[i * MEASUREMENT_LEN..(i + 1) * MEASUREMENT_LEN];
        measurements.push(decode_measurement(rec));
    }

    let consumed = body_start + to_read * MEASUREMENT_LEN;
    let crc_mismatch = data
        .get(consumed..consumed + 2)
        .map(|crc_bytes| {
            let expected = u16::from_be_bytes([crc_bytes[0], crc_bytes[1]]);
            let computed = crc16_xmodem(&data[..consumed]);
            (expected, computed)
        })
        .filter(|(expected, computed)| expected != computed)
        .map(|(expected, computed)| CrcMismatch { expected, computed });

    Ok(DecodedUpload {
        frame: UploadFrame {
            protocol_version,
            header_firmware_hint,
            battery_percent,
            mac,
            auth_code,
            firmware_version,
            scale_timestamp,
            declared_measurement_count,
            metadata_reserved,
            measurements,
        },
        crc_mismatch,
    })
}

fn decode_measurement(rec: &[u8]) -> RawMeasurementRecord {
    let mut cursor = rec;
    let measurement_id = cursor.get_u32();
    let impedance_ohms = cursor.get_u16();
    let weight_grams = cursor.get_u32();
    let timestamp = cursor.get_u32();
    let user_slot = cursor.get_u8();
    let fat_raw_1 = cursor.get_u16();
    let fat_raw_2 = cursor.get_u16();
    let covariance = cursor.get_u16();
    let mut reserved = [0u8; MEASUREMENT_LEN - 21];
    reserved.copy_from_slice(cursor.chunk());

    RawMeasurementRecord {
        measurement_id,
        impedance_ohms,
        weight_grams,
        timestamp,
        user_slot,
        fat_raw_1,
        fat_raw_2,
        covariance,
        reserved,
    }
}

/// Re-encode a frame exactly as the wire format describes it.
///
/// Used by tests (`decode(encode(x)) == x`) and by `scale-dissect` to
/// reconstruct a frame after editing a field. Not used by the live server,
/// which only ever decodes scale-originated bytes.
pub fn encode_upload(frame: &UploadFrame) -> BytesMut {
    let mut buf = BytesMut::with_capacity(
        HEADER_LEN + METADATA_LEN + frame.measurements.len() * MEASUREMENT_LEN + 2,
    );

    buf.put_u8(frame.protocol_version);
    buf.put_u8(0); // byte 1: reserved
    buf.put_u8(frame.header_firmware_hint); // byte 2
    buf.put_bytes(0, 5); // bytes 3..8: reserved
    buf.put_u8(frame.battery_percent); // byte 8
    buf.put_slice(&frame.mac); // bytes 9..15
    // bytes 15..30: remaining 15 bytes of the header, derived from auth_code[1..16]
    // since auth_code[0] overlaps mac[5] (byte 14).
    buf.put_slice(&frame.auth_code[1..]);

    buf.put_u8(frame.firmware_version);
    buf.put_u32(frame.scale_timestamp);
    buf.put_u16(frame.declared_measurement_count);
    buf.put_slice(&frame.metadata_reserved);

    for m in &frame.measurements {
        buf.put_u32(m.measurement_id);
        buf.put_u16(m.impedance_ohms);
        buf.put_u32(m.weight_grams);
        buf.put_u32(m.timestamp);
        buf.put_u8(m.user_slot);
        buf.put_u16(m.fat_raw_1);
        buf.put_u16(m.fat_raw_2);
        buf.put_u16(m.covariance);
        buf.put_slice(&m.reserved);
    }

    let crc = crc16_xmodem(&buf);
    buf.put_u16(crc);

    buf
}
