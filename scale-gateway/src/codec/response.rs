//! Response frame: the byte-exact acknowledgment the scale validates.
//!
//! If this doesn't round-trip through the scale's own parser bit for bit,
//! the scale treats the upload as failed and retries indefinitely -- so
//! this module has no room for "close enough."

use bytes::{BufMut, BytesMut};

use super::crc::crc16_xmodem;
use super::RESPONSE_TRAILER;

/// Unit the response's weight fields (and the management API's formatting)
/// are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnit {
    Kg,
    Lbs,
    Stones,
}

impl WeightUnit {
    fn wire_value(self) -> u8 {
        match self {
            WeightUnit::Kg => 0,
            WeightUnit::Lbs => 1,
            WeightUnit::Stones => 2,
        }
    }
}

/// One of the 8 user profile slots embedded in every response.
///
/// `None` serializes as a zero-filled 13-byte block, matching an empty slot.
///
/// # Open question
///
/// The source material disagrees on whether min/max weight or age/gender
/// come first in the 13-byte block. This implementation emits them as
/// slot, height, age, gender, min weight, max weight. If a captured
/// successful response ever shows a different order, fix it here -- this
/// is the only place the layout is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserProfileBlock {
    pub slot: u8,
    pub height_mm: u16,
    pub age: u8,
    pub gender: u8,
    pub min_weight_grams: u32,
    pub max_weight_grams: u32,
}

/// Byte length of a single user profile block on the wire.
pub const USER_BLOCK_LEN: usize = 13;

/// Number of user profile slots transmitted in every response.
pub const USER_SLOT_COUNT: usize = 8;

impl UserProfileBlock {
    fn write(self, buf: &mut BytesMut) {
        buf.put_u8(self.slot);
        buf.put_u16(self.height_mm);
        buf.put_u8(self.age);
        buf.put_u8(self.gender);
        buf.put_u32(self.min_weight_grams);
        buf.put_u32(self.max_weight_grams);
    }

    fn write_empty(slot: u8, buf: &mut BytesMut) {
        buf.put_u8(slot);
        buf.put_bytes(0, USER_BLOCK_LEN - 1);
    }
}

/// A fully specified response frame, ready to encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub server_timestamp: u32,
    pub unit: ResponseUnit,
    /// 0 = OK. This implementation never emits a nonzero status: §9 warns
    /// against emitting undocumented values, and `store_unavailable` is
    /// surfaced as an HTTP 503 instead of a response body (see `ingest`).
    pub status: u8,
    /// Exactly 8 entries, in slot order 0..7. `None` means an empty slot.
    pub users: [Option<UserProfileBlock>; USER_SLOT_COUNT],
}

/// Wire-level alias kept distinct from [`WeightUnit`] so callers constructing
/// a [`ResponseFrame`] read naturally (`ResponseUnit` is what goes on the
/// wire; [`WeightUnit`] is what the rest of the crate reasons about).
pub type ResponseUnit = WeightUnit;

/// Status byte meaning the scale should treat the upload as accepted.
pub const STATUS_OK: u8 = 0;

/// Encode a response frame: body, CRC, trailer.
pub fn encode_response(frame: &ResponseFrame) -> BytesMut {
    let mut buf = BytesMut::with_capacity(4 + 1 + 1 + USER_SLOT_COUNT * USER_BLOCK_LEN + 2 + 2);

    buf.put_u32(frame.server_timestamp);
    buf.put_u8(frame.unit.wire_value());
    buf.put_u8(frame.status);

    for slot in &frame.users {
        match slot {
            Some(block) => block.write(&mut buf),
            None => UserProfileBlock::write_empty(0, &mut buf),
        }
    }

    let crc = crc16_xmodem(&buf);
    buf.put_u16(crc);
    buf.put_slice(&RESPONSE_TRAILER);

    buf
}

/// Decode a response frame (used by tests and `scale-dissect` to verify a
/// captured or locally built response is well-formed).
pub fn decode_response(data: &[u8]) -> Option<ResponseFrame> {
    let body_len = 4 + 1 + 1 + USER_SLOT_COUNT * USER_BLOCK_LEN;
    if data.len() != body_len + 2 + 2 {
        return None;
    }
    if data[data.len() - 2..] != RESPONSE_TRAILER {
        return None;
    }

    let crc_offset = body_len;
    let expected_crc = u16::from_be_bytes([data[crc_offset], data[crc_offset + 1]]);
    if crc16_xmodem(&data[..body_len]) != expected_crc {
        return None;
    }

    let server_timestamp = u32::from_be_bytes(data[0..4].try_into().ok()?);
    let unit = match data[4] {
        0 => WeightUnit::Kg,
        1 => WeightUnit::Lbs,
        2 => WeightUnit::Stones,
        _ => return None,
    };
    let status = data[5];

    let mut users = [None; USER_SLOT_COUNT];
    for (i, user) in users.iter_mut().enumerate() {
        let off = 6 + i * USER_BLOCK_LEN;
        let block = &data[off..off + USER_BLOCK_LEN];
        if block.iter().all(|b| *b == 0) {
            continue;
        }
        *user = Some(UserProfileBlock {
            slot: block[0],
            height_mm: u16::from_be_bytes([block[1], block[2]]),
            age: block[3],
            gender: block[4],
            min_weight_grams: u32::from_be_bytes(block[5..9].try_into().ok()?),
            max_weight_grams: u32::from_be_bytes(block[9..13].try_into().ok()?),
        });
    }

    Some(ResponseFrame {
        server_timestamp,
        unit,
        status,
        users,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResponseFrame {
        let mut users = [None; USER_SLOT_COUNT];
        users[0] = Some(UserProfileBlock {
            slot: 0,
            height_mm: 1650,
            age: 30,
            gender: 0,
            min_weight_grams: 40_000,
            max_weight_grams: 90_000,
        });
        users[3] = Some(UserProfileBlock {
            slot: 3,
            height_mm: 1800,
            age: 35,
            gender: 1,
            min_weight_grams: 50_000,
            max_weight_grams: 110_000,
        });
        ResponseFrame {
            server_timestamp: 1_705_315_900,
            unit: WeightUnit::Kg,
            status: STATUS_OK,
            users,
        }
    }

    #[test]
    fn encoded_frame_has_valid_crc_and_trailer() {
        let encoded = encode_response(&sample());
        let body = &encoded[..encoded.len() - 4];
        let crc_bytes = &encoded[encoded.len() - 4..encoded.len() - 2];
        let crc = u16::from_be_bytes([crc_bytes[0], crc_bytes[1]]);
        assert_eq!(crc16_xmodem(body), crc);
        assert_eq!(&encoded[encoded.len() - 2..], &RESPONSE_TRAILER);
    }

    #[test]
    fn round_trips() {
        let frame = sample();
        let encoded = encode_response(&frame);
        let decoded = decode_response(&encoded).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn empty_slots_are_zero_filled() {
        let frame = sample();
        let encoded = encode_response(&frame);
        // Slot 1 (index 1) is empty; its 13-byte block starts right after
        // the 6-byte header (timestamp + unit + status).
        let block = &encoded[6 + USER_BLOCK_LEN..6 + 2 * USER_BLOCK_LEN];
        assert!(block.iter().all(|b| *b == 0));
    }

    #[test]
    fn frame_always_carries_eight_slots() {
        let encoded = encode_response(&sample());
        let expected_len = 4 + 1 + 1 + USER_SLOT_COUNT * USER_BLOCK_LEN + 2 + 2;
        assert_eq!(encoded.len(), expected_len);
    }
}
