//! CRC-16/XMODEM over upload and response frame payloads.

use crc_all::CrcAlgo;

/// Calculates CRC-16/XMODEM over a slice of bytes.
///
/// Polynomial 0x1021, initial value 0x0000, no input/output reflection,
/// no output XOR. This is the variant the scale firmware expects on both
/// the upload frame it sends and the response frame it validates.
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc = CRC16_INIT;
    CRC16.update_crc(&mut crc, data);
    CRC16.finish_crc(&crc)
}

const CRC16_INIT: u16 = 0x0000;

const CRC16: CrcAlgo<u16> = CrcAlgo::<u16>::new(
    0x1021,     // polynomial
    16,         // width
    CRC16_INIT, // init
    0,          // xorout
    false,      // reflect
);
