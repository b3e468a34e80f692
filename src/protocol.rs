//! Frame encoding for the compact serial protocol.
//!
//! Value commands carry a 14-bit payload split over two bytes whose high bit
//! must stay clear: `[opcode, channel, low7, high7]`.

use crate::constants::*;
use crate::error::{Error, Result};

/// Truncates a scaled value to device units, rejecting anything outside `[0, 16384)`.
pub fn encode_value(scaled: f64) -> Result<u16> {
    if !scaled.is_finite() {
        return Err(Error::Encoding { value: scaled });
    }
    let value = scaled.trunc() as i64;
    if !(0..VALUE_LIMIT).contains(&value) {
        return Err(Error::Encoding { value: scaled });
    }
    Ok(value as u16)
}

pub fn split_value(value: u16) -> [u8; 2] {
    [
        (value & PAYLOAD_MASK) as u8,
        ((value >> 7) & PAYLOAD_MASK) as u8,
    ]
}

pub fn join_value(low: u8, high: u8) -> u16 {
    (low as u16 & PAYLOAD_MASK) | ((high as u16 & PAYLOAD_MASK) << 7)
}

pub fn value_command(cmd: u8, channel: u8, scaled: f64) -> Result<Vec<u8>> {
    let [low, high] = split_value(encode_value(scaled)?);
    Ok(vec![cmd, channel, low, high])
}

pub fn decode_u16_le(reply: &[u8]) -> u16 {
    reply[0] as u16 | ((reply[1] as u16) << 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_matches_14_bit_layout() {
        for value in [0u16, 1, 127, 128, 6000, 16383] {
            let [low, high] = split_value(value);
            assert!(low <= 127 && high <= 127);
            assert_eq!(value, low as u16 | ((high as u16) << 7));
            assert_eq!(join_value(low, high), value);
        }
    }

    #[test]
    fn encode_truncates_toward_zero() {
        assert_eq!(encode_value(6000.9).unwrap(), 6000);
        assert_eq!(encode_value(-0.5).unwrap(), 0);
        assert_eq!(encode_value(16383.99).unwrap(), 16383);
    }

    #[test]
    fn encode_rejects_out_of_range() {
        assert!(encode_value(16384.0).unwrap_err().is_encoding());
        assert!(encode_value(-1.0).unwrap_err().is_encoding());
        assert!(encode_value(f64::NAN).unwrap_err().is_encoding());
        assert!(encode_value(f64::INFINITY).unwrap_err().is_encoding());
    }

    #[test]
    fn set_target_frame_for_1500us() {
        // 1500us * 4 = 6000 = 0x1770
        let frame = value_command(CMD_SET_TARGET, 2, 6000.0).unwrap();
        assert_eq!(frame, vec![0x84, 0x02, 0x70, 0x2E]);
    }

    #[test]
    fn little_endian_reply() {
        assert_eq!(decode_u16_le(&[0x70, 0x17]), 6000);
    }
}
