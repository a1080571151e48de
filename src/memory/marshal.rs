//! Conversion between in-heap big-endian bytes and stack words
//!
//! The interpreter stores multi-byte values big-endian regardless of
//! the host. These conversions rebuild a native `i32` stack word from
//! 1, 2 or 4 stored bytes and write a stack word back.

use std::fmt;

/// Number of stored bytes making up a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Width {
    Byte = 1,
    Short = 2,
    Int = 4,
}

impl Width {
    /// Byte count
    pub fn bytes(self) -> usize {
        self as usize
    }

    /// Width for a byte count, if it is one of 1, 2 or 4
    pub fn for_size(size: usize) -> Option<Width> {
        match size {
            1 => Some(Width::Byte),
            2 => Some(Width::Short),
            4 => Some(Width::Int),
            _ => None,
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

/// Rebuild a stack word from big-endian bytes, sign extending 1 and 2
/// byte values
///
/// Panics if `bytes` is shorter than `width`.
pub fn word_from_bytes(bytes: &[u8], width: Width) -> i32 {
    match width {
        Width::Byte => i32::from(bytes[0] as i8),
        Width::Short => i32::from(i16::from_be_bytes([bytes[0], bytes[1]])),
        Width::Int => int_from_bytes(bytes),
    }
}

/// Rebuild a stack word from big-endian bytes, zero extending 1 and 2
/// byte values
///
/// Panics if `bytes` is shorter than `width`.
pub fn unsigned_word_from_bytes(bytes: &[u8], width: Width) -> i32 {
    match width {
        Width::Byte => i32::from(bytes[0]),
        Width::Short => i32::from(u16::from_be_bytes([bytes[0], bytes[1]])),
        Width::Int => int_from_bytes(bytes),
    }
}

/// Store the low `width` bytes of a stack word big-endian
///
/// Panics if `out` is shorter than `width`.
pub fn bytes_from_word(word: i32, width: Width, out: &mut [u8]) {
    let native = word.to_ne_bytes();
    let n = width.bytes();
    for (i, byte) in out[..n].iter_mut().enumerate() {
        *byte = if cfg!(target_endian = "little") {
            native[n - 1 - i]
        } else {
            native[native.len() - n + i]
        };
    }
}

fn int_from_bytes(bytes: &[u8]) -> i32 {
    let mut native = [0u8; 4];
    if cfg!(target_endian = "little") {
        for (i, byte) in bytes[..4].iter().enumerate() {
            native[3 - i] = *byte;
        }
    } else {
        native.copy_from_slice(&bytes[..4]);
    }
    i32::from_ne_bytes(native)
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    pub fn test_sign_extension() {
        assert_eq!(word_from_bytes(&[0xff], Width::Byte), -1);
        assert_eq!(word_from_bytes(&[0x7f], Width::Byte), 127);
        assert_eq!(word_from_bytes(&[0x80, 0x00], Width::Short), -32768);
        assert_eq!(word_from_bytes(&[0x01, 0x02], Width::Short), 0x0102);
    }

    #[test]
    pub fn test_zero_extension() {
        assert_eq!(unsigned_word_from_bytes(&[0xff], Width::Byte), 255);
        assert_eq!(unsigned_word_from_bytes(&[0xff, 0xfe], Width::Short), 0xfffe);
    }

    #[test]
    pub fn test_int_is_big_endian() {
        assert_eq!(
            word_from_bytes(&[0x11, 0x22, 0x33, 0x44], Width::Int),
            0x1122_3344
        );
        assert_eq!(word_from_bytes(&[0xff, 0xff, 0xff, 0xfe], Width::Int), -2);
    }

    #[test]
    pub fn test_store_writes_low_bytes_big_endian() {
        let mut out = [0u8; 4];
        bytes_from_word(0x1122_3344, Width::Int, &mut out);
        assert_eq!(out, [0x11, 0x22, 0x33, 0x44]);

        let mut out = [0u8; 2];
        bytes_from_word(0x1122_3344, Width::Short, &mut out);
        assert_eq!(out, [0x33, 0x44]);

        let mut out = [0u8; 1];
        bytes_from_word(-1, Width::Byte, &mut out);
        assert_eq!(out, [0xff]);
    }

    #[test]
    pub fn test_store_then_load_truncates_like_narrowing() {
        let mut out = [0u8; 2];
        bytes_from_word(70000, Width::Short, &mut out);
        assert_eq!(word_from_bytes(&out, Width::Short), 70000_i32 as i16 as i32);
    }

    #[test]
    pub fn test_widths() {
        assert_eq!(Width::for_size(2), Some(Width::Short));
        assert_eq!(Width::for_size(8), None);
        assert_eq!(Width::Int.bytes(), 4);
    }
}
