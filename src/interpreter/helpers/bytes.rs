//! Byte-preserving text
//!
//! Shell values are Rust strings, but the data flowing through a shell is
//! arbitrary bytes. Input that is not valid UTF-8 is decoded with each
//! stray byte (0x80..=0xFF) mapped onto a private-use code point
//! `U+10FF00 + byte`; encoding maps those code points back to the raw
//! byte. Valid UTF-8 passes through unchanged both ways.

use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

const RAW_BYTE_BASE: u32 = 0x10FF00;

/// The character standing for a raw byte
pub fn raw_byte_char(byte: u8) -> char {
    if byte.is_ascii() {
        return char::from(byte);
    }
    char::from_u32(RAW_BYTE_BASE + u32::from(byte)).unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn raw_byte_of(c: char) -> Option<u8> {
    let code = u32::from(c);
    if (RAW_BYTE_BASE + 0x80..=RAW_BYTE_BASE + 0xFF).contains(&code) {
        u8::try_from(code - RAW_BYTE_BASE).ok()
    } else {
        None
    }
}

/// Decode bytes into shell text without losing any byte
pub fn decode_bytes(mut bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                text.push_str(valid);
                return text;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                // valid_up_to marks a prefix that is known to be UTF-8
                text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let bad = e.error_len().unwrap_or(rest.len());
                text.extend(rest[..bad].iter().map(|b| raw_byte_char(*b)));
                bytes = &rest[bad..];
            }
        }
    }
}

/// Encode shell text back into the bytes it stands for
pub fn encode_text(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    let mut buf = [0u8; 4];
    for c in text.chars() {
        match raw_byte_of(c) {
            Some(b) => bytes.push(b),
            None => bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes()),
        }
    }
    bytes
}

/// Shell text as an argument, environment entry or file name
pub fn to_os_string(text: &str) -> OsString {
    OsString::from_vec(encode_text(text))
}

pub fn to_path(text: &str) -> PathBuf {
    PathBuf::from(to_os_string(text))
}

/// Decode an OS string (environment entries, paths) into shell text
pub fn from_os_string(text: OsString) -> String {
    decode_bytes(&text.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_passes_through() {
        let text = "héllo wörld ✓";
        assert_eq!(decode_bytes(text.as_bytes()), text);
        assert_eq!(encode_text(text), text.as_bytes());
    }

    #[test]
    fn test_invalid_bytes_survive() {
        let input = [b'a', 0xFF, b'b', 0xC3, 0xE2, 0x82];
        let text = decode_bytes(&input);
        assert_eq!(text.chars().count(), 6);
        assert!(text.starts_with('a'));
        assert_eq!(encode_text(&text), input);
    }

    #[test]
    fn test_raw_byte_char() {
        assert_eq!(raw_byte_char(b'A'), 'A');
        assert_eq!(encode_text(&raw_byte_char(0xFF).to_string()), vec![0xFF]);
        assert_eq!(to_os_string("x\u{10FFFF}").into_vec(), vec![b'x', 0xFF]);
    }
}
