//! Byte → text decoding for source files.

use serde::{Deserialize, Serialize};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Text encoding of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// Detect from byte order marks, then UTF-8, falling back to Latin-1.
    #[default]
    Auto,
    /// Strict UTF-8 (a leading BOM is skipped).
    Utf8,
    /// ISO-8859-1; every byte is one character.
    Latin1,
    /// UTF-16, little endian unless a big-endian BOM is present.
    Utf16,
}

/// Decode `bytes` into text.
///
/// The error is a human-readable reason; callers attach the source path.
pub fn decode(bytes: &[u8], encoding: TextEncoding) -> Result<String, String> {
    match encoding {
        TextEncoding::Auto => decode_auto(bytes),
        TextEncoding::Utf8 => decode_utf8(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)),
        TextEncoding::Latin1 => Ok(decode_latin1(bytes)),
        TextEncoding::Utf16 => {
            if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
                decode_utf16(rest, u16::from_be_bytes)
            } else {
                decode_utf16(bytes.strip_prefix(UTF16_LE_BOM).unwrap_or(bytes), u16::from_le_bytes)
            }
        }
    }
}

fn decode_auto(bytes: &[u8]) -> Result<String, String> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return decode_utf8(rest);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes);
    }
    if let Some(offset) = bytes.iter().position(|&b| b == 0) {
        return Err(format!(
            "binary content: NUL byte at offset {offset} and no UTF-16 byte order mark"
        ));
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_owned()),
        Err(_) => {
            tracing::debug!("source is not valid UTF-8; decoding as Latin-1");
            Ok(decode_latin1(bytes))
        }
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()))
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, String> {
    if bytes.len() % 2 != 0 {
        return Err(format!("UTF-16 input has odd length {}", bytes.len()));
    }
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| format!("invalid UTF-16: unpaired surrogate 0x{:04X}", e.unpaired_surrogate()))
}
