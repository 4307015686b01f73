use serde::Serialize;
use std::fmt;

use super::schema::DecodeRule;
use crate::utils::error::ModbusError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DecodedValue {
    Text(String),
    Int16(i16),
    Int32(i32),
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedValue::Text(s) => write!(f, "{}", s),
            DecodedValue::Int16(v) => write!(f, "{}", v),
            DecodedValue::Int32(v) => write!(f, "{}", v),
        }
    }
}

/// Decode a raw big-endian register payload.
///
/// Text fields drop trailing NUL padding and nothing else; bytes that are not
/// valid UTF-8 come out as U+FFFD. Integers are reported unscaled.
pub fn decode(data: &[u8], rule: DecodeRule) -> Result<DecodedValue, ModbusError> {
    match rule {
        DecodeRule::Ascii => decode_ascii(data),
        DecodeRule::Int16 => {
            let bytes: [u8; 2] = data.try_into().map_err(|_| length_error(rule, "2 bytes", data))?;
            Ok(DecodedValue::Int16(i16::from_be_bytes(bytes)))
        }
        DecodeRule::Int32 => {
            let bytes: [u8; 4] = data.try_into().map_err(|_| length_error(rule, "4 bytes", data))?;
            Ok(DecodedValue::Int32(i32::from_be_bytes(bytes)))
        }
    }
}

fn decode_ascii(data: &[u8]) -> Result<DecodedValue, ModbusError> {
    if data.is_empty() {
        return Err(length_error(DecodeRule::Ascii, "at least 1 byte", data));
    }
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    Ok(DecodedValue::Text(String::from_utf8_lossy(&data[..end]).into_owned()))
}

fn length_error(rule: DecodeRule, expected: &str, data: &[u8]) -> ModbusError {
    ModbusError::DecodeError {
        rule,
        expected: expected.to_string(),
        actual: data.len(),
    }
}

/// Flatten 16-bit register words into big-endian bytes.
pub fn registers_to_bytes(registers: &[u16]) -> Vec<u8> {
    registers.iter().flat_map(|r| r.to_be_bytes()).collect()
}
