use thiserror::Error;

use crate::devices::DecodeRule;

#[derive(Error, Debug)]
pub enum ModbusError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Communication error: {0}")]
    CommunicationError(String),

    #[error("Timeout occurred: no response from device")]
    Timeout,

    #[error("Device returned exception {}", describe_exception(.code))]
    DeviceProtocolError { code: u8 },

    #[error("Invalid response from device: expected {expected} registers, got {actual}")]
    InvalidResponse { expected: usize, actual: usize },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Cannot decode {actual} bytes as {rule}: expected {expected}")]
    DecodeError {
        rule: DecodeRule,
        expected: String,
        actual: usize,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ModbusError {
    /// Short stable name, used in JSON reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ModbusError::ConnectionError(_) => "connection",
            ModbusError::CommunicationError(_) => "communication",
            ModbusError::Timeout => "timeout",
            ModbusError::DeviceProtocolError { .. } => "device_exception",
            ModbusError::InvalidResponse { .. } => "invalid_response",
            ModbusError::InvalidRequest(_) => "invalid_request",
            ModbusError::DecodeError { .. } => "decode",
            ModbusError::ConfigError(_) => "config",
            ModbusError::SerializationError(_) => "serialization",
        }
    }
}

fn describe_exception(code: &u8) -> String {
    format!("0x{:02X} ({})", code, exception_name(*code))
}

/// Standard Modbus exception code names.
pub fn exception_name(code: u8) -> &'static str {
    match code {
        0x01 => "illegal function",
        0x02 => "illegal data address",
        0x03 => "illegal data value",
        0x04 => "server device failure",
        0x05 => "acknowledge",
        0x06 => "server device busy",
        0x08 => "memory parity error",
        0x0A => "gateway path unavailable",
        0x0B => "gateway target device failed to respond",
        _ => "unknown exception",
    }
}

impl From<std::io::Error> for ModbusError {
    fn from(err: std::io::Error) -> Self {
        ModbusError::CommunicationError(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for ModbusError {
    fn from(err: serde_json::Error) -> Self {
        ModbusError::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for ModbusError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        ModbusError::Timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_exception_message_names_the_code() {
        let err = ModbusError::DeviceProtocolError { code: 0x02 };
        assert_eq!(
            err.to_string(),
            "Device returned exception 0x02 (illegal data address)"
        );
        assert_eq!(err.kind(), "device_exception");
    }

    #[test]
    fn test_decode_error_message() {
        let err = ModbusError::DecodeError {
            rule: DecodeRule::Int32,
            expected: "4 bytes".to_string(),
            actual: 3,
        };
        assert_eq!(err.to_string(), "Cannot decode 3 bytes as int32: expected 4 bytes");
    }

    #[test]
    fn test_json_error_converts_to_serialization_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{\"state\":").unwrap_err();
        let err: ModbusError = json_err.into();
        assert!(matches!(err, ModbusError::SerializationError(_)));
        assert_eq!(err.kind(), "serialization");
        assert!(err.to_string().starts_with("Serialization error: JSON error:"));
    }

    #[test]
    fn test_unknown_exception_code() {
        assert_eq!(exception_name(0x7F), "unknown exception");
    }
}
