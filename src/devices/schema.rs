use serde::Serialize;
use std::fmt;

use crate::utils::error::ModbusError;

/// Largest register count a single Read Holding Registers request may carry.
pub const MAX_READ_REGISTERS: u16 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeRule {
    Ascii,
    Int16,
    Int32,
}

impl DecodeRule {
    /// Fixed register width, `None` for variable length text.
    pub fn register_width(&self) -> Option<u16> {
        match self {
            DecodeRule::Ascii => None,
            DecodeRule::Int16 => Some(1),
            DecodeRule::Int32 => Some(2),
        }
    }
}

impl fmt::Display for DecodeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeRule::Ascii => write!(f, "ascii"),
            DecodeRule::Int16 => write!(f, "int16"),
            DecodeRule::Int32 => write!(f, "int32"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterField {
    pub name: &'static str,
    pub address: u16,
    pub count: u16,
    pub rule: DecodeRule,
    pub unit: Option<&'static str>,
}

impl RegisterField {
    pub const fn new(name: &'static str, address: u16, count: u16, rule: DecodeRule) -> Self {
        Self {
            name,
            address,
            count,
            rule,
            unit: None,
        }
    }

    pub const fn with_unit(self, unit: &'static str) -> Self {
        Self {
            unit: Some(unit),
            ..self
        }
    }

    /// Number of payload bytes a successful read of this field returns.
    pub fn byte_len(&self) -> usize {
        self.count as usize * 2
    }

    pub fn validate(&self) -> Result<(), ModbusError> {
        if self.count == 0 || self.count > MAX_READ_REGISTERS {
            return Err(ModbusError::ConfigError(format!(
                "field '{}': register count {} outside 1..={}",
                self.name, self.count, MAX_READ_REGISTERS
            )));
        }

        if let Some(width) = self.rule.register_width() {
            if self.count != width {
                return Err(ModbusError::ConfigError(format!(
                    "field '{}': {} needs {} register(s), table says {}",
                    self.name, self.rule, width, self.count
                )));
            }
        }

        Ok(())
    }
}

/// Huawei SUN2000 identification and power registers, in read order.
pub const SUN2000_FIELDS: &[RegisterField] = &[
    RegisterField::new("Model", 30000, 15, DecodeRule::Ascii),
    RegisterField::new("Model ID", 30070, 1, DecodeRule::Int16),
    RegisterField::new("Serial number", 30015, 10, DecodeRule::Ascii),
    RegisterField::new("Rated power", 30073, 2, DecodeRule::Int32).with_unit("W"),
    RegisterField::new("Input power", 32064, 2, DecodeRule::Int32).with_unit("W"),
];

pub fn validate_schema(fields: &[RegisterField]) -> Result<(), ModbusError> {
    if fields.is_empty() {
        return Err(ModbusError::ConfigError("register schema is empty".to_string()));
    }
    fields.iter().try_for_each(RegisterField::validate)
}
