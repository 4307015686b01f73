use std::fmt;

use crate::devices::MAX_READ_REGISTERS;
use crate::utils::error::ModbusError;

pub const READ_HOLDING_REGISTERS: u8 = 0x03;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub address: u16,
    pub count: u16,
}

impl ReadRequest {
    pub fn new(address: u16, count: u16) -> Result<Self, ModbusError> {
        if count == 0 || count > MAX_READ_REGISTERS {
            return Err(ModbusError::InvalidRequest(format!(
                "register count {} outside 1..={}",
                count, MAX_READ_REGISTERS
            )));
        }
        // The last register must still be addressable.
        if address as u32 + count as u32 - 1 > u16::MAX as u32 {
            return Err(ModbusError::InvalidRequest(format!(
                "{} registers from address {} run past 65535",
                count, address
            )));
        }
        Ok(Self { address, count })
    }

    pub fn expected_bytes(&self) -> usize {
        self.count as usize * 2
    }
}

impl fmt::Display for ReadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fc 0x{:02x} address {} count {}",
            READ_HOLDING_REGISTERS, self.address, self.count
        )
    }
}
