//! Inverter Modbus TCP check
//!
//! Connects to a single solar inverter over Modbus TCP, reads a fixed table of
//! identification and power registers with function 0x03, and decodes them into
//! text and signed integers for a quick on-site sanity check.

pub mod config;
pub mod modbus;
pub mod devices;
pub mod services;
pub mod output;
pub mod utils;
pub mod cli;

// Re-export commonly used types
pub use config::SessionConfig;
pub use devices::{decode, DecodeRule, DecodedValue, RegisterField, SUN2000_FIELDS};
pub use modbus::{RegisterSession, TcpSession};
pub use output::{ConsoleFormatter, JsonFormatter, ReportFormatter};
pub use services::{DiagnosticReport, DiagnosticService, FieldReading, RunState};
pub use utils::error::ModbusError;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
