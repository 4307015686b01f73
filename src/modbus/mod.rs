pub mod client;
pub mod protocol;
#[cfg(test)]
pub mod mock;

pub use client::{RegisterSession, TcpSession};
pub use protocol::{ReadRequest, READ_HOLDING_REGISTERS};
