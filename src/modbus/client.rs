use async_trait::async_trait;
use log::{debug, error, info, warn};
use std::time::Duration;
use tokio_modbus::client::{tcp, Client, Context, Reader};
use tokio_modbus::Slave;

use super::protocol::ReadRequest;
use crate::config::SessionConfig;
use crate::devices::registers_to_bytes;
use crate::utils::error::ModbusError;

#[async_trait]
pub trait RegisterSession: Send {
    /// Read `count` holding registers starting at `address`.
    ///
    /// Returns exactly `count * 2` bytes, registers in big-endian order.
    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u8>, ModbusError>;

    /// Release the connection. Calling it twice is a no-op.
    async fn close(&mut self);
}

/// One Modbus TCP connection to one inverter.
pub struct TcpSession {
    ctx: Option<Context>,
    response_timeout: Duration,
}

impl TcpSession {
    pub async fn connect(config: &SessionConfig) -> Result<Self, ModbusError> {
        let socket_addr = config.resolve_addr().await?;
        info!("🔌 Connecting to Modbus TCP device {} (unit {})", socket_addr, config.unit_id);

        let ctx = match tokio::time::timeout(
            config.connect_timeout(),
            tcp::connect_slave(socket_addr, Slave(config.unit_id)),
        )
        .await
        {
            Ok(Ok(ctx)) => ctx,
            Ok(Err(e)) => {
                error!("❌ Failed to connect to {}: {}", socket_addr, e);
                return Err(ModbusError::ConnectionError(format!(
                    "cannot connect to {}: {}",
                    socket_addr, e
                )));
            }
            Err(_) => {
                error!("⏰ Connect to {} timed out", socket_addr);
                return Err(ModbusError::ConnectionError(format!(
                    "no connection to {} within {:?}",
                    socket_addr,
                    config.connect_timeout()
                )));
            }
        };

        let delay = config.connect_delay();
        if !delay.is_zero() {
            debug!("Waiting {:?} for the device to settle", delay);
            tokio::time::sleep(delay).await;
        }

        info!("Modbus TCP connection established");
        Ok(Self {
            ctx: Some(ctx),
            response_timeout: config.response_timeout(),
        })
    }
}

#[async_trait]
impl RegisterSession for TcpSession {
    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u8>, ModbusError> {
        let request = ReadRequest::new(address, count)?;
        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| ModbusError::CommunicationError("session is closed".to_string()))?;

        info!("📊 Reading {} registers starting at address {}", count, address);

        let registers = match tokio::time::timeout(
            self.response_timeout,
            ctx.read_holding_registers(address, count),
        )
        .await
        {
            Ok(Ok(Ok(registers))) => registers,
            Ok(Ok(Err(exception))) => {
                let code = u8::from(exception);
                warn!("Device rejected {}: exception 0x{:02x}", request, code);
                return Err(ModbusError::DeviceProtocolError { code });
            }
            Ok(Err(e)) => {
                error!("❌ Transport failure on {}: {}", request, e);
                return Err(ModbusError::CommunicationError(e.to_string()));
            }
            Err(elapsed) => {
                error!("⏰ No response to {} within {:?}", request, self.response_timeout);
                return Err(elapsed.into());
            }
        };

        if registers.len() != count as usize {
            return Err(ModbusError::InvalidResponse {
                expected: count as usize,
                actual: registers.len(),
            });
        }

        let bytes = registers_to_bytes(&registers);
        debug!("Raw payload for {}: {}", request, hex::encode(&bytes));
        Ok(bytes)
    }

    async fn close(&mut self) {
        if let Some(mut ctx) = self.ctx.take() {
            if let Err(e) = ctx.disconnect().await {
                warn!("Error while disconnecting: {}", e);
            }
            info!("Modbus TCP connection closed");
        }
    }
}
