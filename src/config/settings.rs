use clap::ArgMatches;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::utils::error::ModbusError;

pub const DEFAULT_PORT: u16 = 502;
pub const DEFAULT_UNIT_ID: u8 = 1;
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
// Huawei inverters drop requests sent right after the TCP accept.
pub const DEFAULT_CONNECT_DELAY_MS: u64 = 2_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    // Target
    pub ip: String,
    pub port: u16,
    pub unit_id: u8,

    // Timing
    pub response_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    pub connect_delay_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ip: String::new(),
            port: DEFAULT_PORT,
            unit_id: DEFAULT_UNIT_ID,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            connect_delay_ms: DEFAULT_CONNECT_DELAY_MS,
        }
    }
}

impl SessionConfig {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            ..Self::default()
        }
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ModbusError> {
        let mut config = Self::default();

        config.ip = matches
            .get_one::<String>("ip")
            .cloned()
            .ok_or_else(|| ModbusError::ConfigError("--ip is required".to_string()))?;

        if let Some(port) = matches.get_one::<u16>("port") {
            config.port = *port;
        }
        if let Some(unit_id) = matches.get_one::<u8>("unit-id") {
            config.unit_id = *unit_id;
        }
        if let Some(timeout) = matches.get_one::<u64>("timeout") {
            config.response_timeout_ms = *timeout;
        }
        if let Some(timeout) = matches.get_one::<u64>("connect-timeout") {
            config.connect_timeout_ms = *timeout;
        }
        if let Some(delay) = matches.get_one::<u64>("connect-delay") {
            config.connect_delay_ms = *delay;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ModbusError> {
        if self.ip.trim().is_empty() {
            return Err(ModbusError::ConfigError("inverter host is empty".to_string()));
        }
        if self.response_timeout_ms == 0 {
            return Err(ModbusError::ConfigError("response timeout must be non-zero".to_string()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ModbusError::ConfigError("connect timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Target address when `ip` is a literal IPv4/IPv6 address.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.ip
            .trim()
            .parse::<IpAddr>()
            .ok()
            .map(|ip| SocketAddr::new(ip, self.port))
    }

    /// Target address, looking `ip` up through the system resolver when it
    /// is a hostname. The first resolved address wins.
    pub async fn resolve_addr(&self) -> Result<SocketAddr, ModbusError> {
        if let Some(addr) = self.socket_addr() {
            return Ok(addr);
        }

        let host = self.ip.trim();
        let mut addrs = tokio::net::lookup_host((host, self.port)).await.map_err(|e| {
            ModbusError::ConnectionError(format!("cannot resolve '{}': {}", host, e))
        })?;
        addrs
            .next()
            .ok_or_else(|| ModbusError::ConnectionError(format!("'{}' resolved to no address", host)))
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn connect_delay(&self) -> Duration {
        Duration::from_millis(self.connect_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("192.168.1.10");
        assert_eq!(config.port, 502);
        assert_eq!(config.unit_id, 1);
        assert_eq!(config.response_timeout(), Duration::from_secs(10));
        assert_eq!(config.connect_delay(), Duration::from_secs(2));
        assert_eq!(
            config.socket_addr().unwrap(),
            "192.168.1.10:502".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_ipv6_socket_addr() {
        let mut config = SessionConfig::new("::1");
        config.port = 1502;
        assert_eq!(config.socket_addr().unwrap().to_string(), "[::1]:1502");
    }

    #[test]
    fn test_hostname_passes_validation() {
        let config = SessionConfig::new("inverter.local");
        assert!(config.socket_addr().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_host_is_config_error() {
        let config = SessionConfig::new("   ");
        assert!(matches!(config.validate(), Err(ModbusError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_literal_ip_resolves_without_lookup() {
        let mut config = SessionConfig::new("::1");
        config.port = 1502;
        assert_eq!(config.resolve_addr().await.unwrap().to_string(), "[::1]:1502");
    }

    #[tokio::test]
    async fn test_localhost_resolves_to_loopback() {
        let mut config = SessionConfig::new("localhost");
        config.port = 1502;
        let addr = config.resolve_addr().await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 1502);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let mut config = SessionConfig::new("10.0.0.1");
        config.response_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
