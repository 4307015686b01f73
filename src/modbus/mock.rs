//! Scripted in-memory session for runner tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::client::RegisterSession;
use super::protocol::ReadRequest;
use crate::utils::error::ModbusError;

#[derive(Debug, Clone, Copy)]
pub enum MockReply {
    Timeout,
    Exception(u8),
}

#[derive(Default)]
pub struct MockSession {
    payloads: HashMap<u16, Vec<u8>>,
    failures: HashMap<u16, MockReply>,
    calls: Arc<Mutex<Vec<ReadRequest>>>,
    closed: Arc<Mutex<u32>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, address: u16, payload: Vec<u8>) -> Self {
        self.payloads.insert(address, payload);
        self
    }

    pub fn with_failure(mut self, address: u16, reply: MockReply) -> Self {
        self.failures.insert(address, reply);
        self
    }

    /// Shared log of every request the session received.
    pub fn calls(&self) -> Arc<Mutex<Vec<ReadRequest>>> {
        Arc::clone(&self.calls)
    }

    /// Shared counter of `close` calls.
    pub fn close_count(&self) -> Arc<Mutex<u32>> {
        Arc::clone(&self.closed)
    }
}

#[async_trait]
impl RegisterSession for MockSession {
    async fn read_registers(&mut self, address: u16, count: u16) -> Result<Vec<u8>, ModbusError> {
        let request = ReadRequest::new(address, count)?;
        self.calls.lock().unwrap().push(request);

        match self.failures.get(&address) {
            Some(MockReply::Timeout) => return Err(ModbusError::Timeout),
            Some(MockReply::Exception(code)) => {
                return Err(ModbusError::DeviceProtocolError { code: *code })
            }
            None => {}
        }

        // Unscripted addresses read as zeroed registers.
        Ok(self
            .payloads
            .get(&address)
            .cloned()
            .unwrap_or_else(|| vec![0; request.expected_bytes()]))
    }

    async fn close(&mut self) {
        *self.closed.lock().unwrap() += 1;
    }
}
