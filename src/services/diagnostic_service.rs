use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Serialize;
use std::fmt;
use std::future::Future;

use crate::devices::{decode, validate_schema, DecodedValue, RegisterField};
use crate::modbus::RegisterSession;
use crate::utils::error::ModbusError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    NotStarted,
    Connecting,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldReading {
    pub name: &'static str,
    pub address: u16,
    pub count: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    pub value: DecodedValue,
    pub raw_hex: String,
}

impl FieldReading {
    /// Value as shown to the operator, with the unit appended when known.
    pub fn display_value(&self) -> String {
        match self.unit {
            Some(unit) => format!("{} {}", self.value, unit),
            None => self.value.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct RunFailure {
    /// `None` when the run failed before any field was attempted.
    pub field: Option<RegisterField>,
    pub error: ModbusError,
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(
                f,
                "reading '{}' (address {}, {} registers) failed: {}",
                field.name, field.address, field.count, self.error
            ),
            None => write!(f, "{}", self.error),
        }
    }
}

#[derive(Debug)]
pub struct DiagnosticReport {
    pub started_at: DateTime<Utc>,
    pub state: RunState,
    pub readings: Vec<FieldReading>,
    pub failure: Option<RunFailure>,
}

impl DiagnosticReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            state: RunState::NotStarted,
            readings: Vec::new(),
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == RunState::Completed
    }

    pub fn reading(&self, name: &str) -> Option<&FieldReading> {
        self.readings.iter().find(|r| r.name == name)
    }
}

/// Walks a register schema against one session, stopping at the first error.
pub struct DiagnosticService<'a> {
    fields: &'a [RegisterField],
    state: RunState,
}

impl<'a> DiagnosticService<'a> {
    pub fn new(fields: &'a [RegisterField]) -> Self {
        Self {
            fields,
            state: RunState::NotStarted,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Open a session with `connect`, read every field in order and hand each
    /// reading to `on_reading` as soon as it is decoded.
    ///
    /// The session is closed before returning, whatever the outcome.
    pub async fn run<S, C, F>(&mut self, connect: C, mut on_reading: F) -> DiagnosticReport
    where
        S: RegisterSession,
        C: Future<Output = Result<S, ModbusError>>,
        F: FnMut(&FieldReading),
    {
        let mut report = DiagnosticReport::new();

        if let Err(e) = validate_schema(self.fields) {
            return self.fail(report, None, e);
        }

        self.state = RunState::Connecting;
        let mut session = match connect.await {
            Ok(session) => session,
            Err(e) => return self.fail(report, None, e),
        };

        self.state = RunState::Running;
        let outcome = self.read_fields(&mut session, &mut report, &mut on_reading).await;
        session.close().await;

        match outcome {
            Ok(()) => {
                info!("✅ All {} fields read", report.readings.len());
                self.state = RunState::Completed;
                report.state = RunState::Completed;
                report
            }
            Err((field, e)) => self.fail(report, Some(field), e),
        }
    }

    async fn read_fields<S, F>(
        &self,
        session: &mut S,
        report: &mut DiagnosticReport,
        on_reading: &mut F,
    ) -> Result<(), (RegisterField, ModbusError)>
    where
        S: RegisterSession,
        F: FnMut(&FieldReading),
    {
        for field in self.fields {
            let reading = read_field(session, field)
                .await
                .map_err(|e| (field.clone(), e))?;
            on_reading(&reading);
            report.readings.push(reading);
        }
        Ok(())
    }

    fn fail(
        &mut self,
        mut report: DiagnosticReport,
        field: Option<RegisterField>,
        error: ModbusError,
    ) -> DiagnosticReport {
        let failure = RunFailure { field, error };
        error!("❌ Diagnostic run failed: {}", failure);
        self.state = RunState::Failed;
        report.state = RunState::Failed;
        report.failure = Some(failure);
        report
    }
}

/// Read and decode a single schema field.
pub async fn read_field<S: RegisterSession>(
    session: &mut S,
    field: &RegisterField,
) -> Result<FieldReading, ModbusError> {
    let raw = session.read_registers(field.address, field.count).await?;
    if raw.len() != field.byte_len() {
        return Err(ModbusError::DecodeError {
            rule: field.rule,
            expected: format!("{} bytes", field.byte_len()),
            actual: raw.len(),
        });
    }
    let value = decode(&raw, field.rule)?;

    Ok(FieldReading {
        name: field.name,
        address: field.address,
        count: field.count,
        unit: field.unit,
        value,
        raw_hex: hex::encode(&raw),
    })
}
