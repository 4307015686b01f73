use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::services::{DiagnosticReport, FieldReading, RunState};
use crate::utils::error::ModbusError;

pub trait ReportFormatter: Send + Sync {
    /// Line emitted as soon as a field is decoded, if this format streams.
    fn format_reading(&self, reading: &FieldReading) -> Option<String>;

    /// Text emitted once the run has finished, if any.
    fn format_report(&self, report: &DiagnosticReport) -> Result<Option<String>, ModbusError>;

    /// Text for an error raised before the run could start, if this format
    /// renders one. The `Error:` line on stderr is printed regardless.
    fn format_error(&self, error: &ModbusError) -> Result<Option<String>, ModbusError>;
}

/// `<label>: [<value>]`, one line per field.
#[derive(Debug, Default)]
pub struct ConsoleFormatter {
    pub show_raw: bool,
}

impl ConsoleFormatter {
    pub fn new(show_raw: bool) -> Self {
        Self { show_raw }
    }
}

impl ReportFormatter for ConsoleFormatter {
    fn format_reading(&self, reading: &FieldReading) -> Option<String> {
        let mut line = format!("{}: [{}]", reading.name, reading.display_value());
        if self.show_raw {
            line.push_str(&format!(" (raw 0x{})", reading.raw_hex));
        }
        Some(line)
    }

    fn format_report(&self, _report: &DiagnosticReport) -> Result<Option<String>, ModbusError> {
        // Readings were already streamed; failures go to stderr via main.
        Ok(None)
    }

    fn format_error(&self, _error: &ModbusError) -> Result<Option<String>, ModbusError> {
        Ok(None)
    }
}

pub struct JsonFormatter;

impl JsonFormatter {
    fn render(
        timestamp: DateTime<Utc>,
        state: RunState,
        readings: &[FieldReading],
        failure: Value,
    ) -> Result<Option<String>, ModbusError> {
        let result = json!({
            "timestamp": timestamp.to_rfc3339(),
            "state": state,
            "readings": readings,
            "failure": failure,
        });

        Ok(Some(serde_json::to_string_pretty(&result)?))
    }
}

impl ReportFormatter for JsonFormatter {
    fn format_reading(&self, _reading: &FieldReading) -> Option<String> {
        None
    }

    fn format_report(&self, report: &DiagnosticReport) -> Result<Option<String>, ModbusError> {
        let failure = report.failure.as_ref().map(|f| {
            json!({
                "field": f.field.as_ref().map(|field| field.name),
                "kind": f.error.kind(),
                "message": f.to_string(),
            })
        });

        Self::render(
            report.started_at,
            report.state,
            &report.readings,
            failure.unwrap_or(Value::Null),
        )
    }

    fn format_error(&self, error: &ModbusError) -> Result<Option<String>, ModbusError> {
        let failure = json!({
            "field": Value::Null,
            "kind": error.kind(),
            "message": error.to_string(),
        });

        Self::render(Utc::now(), RunState::Failed, &[], failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{DecodedValue, SUN2000_FIELDS};
    use crate::modbus::mock::{MockReply, MockSession};
    use crate::services::DiagnosticService;

    fn reading(name: &'static str, value: DecodedValue, unit: Option<&'static str>) -> FieldReading {
        FieldReading {
            name,
            address: 30000,
            count: 2,
            unit,
            value,
            raw_hex: "00002710".to_string(),
        }
    }

    #[test]
    fn test_console_line_format() {
        let formatter = ConsoleFormatter::default();
        assert_eq!(
            formatter
                .format_reading(&reading("Model", DecodedValue::Text("SUN2000-10KTL".into()), None))
                .unwrap(),
            "Model: [SUN2000-10KTL]"
        );
        assert_eq!(
            formatter
                .format_reading(&reading("Rated power", DecodedValue::Int32(10_000), Some("W")))
                .unwrap(),
            "Rated power: [10000 W]"
        );
    }

    #[test]
    fn test_console_raw_suffix() {
        let formatter = ConsoleFormatter::new(true);
        assert_eq!(
            formatter
                .format_reading(&reading("Model ID", DecodedValue::Int16(5), None))
                .unwrap(),
            "Model ID: [5] (raw 0x00002710)"
        );
    }

    #[tokio::test]
    async fn test_json_report_carries_failure() {
        let session = MockSession::new()
            .with_payload(30000, b"SUN2000".to_vec().into_iter().chain([0u8; 23]).collect())
            .with_failure(30070, MockReply::Exception(0x02));

        let mut service = DiagnosticService::new(SUN2000_FIELDS);
        let report = service.run(async { Ok::<_, ModbusError>(session) }, |_| {}).await;

        let text = JsonFormatter.format_report(&report).unwrap().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed["state"], "failed");
        assert_eq!(parsed["readings"][0]["name"], "Model");
        assert_eq!(parsed["readings"][0]["value"], "SUN2000");
        assert_eq!(parsed["failure"]["field"], "Model ID");
        assert_eq!(parsed["failure"]["kind"], "device_exception");
        assert!(JsonFormatter.format_reading(&report.readings[0]).is_none());
    }

    #[tokio::test]
    async fn test_json_report_for_completed_run_has_null_failure() {
        let mut service = DiagnosticService::new(SUN2000_FIELDS);
        let report = service
            .run(async { Ok::<_, ModbusError>(MockSession::new()) }, |_| {})
            .await;

        let text = JsonFormatter.format_report(&report).unwrap().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed["state"], "completed");
        assert_eq!(parsed["readings"].as_array().unwrap().len(), 5);
        assert!(parsed["failure"].is_null());
    }

    #[test]
    fn test_json_startup_error_is_a_failed_report() {
        let err = ModbusError::ConfigError("inverter host is empty".to_string());
        let text = JsonFormatter.format_error(&err).unwrap().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed["state"], "failed");
        assert!(parsed["readings"].as_array().unwrap().is_empty());
        assert!(parsed["failure"]["field"].is_null());
        assert_eq!(parsed["failure"]["kind"], "config");
        assert_eq!(
            parsed["failure"]["message"],
            "Configuration error: inverter host is empty"
        );
    }

    #[test]
    fn test_console_leaves_errors_to_stderr() {
        let err = ModbusError::Timeout;
        assert!(ConsoleFormatter::default().format_error(&err).unwrap().is_none());
    }
}
