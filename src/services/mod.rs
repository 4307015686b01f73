pub mod diagnostic_service;

pub use diagnostic_service::{
    read_field, DiagnosticReport, DiagnosticService, FieldReading, RunFailure, RunState,
};
