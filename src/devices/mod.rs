pub mod schema;
pub mod decoder;

pub use schema::{validate_schema, DecodeRule, RegisterField, MAX_READ_REGISTERS, SUN2000_FIELDS};
pub use decoder::{decode, registers_to_bytes, DecodedValue};
