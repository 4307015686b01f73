pub mod settings;

pub use settings::{
    SessionConfig,
    DEFAULT_CONNECT_DELAY_MS,
    DEFAULT_CONNECT_TIMEOUT_MS,
    DEFAULT_PORT,
    DEFAULT_RESPONSE_TIMEOUT_MS,
    DEFAULT_UNIT_ID,
};
