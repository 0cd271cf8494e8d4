//! Configuration module

pub mod settings;

pub use settings::{
    BackendConfig, FetchConfig, GenerationConfig, LoggingConfig, RateLimitConfig, ServerConfig,
    Settings, StorageConfig,
};
