pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader, validate};
pub use schema::{
    ComposerConfig, ContextConfig, EngineConfig, RecordConfig, SynthesisConfig, TrackerConfig,
};
