mod settings;

pub use settings::{
    Config, IngestSettings, ReplaySettings, SearchSettings, ServerSettings, EXAMPLE_CONFIG,
};
