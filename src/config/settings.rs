use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::sanitize::SanitizationRules;
use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// HTTP server bind and CORS settings
    pub server: ServerSettings,
    /// Remote search API settings
    pub search: SearchSettings,
    /// Ingestion endpoint settings used during replay
    pub ingest: IngestSettings,
    /// Replay concurrency and back-pressure
    pub replay: ReplaySettings,
    /// Rules applied to captures that do not bring their own
    pub sanitize: SanitizationRules,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Allow any origin. When false, only `allowed_origins` may call the API.
    pub cors_permissive: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_permissive: true,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Request header that carries the search token
    pub token_header: String,
    /// Maximum hits requested per search
    pub fetch_limit: u32,
    pub timeout_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            token_header: "fluencytoken".to_string(),
            fetch_limit: 1000,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Prefix of the `Authorization` header value, followed by the token
    pub auth_scheme: String,
    pub timeout_secs: u64,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            auth_scheme: "Splunk".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySettings {
    /// Progress frames buffered per replay. 1 means each delivery waits for
    /// the observer to take the previous frame.
    pub channel_capacity: usize,
    /// Replays allowed to run at once
    pub max_concurrent: usize,
}

impl Default for ReplaySettings {
    fn default() -> Self {
        Self {
            channel_capacity: 1,
            max_concurrent: 4,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub cors_permissive: Option<bool>,
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlSearchConfig {
    pub token_header: Option<String>,
    pub fetch_limit: Option<u32>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlIngestConfig {
    pub auth_scheme: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlReplayConfig {
    pub channel_capacity: Option<usize>,
    pub max_concurrent: Option<usize>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub server: Option<TomlServerConfig>,
    pub search: Option<TomlSearchConfig>,
    pub ingest: Option<TomlIngestConfig>,
    pub replay: Option<TomlReplayConfig>,
    pub sanitize: Option<SanitizationRules>,
}

impl Config {
    /// Load configuration from file, merging with defaults.
    ///
    /// A missing file is created from the bundled example. An unreadable or
    /// invalid file is reported and the defaults are used.
    pub fn load() -> Self {
        let config_file = config_path();

        // Create example config on first run
        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        let contents = match fs::read_to_string(&config_file) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(
                    path = %config_file.display(),
                    error = %e,
                    "Failed to read config, using defaults"
                );
                return Config::default();
            }
        };

        match Self::from_toml_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %config_file.display(),
                    error = %e,
                    "Invalid config, using defaults"
                );
                Config::default()
            }
        }
    }

    /// Parse a config document and merge it over the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        let toml_config: TomlConfig = toml::from_str(contents)?;
        let mut config = Config::default();
        config.merge(toml_config);
        Ok(config)
    }

    fn merge(&mut self, toml_config: TomlConfig) {
        if let Some(server) = toml_config.server {
            if let Some(host) = server.host {
                self.server.host = host;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(permissive) = server.cors_permissive {
                self.server.cors_permissive = permissive;
            }
            if let Some(origins) = server.allowed_origins {
                self.server.allowed_origins = origins;
            }
        }

        if let Some(search) = toml_config.search {
            if let Some(header) = search.token_header {
                self.search.token_header = header;
            }
            if let Some(limit) = search.fetch_limit {
                self.search.fetch_limit = limit;
            }
            if let Some(timeout) = search.timeout_secs {
                self.search.timeout_secs = timeout;
            }
        }

        if let Some(ingest) = toml_config.ingest {
            if let Some(scheme) = ingest.auth_scheme {
                self.ingest.auth_scheme = scheme;
            }
            if let Some(timeout) = ingest.timeout_secs {
                self.ingest.timeout_secs = timeout;
            }
        }

        if let Some(replay) = toml_config.replay {
            if let Some(capacity) = replay.channel_capacity {
                // A zero-capacity channel cannot be built.
                self.replay.channel_capacity = capacity.max(1);
            }
            if let Some(max) = replay.max_concurrent {
                self.replay.max_concurrent = max.max(1);
            }
        }

        if let Some(rules) = toml_config.sanitize {
            self.sanitize = rules;
        }
    }

    /// Create the default config file from the bundled example
    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(
                    path = %parent.display(),
                    error = %e,
                    "Failed to create config directory"
                );
                return;
            }
        }

        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to write default config");
        }
    }

    pub fn with_bind(mut self, host: Option<String>, port: Option<u16>) -> Self {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self
    }
}
