use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;

use super::{Scenario, ScenarioError};

const EXTENSION: &str = "json";

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,127}$").expect("scenario name pattern is valid")
    })
}

/// Summary of a stored scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioInfo {
    pub name: String,
    pub records: usize,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

/// Scenario artifacts kept as `<root>/<name>.json`.
#[derive(Debug, Clone)]
pub struct ScenarioStore {
    root: PathBuf,
}

impl ScenarioStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store rooted at the data directory's `scenarios/` folder.
    pub fn open_default() -> Self {
        Self::new(crate::util::scenarios_dir())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a scenario name. A trailing `.json` is accepted and stripped.
    pub fn normalize_name(name: &str) -> Result<String, ScenarioError> {
        let trimmed = name.trim();
        let stem = trimmed
            .strip_suffix(".json")
            .unwrap_or(trimmed);
        if stem.contains("..") || !name_pattern().is_match(stem) {
            return Err(ScenarioError::InvalidName(name.to_string()));
        }
        Ok(stem.to_string())
    }

    pub fn path_for(&self, name: &str) -> Result<PathBuf, ScenarioError> {
        let stem = Self::normalize_name(name)?;
        Ok(self.root.join(format!("{stem}.{EXTENSION}")))
    }

    pub fn exists(&self, name: &str) -> Result<bool, ScenarioError> {
        Ok(self.path_for(name)?.is_file())
    }

    /// Path of an existing scenario, or `NotFound`.
    pub fn locate(&self, name: &str) -> Result<PathBuf, ScenarioError> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(ScenarioError::NotFound(name.to_string()));
        }
        Ok(path)
    }

    /// Resolve a CLI argument that may be either a file path or a stored name.
    pub fn resolve(&self, name_or_path: &str) -> Result<PathBuf, ScenarioError> {
        let candidate = Path::new(name_or_path);
        if candidate.is_file() {
            return Ok(candidate.to_path_buf());
        }
        self.locate(name_or_path)
    }

    /// Persist a scenario. Writes go to a sibling temp file that is renamed
    /// into place, so readers never observe a partial artifact.
    pub fn save(
        &self,
        name: &str,
        scenario: &Scenario,
        overwrite: bool,
    ) -> Result<PathBuf, ScenarioError> {
        let path = self.path_for(name)?;
        if !overwrite && path.exists() {
            return Err(ScenarioError::AlreadyExists(name.to_string()));
        }

        fs::create_dir_all(&self.root).map_err(|e| ScenarioError::io(&self.root, e))?;

        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));
        let bytes = scenario.to_pretty_json()?;
        fs::write(&tmp, bytes).map_err(|e| ScenarioError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| ScenarioError::io(&path, e))?;

        tracing::info!(
            path = %path.display(),
            records = scenario.len(),
            "saved scenario"
        );
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Scenario, ScenarioError> {
        let path = self.locate(name)?;
        Scenario::read_from_path(&path)
    }

    /// All stored scenarios, sorted by name. Unreadable artifacts are listed
    /// with zero records.
    pub fn list(&self) -> Result<Vec<ScenarioInfo>, ScenarioError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(ScenarioError::io(&self.root, e)),
        };

        let mut infos = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ScenarioError::io(&self.root, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let metadata = entry.metadata().ok();
            let records = match Scenario::read_from_path(&path) {
                Ok(scenario) => scenario.len(),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "unreadable scenario");
                    0
                }
            };

            infos.push(ScenarioInfo {
                name: name.to_string(),
                records,
                bytes: metadata.as_ref().map(|m| m.len()).unwrap_or(0),
                modified: metadata
                    .and_then(|m| m.modified().ok())
                    .map(DateTime::<Utc>::from),
            });
        }

        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }
}
