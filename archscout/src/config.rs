use config::{Config as ConfigBuilder, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::archive::DEFAULT_MAX_FILE_SIZE;
use crate::errors::{SearchError, SearchResult};

/// Number of scanning workers per search call unless configured otherwise
pub const DEFAULT_WORKERS: usize = 8;

/// Engine and snapshot settings.
///
/// Loaded from YAML, in order of increasing precedence:
/// 1. `$CONFIG_DIR/archscout/config.yaml`
/// 2. `.archscout.yaml` in the current directory
/// 3. a file passed explicitly (the CLI's `--config`)
///
/// ```yaml
/// workers: 8
/// max_file_size: 524288
/// file_extensions: ["rs", "go"]
/// ignore_patterns: ["vendor/**"]
/// timeout: "10s"
/// log_level: "info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Scanning workers per search call
    #[serde(default = "default_workers")]
    pub workers: NonZeroUsize,

    /// Files larger than this many bytes are left out of the snapshot
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Optional list of file extensions to include (e.g., ["rs", "toml"])
    #[serde(default)]
    pub file_extensions: Option<Vec<String>>,

    /// Glob patterns, relative to the snapshot root, to leave out
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// Search deadline in humantime notation ("250ms", "5s")
    #[serde(default)]
    pub timeout: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_workers() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_WORKERS).unwrap_or(NonZeroUsize::MIN)
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_file_size: default_max_file_size(),
            file_extensions: None,
            ignore_patterns: Vec::new(),
            timeout: None,
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Loads configuration from the default locations
    pub fn load() -> SearchResult<Self> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> SearchResult<Self> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            dirs::config_dir().map(|p| p.join("archscout/config.yaml")),
            Some(PathBuf::from(".archscout.yaml")),
        ];
        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }
        // An explicitly requested file must exist.
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Parses the configured timeout
    pub fn timeout(&self) -> SearchResult<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|t| {
                humantime::parse_duration(t)
                    .map_err(|e| SearchError::config_error(format!("invalid timeout {:?}: {}", t, e)))
            })
            .transpose()
    }

    /// Overrides file values with the ones given on the command line
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        if let Some(workers) = cli.workers {
            self.workers = workers;
        }
        if let Some(max_file_size) = cli.max_file_size {
            self.max_file_size = max_file_size;
        }
        if cli.file_extensions.is_some() {
            self.file_extensions = cli.file_extensions;
        }
        if !cli.ignore_patterns.is_empty() {
            self.ignore_patterns = cli.ignore_patterns;
        }
        if cli.timeout.is_some() {
            self.timeout = cli.timeout;
        }
        if let Some(log_level) = cli.log_level {
            self.log_level = log_level;
        }
        self
    }
}

/// Values given on the command line; `None`/empty means "not given"
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub workers: Option<NonZeroUsize>,
    pub max_file_size: Option<u64>,
    pub file_extensions: Option<Vec<String>>,
    pub ignore_patterns: Vec<String>,
    pub timeout: Option<String>,
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("config.yaml");
        let mut file = File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
            workers: 4
            max_file_size: 1024
            file_extensions: ["rs", "toml"]
            ignore_patterns: ["target/*"]
            timeout: "2s"
            log_level: "debug"
        "#,
        );

        let config = SearchConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.workers, NonZeroUsize::new(4).unwrap());
        assert_eq!(config.max_file_size, 1024);
        assert_eq!(
            config.file_extensions,
            Some(vec!["rs".to_string(), "toml".to_string()])
        );
        assert_eq!(config.ignore_patterns, vec!["target/*".to_string()]);
        assert_eq!(config.timeout().unwrap(), Some(Duration::from_secs(2)));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_default_values() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "log_level: \"warn\"\n");

        let config = SearchConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.workers.get(), DEFAULT_WORKERS);
        assert_eq!(config.max_file_size, 512 * 1024);
        assert_eq!(config.file_extensions, None);
        assert!(config.ignore_patterns.is_empty());
        assert_eq!(config.timeout().unwrap(), None);
    }

    #[test]
    fn test_merge_with_cli() {
        let file_config = SearchConfig {
            workers: NonZeroUsize::new(4).unwrap(),
            file_extensions: Some(vec!["rs".to_string()]),
            ignore_patterns: vec!["target/*".to_string()],
            ..SearchConfig::default()
        };
        let cli = CliOverrides {
            workers: NonZeroUsize::new(2),
            ignore_patterns: vec!["*.tmp".to_string()],
            timeout: Some("500ms".to_string()),
            ..CliOverrides::default()
        };

        let merged = file_config.merge_with_cli(cli);
        assert_eq!(merged.workers.get(), 2);
        assert_eq!(merged.file_extensions, Some(vec!["rs".to_string()]));
        assert_eq!(merged.ignore_patterns, vec!["*.tmp".to_string()]);
        assert_eq!(merged.timeout().unwrap(), Some(Duration::from_millis(500)));
        assert_eq!(merged.log_level, "warn");
    }

    #[test]
    fn test_invalid_config() {
        let dir = tempdir().unwrap();
        let path = write_config(&dir, "workers: \"many\"\nmax_file_size: []\n");
        let result = SearchConfig::load_from(Some(&path));
        assert!(matches!(result, Err(SearchError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_timeout() {
        let config = SearchConfig {
            timeout: Some("soon".to_string()),
            ..SearchConfig::default()
        };
        assert!(config.timeout().is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = SearchConfig::load_from(Some(Path::new("nonexistent.yaml")));
        assert!(result.is_err());
    }
}
