//! Config file loading and CLI > file > default resolution.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use catalog_ingest_core::{BatchOptions, DatabaseOptions, HttpTimeouts, PipelineConfig};
use serde::Deserialize;

use crate::cli::Args;

const APP_DIR: &str = "catalog-ingest";

/// Database file used when neither the CLI nor the config file names one.
pub const DEFAULT_DATABASE_PATH: &str = "catalog.db";

/// TOML-backed defaults for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Catalog root the document locators are built from.
    pub catalog_base_url: Option<String>,
    /// SQLite database file.
    pub database: Option<PathBuf>,
    /// Attempts per document, first try included (1..=10).
    pub max_attempts: Option<u32>,
    /// Pause between attempts in milliseconds.
    pub retry_delay_ms: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    /// Identifiers between progress logs; 0 disables.
    pub progress_interval: Option<usize>,
    /// Pause after each progress log in milliseconds.
    pub batch_pause_ms: Option<u64>,
    /// Database pool max connections (1..=20).
    pub db_max_connections: Option<u32>,
    pub db_busy_timeout_ms: Option<u32>,
}

impl FileConfig {
    /// Checks every present value against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if let Some(base) = self.catalog_base_url.as_deref() {
            validate_base_url(base)?;
        }
        if let Some(max_attempts) = self.max_attempts
            && !(1..=10).contains(&max_attempts)
        {
            bail!("Invalid config value for `max_attempts`: {max_attempts}. Expected range: 1..=10");
        }
        validate_millis("retry_delay_ms", self.retry_delay_ms)?;
        validate_millis("batch_pause_ms", self.batch_pause_ms)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        if let Some(interval) = self.progress_interval
            && interval > 10_000
        {
            bail!(
                "Invalid config value for `progress_interval`: {interval}. Expected range: 0..=10000"
            );
        }
        if let Some(value) = self.db_max_connections
            && !(1..=20).contains(&value)
        {
            bail!("Invalid config value for `db_max_connections`: {value}. Expected range: 1..=20");
        }
        if let Some(value) = self.db_busy_timeout_ms
            && value > 120_000
        {
            bail!(
                "Invalid config value for `db_busy_timeout_ms`: {value}. Expected range: 0..=120000"
            );
        }
        Ok(())
    }
}

fn validate_base_url(raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw)
        .with_context(|| format!("Invalid config value for `catalog_base_url`: {raw}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("Invalid config value for `catalog_base_url`: {raw}. Expected an http(s) URL");
    }
    Ok(())
}

fn validate_millis(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if value > 60_000 {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 0..=60000");
    }
    Ok(())
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Where the config came from, if anywhere.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: Option<PathBuf>,
    pub config: Option<FileConfig>,
    pub loaded_from_file: bool,
}

/// Resolves the default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/catalog-ingest/config.toml`
/// 2. `$HOME/.config/catalog-ingest/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join("config.toml"));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads `explicit` when given (it must exist), else the default path if present.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let config = load_file_config(path)?;
        return Ok(LoadedConfig {
            path: Some(path.to_path_buf()),
            config: Some(config),
            loaded_from_file: true,
        });
    }

    let path = resolve_default_config_path();
    match path.as_deref() {
        Some(path_ref) if path_ref.exists() => {
            let config = load_file_config(path_ref)?;
            Ok(LoadedConfig {
                path,
                config: Some(config),
                loaded_from_file: true,
            })
        }
        _ => Ok(LoadedConfig {
            path,
            config: None,
            loaded_from_file: false,
        }),
    }
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let cfg: FileConfig = toml::from_str(raw)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Everything `main` needs to open the store and run the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub database: PathBuf,
    pub database_options: DatabaseOptions,
    pub pipeline: PipelineConfig,
    pub batch: BatchOptions,
}

/// Merges CLI flags over file values over built-in defaults.
pub fn resolve_settings(args: &Args, file: Option<&FileConfig>) -> Result<RunSettings> {
    let file = file.cloned().unwrap_or_default();
    let pipeline_defaults = PipelineConfig::default();
    let batch_defaults = BatchOptions::default();
    let db_defaults = DatabaseOptions::default();

    let catalog_base_url = args
        .base_url
        .clone()
        .or(file.catalog_base_url)
        .unwrap_or(pipeline_defaults.catalog_base_url);
    validate_base_url(&catalog_base_url).context("Invalid --base-url")?;

    let timeouts = HttpTimeouts {
        connect: file
            .connect_timeout_secs
            .map_or(pipeline_defaults.timeouts.connect, Duration::from_secs),
        read: file
            .read_timeout_secs
            .map_or(pipeline_defaults.timeouts.read, Duration::from_secs),
    };

    let pipeline = PipelineConfig {
        catalog_base_url,
        max_attempts: args
            .max_retries
            .or(file.max_attempts)
            .unwrap_or(pipeline_defaults.max_attempts),
        retry_delay: args
            .retry_delay
            .or(file.retry_delay_ms)
            .map_or(pipeline_defaults.retry_delay, Duration::from_millis),
        timeouts,
    };

    let batch = BatchOptions {
        progress_interval: args
            .progress_interval
            .or(file.progress_interval)
            .unwrap_or(batch_defaults.progress_interval),
        pause: args
            .pause
            .or(file.batch_pause_ms)
            .map_or(batch_defaults.pause, Duration::from_millis),
    };

    let database_options = DatabaseOptions {
        max_connections: file
            .db_max_connections
            .unwrap_or(db_defaults.max_connections),
        busy_timeout_ms: file
            .db_busy_timeout_ms
            .unwrap_or(db_defaults.busy_timeout_ms),
    };

    let database = args
        .database
        .clone()
        .or(file.database)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

    Ok(RunSettings {
        database,
        database_options,
        pipeline,
        batch,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["catalog-ingest", "ids.txt"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    // ==================== Parsing ====================

    #[test]
    fn test_parse_config_partial_fields() {
        let cfg = parse_config_str(
            r#"
max_attempts = 5
database = "/var/lib/catalog/catalog.db"
"#,
        )
        .unwrap();
        assert_eq!(cfg.max_attempts, Some(5));
        assert_eq!(
            cfg.database,
            Some(PathBuf::from("/var/lib/catalog/catalog.db"))
        );
        assert!(cfg.catalog_base_url.is_none());
    }

    #[test]
    fn test_parse_config_supports_comments() {
        let cfg = parse_config_str(
            r#"
# harvest settings
catalog_base_url = "https://catalogue.example.org" # mirror
progress_interval = 0
"#,
        )
        .unwrap();
        assert_eq!(
            cfg.catalog_base_url.as_deref(),
            Some("https://catalogue.example.org")
        );
        assert_eq!(cfg.progress_interval, Some(0));
    }

    #[test]
    fn test_parse_config_rejects_unknown_key() {
        let err = parse_config_str("concurrency = 4").unwrap_err();
        assert!(err.to_string().contains("concurrency"), "{err}");
    }

    #[test]
    fn test_parse_config_rejects_wrong_type() {
        assert!(parse_config_str("max_attempts = \"three\"").is_err());
        assert!(parse_config_str("retry_delay_ms = -1").is_err());
    }

    // ==================== Validation ====================

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let err = parse_config_str("max_attempts = 0").unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        for raw in [
            "retry_delay_ms = 60001",
            "batch_pause_ms = 60001",
            "connect_timeout_secs = 0",
            "read_timeout_secs = 3601",
            "progress_interval = 10001",
            "db_max_connections = 21",
            "db_busy_timeout_ms = 120001",
        ] {
            let field = raw.split_whitespace().next().unwrap();
            let err = parse_config_str(raw).unwrap_err();
            assert!(err.to_string().contains(field), "{raw}: {err}");
        }
    }

    #[test]
    fn test_validate_rejects_non_http_base_url() {
        assert!(parse_config_str(r#"catalog_base_url = "ftp://catalogue.example.org""#).is_err());
        assert!(parse_config_str(r#"catalog_base_url = "not a url""#).is_err());
    }

    // ==================== Loading ====================

    #[test]
    fn test_load_config_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_attempts = 2\n").unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert!(loaded.loaded_from_file);
        assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.unwrap().max_attempts, Some(2));
    }

    #[test]
    fn test_load_config_explicit_missing_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_config_reports_invalid_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "db_max_connections = 0\n").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("Failed to parse config file"));
        assert!(chain.contains("db_max_connections"));
    }

    // ==================== Resolution ====================

    #[test]
    fn test_resolve_settings_defaults() {
        let settings = resolve_settings(&args(&[]), None).unwrap();
        assert_eq!(settings.database, PathBuf::from(DEFAULT_DATABASE_PATH));
        assert_eq!(settings.pipeline, PipelineConfig::default());
        assert_eq!(settings.batch, BatchOptions::default());
        assert_eq!(settings.database_options, DatabaseOptions::default());
    }

    #[test]
    fn test_resolve_settings_file_overrides_defaults() {
        let file = FileConfig {
            max_attempts: Some(5),
            retry_delay_ms: Some(100),
            read_timeout_secs: Some(90),
            db_max_connections: Some(2),
            ..FileConfig::default()
        };
        let settings = resolve_settings(&args(&[]), Some(&file)).unwrap();
        assert_eq!(settings.pipeline.max_attempts, 5);
        assert_eq!(settings.pipeline.retry_delay, Duration::from_millis(100));
        assert_eq!(settings.pipeline.timeouts.read, Duration::from_secs(90));
        assert_eq!(settings.database_options.max_connections, 2);
    }

    #[test]
    fn test_resolve_settings_cli_overrides_file() {
        let file = FileConfig {
            catalog_base_url: Some("https://file.example.org".into()),
            database: Some(PathBuf::from("from-file.db")),
            max_attempts: Some(5),
            batch_pause_ms: Some(1000),
            ..FileConfig::default()
        };
        let cli = args(&[
            "--base-url",
            "http://127.0.0.1:9000",
            "--database",
            "from-cli.db",
            "-r",
            "1",
            "--pause",
            "0",
        ]);
        let settings = resolve_settings(&cli, Some(&file)).unwrap();
        assert_eq!(settings.pipeline.catalog_base_url, "http://127.0.0.1:9000");
        assert_eq!(settings.database, PathBuf::from("from-cli.db"));
        assert_eq!(settings.pipeline.max_attempts, 1);
        assert_eq!(settings.batch.pause, Duration::ZERO);
    }

    #[test]
    fn test_resolve_settings_rejects_bad_cli_base_url() {
        let cli = args(&["--base-url", "catalogue"]);
        assert!(resolve_settings(&cli, None).is_err());
    }
}
