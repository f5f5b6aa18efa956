//! Configuration for the kanban service.
//!
//! Settings are read from `kanban.toml` and layered as
//! defaults → file → environment → CLI flags.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8000
//! dev_mode = false
//!
//! [database]
//! path = ".kanban/kanban.db"
//!
//! [log]
//! level = "info"
//! format = "text"
//! dir = "/var/log/kanban"
//! ```
//!
//! The file is looked up in this order: the `--config` flag, then
//! `.kanban/kanban.toml` under the working directory, then
//! `kanban/kanban.toml` under the user's config directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::board::server::ServerConfig;

/// Directory holding the project-local config file and default database.
pub const KANBAN_DIR: &str = ".kanban";
pub const CONFIG_FILE: &str = "kanban.toml";

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Invalid log format '{}'. Valid values: text, json", s),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Adds permissive CORS for a separately served frontend.
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            dev_mode: false,
        }
    }
}

/// `[database]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from(KANBAN_DIR).join("kanban.db")
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// `[log]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSection {
    /// `EnvFilter` directive for this crate; `RUST_LOG` still wins.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// When set, logs are also written to a daily-rolling file here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            dir: None,
        }
    }
}

/// The complete kanban.toml structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KanbanToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub log: LogSection,
}

impl KanbanToml {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse kanban.toml")
    }

    /// Load `kanban.toml` from `dir`, or defaults if the file doesn't exist.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize kanban.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.host.trim().is_empty() {
            warnings.push("server.host is empty".to_string());
        }
        if self.server.port == 0 {
            warnings.push("server.port is 0: the OS will pick a random port".to_string());
        }
        if self.database.path.as_os_str().is_empty() {
            warnings.push("database.path is empty".to_string());
        }
        if tracing_subscriber::EnvFilter::try_new(&self.log.level).is_err() {
            warnings.push(format!(
                "Invalid log.level '{}': expected a level (e.g. 'info') or filter directive",
                self.log.level
            ));
        }
        if let Some(dir) = &self.log.dir
            && dir.is_file()
        {
            warnings.push(format!("log.dir '{}' is a file", dir.display()));
        }

        warnings
    }
}

/// Resolved configuration: the discovered file plus environment and CLI overrides.
#[derive(Debug, Clone, Default)]
pub struct KanbanConfig {
    /// Where the file layer came from, if any file was found.
    pub source: Option<PathBuf>,
    pub toml: KanbanToml,
}

impl KanbanConfig {
    /// Discover, load and apply process environment overrides.
    ///
    /// A `.env` file in the working directory is loaded first.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
        let mut config = Self::discover(&cwd, explicit)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Find and parse the config file without touching the environment.
    pub fn discover(cwd: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let toml = KanbanToml::load(path)?;
            return Ok(Self {
                source: Some(path.to_path_buf()),
                toml,
            });
        }

        let candidates = [
            Some(cwd.join(KANBAN_DIR).join(CONFIG_FILE)),
            dirs::config_dir().map(|d| d.join("kanban").join(CONFIG_FILE)),
        ];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                tracing::debug!(path = %path.display(), "Loading config file");
                let toml = KanbanToml::load(&path)?;
                return Ok(Self {
                    source: Some(path),
                    toml,
                });
            }
        }

        Ok(Self::default())
    }

    /// Apply `KANBAN_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(host) = lookup("KANBAN_HOST") {
            self.toml.server.host = host;
        }
        if let Some(port) = lookup("KANBAN_PORT") {
            self.toml.server.port = port
                .parse()
                .with_context(|| format!("Invalid KANBAN_PORT '{}'", port))?;
        }
        if let Some(path) = lookup("KANBAN_DB_PATH") {
            self.toml.database.path = PathBuf::from(path);
        }
        if let Some(format) = lookup("KANBAN_LOG_FORMAT") {
            self.toml.log.format = format.parse()?;
        }
        Ok(())
    }

    /// Database path (env/file → default).
    pub fn db_path(&self) -> &Path {
        &self.toml.database.path
    }

    /// Server settings before CLI flags are applied.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.toml.server.host.clone(),
            port: self.toml.server.port,
            db_path: self.toml.database.path.clone(),
            dev_mode: self.toml.server.dev_mode,
        }
    }

    /// Where `config init` writes a new file.
    pub fn init_path(cwd: &Path, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.join(KANBAN_DIR).join(CONFIG_FILE))
    }

    pub fn validate(&self) -> Vec<String> {
        self.toml.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_log_format_display_and_parse() {
        assert_eq!(LogFormat::Text.to_string(), "text");
        assert_eq!(LogFormat::Json.to_string(), "json");
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_defaults() {
        let toml = KanbanToml::default();
        assert_eq!(toml.server.host, "127.0.0.1");
        assert_eq!(toml.server.port, 8000);
        assert!(!toml.server.dev_mode);
        assert_eq!(toml.database.path, PathBuf::from(".kanban/kanban.db"));
        assert_eq!(toml.log.level, "info");
        assert_eq!(toml.log.format, LogFormat::Text);
        assert!(toml.log.dir.is_none());
    }

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let content = r#"
[server]
port = 9000

[log]
format = "json"
"#;
        let toml = KanbanToml::parse(content).unwrap();
        assert_eq!(toml.server.port, 9000);
        assert_eq!(toml.server.host, "127.0.0.1");
        assert_eq!(toml.log.format, LogFormat::Json);
        assert_eq!(toml.database.path, PathBuf::from(".kanban/kanban.db"));
    }

    #[test]
    fn test_parse_rejects_bad_format() {
        let content = r#"
[log]
format = "xml"
"#;
        assert!(KanbanToml::parse(content).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut toml = KanbanToml::default();
        toml.server.port = 8123;
        toml.log.dir = Some(PathBuf::from("/tmp/kanban-logs"));
        toml.save(&path).unwrap();

        let loaded = KanbanToml::load(&path).unwrap();
        assert_eq!(loaded.server.port, 8123);
        assert_eq!(loaded.log.dir, Some(PathBuf::from("/tmp/kanban-logs")));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let toml = KanbanToml::load_or_default(dir.path()).unwrap();
        assert_eq!(toml.server.port, 8000);
    }

    #[test]
    fn test_validate_flags_bad_values() {
        let mut toml = KanbanToml::default();
        assert!(toml.validate().is_empty());

        toml.server.host = " ".to_string();
        toml.server.port = 0;
        toml.log.level = "kanban=loud".to_string();
        let warnings = toml.validate();
        assert_eq!(warnings.len(), 3, "{:?}", warnings);
        assert!(warnings.iter().any(|w| w.contains("log.level")));
    }

    #[test]
    fn test_discover_prefers_explicit_path() {
        let dir = tempdir().unwrap();
        let local_dir = dir.path().join(KANBAN_DIR);
        std::fs::create_dir_all(&local_dir).unwrap();
        std::fs::write(local_dir.join(CONFIG_FILE), "[server]\nport = 1111\n").unwrap();
        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "[server]\nport = 2222\n").unwrap();

        let config = KanbanConfig::discover(dir.path(), Some(&explicit)).unwrap();
        assert_eq!(config.toml.server.port, 2222);
        assert_eq!(config.source, Some(explicit));

        let config = KanbanConfig::discover(dir.path(), None).unwrap();
        assert_eq!(config.toml.server.port, 1111);
    }

    #[test]
    fn test_discover_explicit_missing_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(KanbanConfig::discover(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = KanbanConfig::default();
        config
            .apply_env(env(&[
                ("KANBAN_HOST", "0.0.0.0"),
                ("KANBAN_PORT", "9100"),
                ("KANBAN_DB_PATH", "/data/board.db"),
                ("KANBAN_LOG_FORMAT", "json"),
            ]))
            .unwrap();

        let server = config.server_config();
        assert_eq!(server.host, "0.0.0.0");
        assert_eq!(server.port, 9100);
        assert_eq!(server.db_path, PathBuf::from("/data/board.db"));
        assert_eq!(config.toml.log.format, LogFormat::Json);
    }

    #[test]
    fn test_env_bad_port_is_error() {
        let mut config = KanbanConfig::default();
        let err = config
            .apply_env(env(&[("KANBAN_PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("KANBAN_PORT"));
    }

    #[test]
    fn test_load_reads_process_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[server]\nport = 7000\n").unwrap();

        let saved = std::env::var("KANBAN_PORT").ok();
        unsafe { std::env::set_var("KANBAN_PORT", "7001") };

        let config = KanbanConfig::load(Some(&path)).unwrap();
        assert_eq!(config.toml.server.port, 7001);

        match saved {
            Some(val) => unsafe { std::env::set_var("KANBAN_PORT", val) },
            None => unsafe { std::env::remove_var("KANBAN_PORT") },
        }
    }

    #[test]
    fn test_init_path() {
        let cwd = Path::new("/work");
        assert_eq!(
            KanbanConfig::init_path(cwd, None),
            PathBuf::from("/work/.kanban/kanban.toml")
        );
        let explicit = Path::new("/etc/kanban.toml");
        assert_eq!(
            KanbanConfig::init_path(cwd, Some(explicit)),
            PathBuf::from("/etc/kanban.toml")
        );
    }
}
