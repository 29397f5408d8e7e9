use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_CATALOG_PATH: &str = "library.json";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub version: u32,
    pub music_root: String,
    pub catalog_path: String,
    pub port: u16,
    pub bind_addr: String,
    /// Value for `Access-Control-Allow-Origin`; empty sends no CORS headers.
    pub cors_origin: String,
    pub rescan_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            music_root: "".to_string(),
            catalog_path: DEFAULT_CATALOG_PATH.to_string(),
            port: DEFAULT_PORT,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            cors_origin: "".to_string(),
            rescan_on_start: false,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("BLASTER_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

/// Reads the config at `path`, filling blank fields with defaults. A missing
/// file is created with defaults; the flag tells whether that happened.
pub fn load_or_create_config(path: &Path) -> Result<(ServerConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ServerConfig = serde_yaml::from_str(&contents)?;
        if config.version < CONFIG_VERSION {
            config.version = CONFIG_VERSION;
        }
        if config.catalog_path.trim().is_empty() {
            config.catalog_path = DEFAULT_CATALOG_PATH.to_string();
        }
        if config.bind_addr.trim().is_empty() {
            config.bind_addr = DEFAULT_BIND_ADDR.to_string();
        }
        if config.port == 0 {
            config.port = DEFAULT_PORT;
        }
        config.cors_origin = config.cors_origin.trim().to_string();
        return Ok((config, false));
    }

    let config = ServerConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

pub fn save_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Resolves `value` against the directory holding the config file.
pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}

pub fn resolve_music_root(config_path: &Path, value: &str) -> Option<PathBuf> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(resolve_path(config_path, trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::{load_or_create_config, resolve_music_root, resolve_path, ServerConfig};
    use std::path::{Path, PathBuf};

    #[test]
    fn creates_default_config_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.yaml");

        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(created);
        assert!(path.exists());
        assert_eq!(config, ServerConfig::default());

        let (reloaded, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(reloaded, config);
    }

    #[test]
    fn fills_blank_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "music_root: /music\ncatalog_path: ''\nport: 0\ncors_origin: ' http://127.0.0.1:8081 '\n",
        )
        .unwrap();

        let (config, created) = load_or_create_config(&path).unwrap();
        assert!(!created);
        assert_eq!(config.music_root, "/music");
        assert_eq!(config.catalog_path, "library.json");
        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.cors_origin, "http://127.0.0.1:8081");
        assert_eq!(config.listen_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn rejects_malformed_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "port: [not a number\n").unwrap();
        assert!(load_or_create_config(&path).is_err());
    }

    #[test]
    fn resolves_relative_paths_against_config_dir() {
        let config = Path::new("/srv/blaster/config.yaml");
        assert_eq!(
            resolve_path(config, "library.json"),
            PathBuf::from("/srv/blaster/library.json")
        );
        assert_eq!(
            resolve_path(config, "/data/library.json"),
            PathBuf::from("/data/library.json")
        );
        assert_eq!(
            resolve_path(Path::new("config.yaml"), "library.json"),
            PathBuf::from("./library.json")
        );
        assert_eq!(resolve_music_root(config, "  "), None);
        assert_eq!(
            resolve_music_root(config, "music"),
            Some(PathBuf::from("/srv/blaster/music"))
        );
    }
}
