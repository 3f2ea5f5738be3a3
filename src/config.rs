use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use teloxide::types::UserId;

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Validation(_) => None,
        }
    }
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    /// Requester ID -> candidate partner IDs for the weighted draw.
    #[serde(default)]
    preferred_pairs: HashMap<u64, Vec<u64>>,
    /// Probability of drawing a preferred partner when the requester has candidates.
    #[serde(default = "default_preferred_chance")]
    preferred_chance: f64,
    /// Names used when no preferred partner is drawn.
    #[serde(default = "default_placeholder_names")]
    placeholder_names: Vec<String>,
    /// Truetype font for the card title. Falls back to the embedded font
    /// when missing or unreadable.
    font_path: Option<String>,
    /// Port for the HTTP health page (disabled if unset).
    health_port: Option<u16>,
    /// Directory for state files (logs). Defaults to current directory.
    data_dir: Option<String>,
}

fn default_preferred_chance() -> f64 {
    0.55
}

fn default_placeholder_names() -> Vec<String> {
    ["Romeo", "Juliet", "Aryan", "Isha", "Sneha", "Rohit"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub struct Config {
    pub telegram_bot_token: String,
    /// Requester -> candidate partners. Never mutated after load.
    pub preferred_pairs: HashMap<UserId, Vec<UserId>>,
    pub preferred_chance: f64,
    pub placeholder_names: Vec<String>,
    pub font_path: Option<PathBuf>,
    pub health_port: Option<u16>,
    /// Directory for state files (logs).
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        // Validate required fields
        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }

        if !(0.0..=1.0).contains(&file.preferred_chance) {
            return Err(ConfigError::Validation(format!(
                "preferred_chance must be within [0, 1], got {}",
                file.preferred_chance
            )));
        }

        for (requester, candidates) in &file.preferred_pairs {
            if candidates.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "preferred_pairs entry for {requester} has no candidates"
                )));
            }
        }

        if file.placeholder_names.is_empty() {
            return Err(ConfigError::Validation(
                "placeholder_names must contain at least one name".into(),
            ));
        }

        let preferred_pairs = file
            .preferred_pairs
            .into_iter()
            .map(|(requester, candidates)| {
                (UserId(requester), candidates.into_iter().map(UserId).collect())
            })
            .collect();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            telegram_bot_token: file.telegram_bot_token,
            preferred_pairs,
            preferred_chance: file.preferred_chance,
            placeholder_names: file.placeholder_names,
            font_path: file.font_path.map(PathBuf::from),
            health_port: file.health_port,
            data_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_valid_config() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz",
            "preferred_pairs": {"5758014151": [7874738561, 7454346375]},
            "health_port": 5000
        }"#);
        let config = Config::load(file.path()).expect("should load valid config");
        assert_eq!(
            config.preferred_pairs.get(&UserId(5758014151)),
            Some(&vec![UserId(7874738561), UserId(7454346375)])
        );
        assert_eq!(config.health_port, Some(5000));
    }

    #[test]
    fn test_defaults_applied() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz"
        }"#);
        let config = Config::load(file.path()).expect("should load valid config");
        assert!(config.preferred_pairs.is_empty());
        assert_eq!(config.preferred_chance, 0.55);
        assert_eq!(config.placeholder_names.len(), 6);
        assert!(config.placeholder_names.contains(&"Romeo".to_string()));
        assert_eq!(config.health_port, None);
        assert_eq!(config.data_dir, PathBuf::from("."));
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(r#"{
            "telegram_bot_token": ""
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("telegram_bot_token"));
    }

    #[test]
    fn test_invalid_token_format_no_colon() {
        let file = write_config(r#"{
            "telegram_bot_token": "invalid_token_no_colon"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_invalid_token_format_non_numeric_id() {
        let file = write_config(r#"{
            "telegram_bot_token": "notanumber:ABCdef"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_invalid_token_format_empty_secret() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_preferred_chance_out_of_range() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "preferred_chance": 1.5
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("preferred_chance"));
    }

    #[test]
    fn test_preferred_chance_negative() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "preferred_chance": -0.1
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_empty_candidate_list() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "preferred_pairs": {"42": []}
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("candidates"));
    }

    #[test]
    fn test_empty_placeholder_names() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "placeholder_names": []
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("placeholder_names"));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
