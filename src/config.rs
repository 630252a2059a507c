#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use deployer::contract::DEFAULT_BUILD_DIR;
use deployer::deploy::DEFAULT_TONHUB_HOST;
use deployer::{DeployError, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = ".deploy/config.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub build_dir: PathBuf,
    pub tonhub_host: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            tonhub_host: DEFAULT_TONHUB_HOST.to_string(),
        }
    }
}

/// Resolves configuration: CLI flag, then environment, then config file,
/// then defaults.
///
/// # Errors
/// Returns `DeployError::ConfigError` if an explicitly given config file
/// cannot be read.
pub async fn load_config(path: Option<PathBuf>, build_dir_flag: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = if config_path.exists() {
        let content = tokio::fs::read_to_string(&config_path)
            .await
            .map_err(|e| DeployError::ConfigError(format!("Failed to read config: {e}")))?;
        parse_config_content(&content)
    } else if explicit {
        return Err(DeployError::ConfigError(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    } else {
        Config::default()
    };

    if let Some(dir) = non_empty_env_var("DEPLOY_BUILD_DIR") {
        config.build_dir = PathBuf::from(dir);
    }
    if let Some(host) = non_empty_env_var("DEPLOY_TONHUB_HOST") {
        config.tonhub_host = host;
    }
    if let Some(dir) = build_dir_flag {
        config.build_dir = dir;
    }

    validate(&config)?;
    Ok(config)
}

pub fn parse_config_content(content: &str) -> Config {
    let mut config = Config::default();

    for line in content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
    {
        if let Some(value) = parse_key_value(line, "build_dir") {
            config.build_dir = PathBuf::from(expand_env_vars(value));
        }
        if let Some(value) = parse_key_value(line, "tonhub_host") {
            config.tonhub_host = expand_env_vars(value);
        }
    }

    config
}

fn validate(config: &Config) -> Result<()> {
    if config.build_dir == Path::new("") {
        return Err(DeployError::ConfigError("build_dir must not be empty".to_string()));
    }
    if config.tonhub_host.is_empty() || config.tonhub_host.contains(['/', ' ']) {
        return Err(DeployError::ConfigError(format!(
            "tonhub_host must be a bare host name, got '{}'",
            config.tonhub_host
        )));
    }
    Ok(())
}

fn expand_env_vars(input: &str) -> String {
    let mut result = input.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_part = &result[start + 2..start + end];
            let (var_name, default) = var_part.split_once(":-").unwrap_or((var_part, ""));
            let value = std::env::var(var_name).unwrap_or_else(|_| default.to_string());
            result.replace_range(start..=(start + end), &value);
        } else {
            break;
        }
    }
    result
}

pub fn parse_key_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.split_once('=')
        .and_then(|(lhs, rhs)| (lhs.trim() == key).then_some(rhs.trim().trim_matches('"')))
}

fn non_empty_env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::{load_config, parse_config_content, parse_key_value, validate, Config};
    use std::path::PathBuf;

    #[test]
    fn parse_reads_build_dir_and_host() {
        let content = r#"# deploy settings
build_dir = "artifacts/tact"
tonhub_host = "tonhub.example""#;
        let config = parse_config_content(content);
        assert_eq!(config.build_dir, PathBuf::from("artifacts/tact"));
        assert_eq!(config.tonhub_host, "tonhub.example");
    }

    #[test]
    fn parse_expands_defaults_for_unset_variables() {
        let config =
            parse_config_content("build_dir = \"${DEPLOYER_TEST_UNSET_VARIABLE:-fallback}/build\"");
        assert_eq!(config.build_dir, PathBuf::from("fallback/build"));
    }

    #[test]
    fn parse_key_value_handles_spaces_and_mismatch() {
        assert_eq!(
            parse_key_value("build_dir = \"out dir\"", "build_dir"),
            Some("out dir")
        );
        assert_eq!(parse_key_value("other = \"x\"", "build_dir"), None);
    }

    #[test]
    fn validate_rejects_hosts_with_paths() {
        let config = Config {
            tonhub_host: "tonhub.com/evil".to_string(),
            ..Config::default()
        };
        assert!(validate(&config).is_err());
        assert!(validate(&Config::default()).is_ok());
    }

    #[tokio::test]
    async fn cli_flag_overrides_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "build_dir = \"from-file\"\n")
            .await
            .unwrap();

        let from_file = load_config(Some(path.clone()), None).await.unwrap();
        let from_flag = load_config(Some(path), Some(PathBuf::from("from-flag")))
            .await
            .unwrap();

        if std::env::var("DEPLOY_BUILD_DIR").is_err() {
            assert_eq!(from_file.build_dir, PathBuf::from("from-file"));
        }
        assert_eq!(from_flag.build_dir, PathBuf::from("from-flag"));
    }

    #[tokio::test]
    async fn missing_explicit_config_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = load_config(Some(dir.path().join("absent.toml")), None).await;
        assert!(result.is_err());
    }
}
