use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("terraform-provider-yoloexp"))
}

/// Default provider configuration file
pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("provider.toml"))
}

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
}

impl ConfigFormat {
    /// Detect the format from the file extension (TOML unless `.json`)
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::Json,
            _ => Self::Toml,
        }
    }

    /// Parse file content into a JSON object
    pub fn parse(self, content: &str) -> Result<Value> {
        let value = match self {
            Self::Json => serde_json::from_str::<Value>(content).context("Invalid JSON")?,
            Self::Toml => {
                let table: toml::Table = toml::from_str(content).context("Invalid TOML")?;
                serde_json::to_value(table)?
            }
        };
        if !value.is_object() {
            bail!("Provider configuration must be a table/object");
        }
        Ok(value)
    }
}

/// Load a provider configuration file
pub fn load(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    ConfigFormat::from_path(path)
        .parse(&content)
        .with_context(|| format!("Invalid provider configuration in {}", path.display()))
}

/// Build the provider configuration object
///
/// An explicit `path` must exist. Without one, the default file is used when
/// present. `notion_secret` from the command line overrides the file.
pub fn provider_config(path: Option<&Path>, notion_secret: Option<&str>) -> Result<Value> {
    let mut config = match path {
        Some(path) => load(path)?,
        None => match default_config_path() {
            Ok(default) if default.exists() => {
                log::debug!("Using provider configuration from {}", default.display());
                load(&default)?
            }
            _ => Value::Object(Map::new()),
        },
    };

    if let Some(secret) = notion_secret
        && let Some(object) = config.as_object_mut()
    {
        object.insert("notion_secret".to_string(), Value::String(secret.to_string()));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a.json")), ConfigFormat::Json);
        assert_eq!(ConfigFormat::from_path(Path::new("a.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("provider")), ConfigFormat::Toml);
    }

    #[test]
    fn test_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider.toml");
        fs::write(&path, "notion_secret = \"secret_toml\"\nrecreate_on_read_error = \"true\"\n").unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config, json!({"notion_secret": "secret_toml", "recreate_on_read_error": "true"}));
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider.json");
        fs::write(&path, r#"{"api_base_url": "http://localhost:9000/v1"}"#).unwrap();

        let config = load(&path).unwrap();
        assert_eq!(config["api_base_url"], "http://localhost:9000/v1");
    }

    #[test]
    fn test_load_rejects_non_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider.json");
        fs::write(&path, "[1, 2]").unwrap();

        assert!(load(&path).is_err());
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let err = provider_config(Some(&missing), None).unwrap_err();
        assert!(err.to_string().contains("Could not read"));
    }

    #[test]
    fn test_flag_overrides_file_secret() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("provider.toml");
        fs::write(&path, "notion_secret = \"from_file\"\n").unwrap();

        let config = provider_config(Some(&path), Some("from_flag")).unwrap();
        assert_eq!(config["notion_secret"], "from_flag");

        let config = provider_config(Some(&path), None).unwrap();
        assert_eq!(config["notion_secret"], "from_file");
    }
}
