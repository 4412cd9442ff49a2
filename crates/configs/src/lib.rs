use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub substrate: SubstrateConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubstrateKind {
    /// Process-local; contents are lost when the process exits, so each CLI
    /// invocation starts from an empty substrate.
    Memory,
    #[default]
    File,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubstrateConfig {
    #[serde(default)]
    pub kind: SubstrateKind,
    #[serde(default = "default_data_path")]
    pub path: Option<String>,
    #[serde(default)]
    pub quota_bytes: Option<usize>,
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self { kind: SubstrateKind::File, path: default_data_path(), quota_bytes: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_data_path() -> Option<String> { Some("data/llama_store.json".to_string()) }

/// Load from `LLAMA_CONFIG_PATH` (default `llama.toml`); a missing file yields defaults.
pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("LLAMA_CONFIG_PATH").unwrap_or_else(|_| "llama.toml".to_string());
    if std::fs::metadata(&path).is_err() {
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.substrate.normalize();
        self.substrate.validate()
    }
}

impl SubstrateConfig {
    fn normalize(&mut self) {
        if let Some(path) = &self.path {
            if path.trim().is_empty() {
                self.path = None;
            }
        }
        // LLAMA_DATA_PATH overrides the file location
        if let Ok(path) = std::env::var("LLAMA_DATA_PATH") {
            if !path.trim().is_empty() {
                self.path = Some(path);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.kind == SubstrateKind::File && self.path.is_none() {
            return Err(anyhow!("substrate.path is required when substrate.kind = \"file\""));
        }
        if self.quota_bytes == Some(0) {
            return Err(anyhow!("substrate.quota_bytes must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() -> Result<()> {
        let cfg: AppConfig = toml::from_str(
            r#"
            [substrate]
            kind = "memory"
            quota_bytes = 5242880

            [logging]
            format = "json"
            "#,
        )?;
        assert_eq!(cfg.substrate.kind, SubstrateKind::Memory);
        assert_eq!(cfg.substrate.quota_bytes, Some(5_242_880));
        assert_eq!(cfg.logging.format, LogFormat::Json);
        cfg.substrate.validate()?;
        Ok(())
    }

    #[test]
    fn empty_config_falls_back_to_file_defaults() -> Result<()> {
        let cfg: AppConfig = toml::from_str("")?;
        assert_eq!(cfg.substrate.kind, SubstrateKind::File);
        assert_eq!(cfg.substrate.path.as_deref(), Some("data/llama_store.json"));
        assert_eq!(cfg.logging.format, LogFormat::Compact);
        Ok(())
    }

    #[test]
    fn rejects_file_without_path_and_zero_quota() -> Result<()> {
        let no_path = SubstrateConfig { kind: SubstrateKind::File, path: None, quota_bytes: None };
        assert!(no_path.validate().is_err());

        let cfg: AppConfig = toml::from_str("[substrate]\nkind = \"memory\"\nquota_bytes = 0\n")?;
        assert!(cfg.substrate.validate().is_err());
        Ok(())
    }
}
