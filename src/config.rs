use crate::errors::{BlazeError, Result};
use crate::logger;
use crate::runtime::cli::{CONTAINERD_ENDPOINT, DOCKER_ENDPOINT};
use crate::runtime::RuntimeKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlazeConfig {
    pub log_level: String,
    pub default_runtime: String,
    pub docker_endpoint: PathBuf,
    pub containerd_endpoint: PathBuf,
    pub fire_state_dir: PathBuf,
    /// create 命令的默认超时(秒)
    pub timeout_secs: Option<u64>,
}

impl Default for BlazeConfig {
    fn default() -> Self {
        let home_dir = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        Self {
            log_level: "info".to_string(),
            default_runtime: RuntimeKind::Docker.to_string(),
            docker_endpoint: PathBuf::from(DOCKER_ENDPOINT),
            containerd_endpoint: PathBuf::from(CONTAINERD_ENDPOINT),
            fire_state_dir: PathBuf::from(format!("{}/.fire", home_dir)),
            timeout_secs: None,
        }
    }
}

impl BlazeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BlazeConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if logger::parse_level(&self.log_level).is_none() {
            return Err(BlazeError::InvalidSpec(format!(
                "无效的日志级别: {}",
                self.log_level
            )));
        }

        self.default_runtime_kind()?;

        if self.timeout_secs == Some(0) {
            return Err(BlazeError::InvalidSpec("超时时间必须大于0".to_string()));
        }

        Ok(())
    }

    pub fn default_runtime_kind(&self) -> Result<RuntimeKind> {
        self.default_runtime.parse().map_err(|_| {
            BlazeError::InvalidSpec(format!("无效的容器运行时: {}", self.default_runtime))
        })
    }

    pub fn endpoint_for(&self, kind: RuntimeKind) -> PathBuf {
        match kind {
            RuntimeKind::Docker => self.docker_endpoint.clone(),
            RuntimeKind::Containerd => self.containerd_endpoint.clone(),
            RuntimeKind::Fire => self.fire_state_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = BlazeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_runtime_kind().unwrap(), RuntimeKind::Docker);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = BlazeConfig::new();
        config.log_level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = BlazeConfig::new();
        config.default_runtime = "podman".to_string();
        assert!(config.validate().is_err());

        let mut config = BlazeConfig::new();
        config.timeout_secs = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blaze.json");
        let path = path.to_str().unwrap();

        let mut config = BlazeConfig::new();
        config.default_runtime = "containerd".to_string();
        config.timeout_secs = Some(30);
        config.save_to_file(path).unwrap();

        let loaded = BlazeConfig::load_from_file(path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blaze.json");
        std::fs::write(&path, r#"{"log_level":"debug"}"#).unwrap();

        let loaded = BlazeConfig::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(loaded.log_level, "debug");
        assert_eq!(loaded.default_runtime, "docker");
    }
}
