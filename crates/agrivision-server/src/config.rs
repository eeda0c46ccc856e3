//! Server configuration

use agrivision_model::{DeviceType, ModelConfig, OutputActivation};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::cli::Cli;

/// Signing secret used when none is configured. Development only.
pub const DEFAULT_JWT_SECRET: &str = "super-secret";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Model artifact settings
    #[serde(default)]
    pub model: ModelSettings,

    /// Token issuance settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Maximum accepted request body size
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Allow cross-origin requests from any origin
    #[serde(default)]
    pub cors_allow_any: bool,
}

impl ServerConfig {
    /// Load configuration from file and CLI overrides
    pub fn load(config_path: &str, cli: &Cli) -> anyhow::Result<Self> {
        // Try to load from file, or use defaults
        let mut config = if Path::new(config_path).exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file {}", config_path))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", config_path))?
        } else {
            Self::default()
        };

        // Apply CLI overrides
        if let Some(listen) = &cli.listen {
            config.listen = listen.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(model) = &cli.model {
            config.model.path = Some(model.clone());
        }
        if let Some(secret) = &cli.jwt_secret {
            config.auth.jwt_secret = Some(secret.clone());
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.auth.token_ttl_secs == 0 {
            anyhow::bail!("auth.token_ttl_secs must be greater than zero");
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("max_body_bytes must be greater than zero");
        }
        match &self.auth.jwt_secret {
            Some(secret) if secret.is_empty() => {
                anyhow::bail!("auth.jwt_secret must not be empty");
            }
            Some(_) => {}
            None => {
                warn!("No JWT secret configured; using the development default. Set AGRIVISION_JWT_SECRET in production.");
            }
        }
        Ok(())
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.listen, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.listen, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            port: default_port(),
            model: ModelSettings::default(),
            auth: AuthConfig::default(),
            max_body_bytes: default_max_body_bytes(),
            cors_allow_any: false,
        }
    }
}

/// Where to find the model and how to run it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Local SafeTensors file; takes precedence over `repo_id`
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Hugging Face repository holding the artifact
    #[serde(default)]
    pub repo_id: Option<String>,

    /// Artifact file inside the repository
    #[serde(default = "default_filename")]
    pub filename: String,

    #[serde(default)]
    pub revision: Option<String>,

    #[serde(default)]
    pub device: DeviceType,

    #[serde(default)]
    pub output_activation: OutputActivation,
}

impl ModelSettings {
    /// Build the loader configuration
    pub fn to_model_config(&self) -> ModelConfig {
        let config = match (&self.path, &self.repo_id) {
            (None, Some(repo)) => {
                let config = ModelConfig::from_hf(repo.clone(), self.filename.clone());
                match &self.revision {
                    Some(revision) => config.with_revision(revision.clone()),
                    None => config,
                }
            }
            (Some(path), _) => ModelConfig::from_local(path.clone()),
            (None, None) => ModelConfig::default(),
        };

        config
            .with_device(self.device)
            .with_output_activation(self.output_activation)
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: None,
            repo_id: None,
            filename: default_filename(),
            revision: None,
            device: DeviceType::Cpu,
            output_activation: OutputActivation::Softmax,
        }
    }
}

/// Access token settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC signing secret
    #[serde(default)]
    pub jwt_secret: Option<String>,

    /// Access token lifetime
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    /// Subject written into issued tokens
    #[serde(default = "default_identity")]
    pub identity: String,
}

impl AuthConfig {
    /// Configured secret, or the development default
    pub fn secret(&self) -> &str {
        self.jwt_secret.as_deref().unwrap_or(DEFAULT_JWT_SECRET)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_secs: default_token_ttl(),
            identity: default_identity(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_filename() -> String {
    "model.safetensors".to_string()
}

fn default_token_ttl() -> u64 {
    15 * 60
}

fn default_identity() -> String {
    "system_user".to_string()
}
