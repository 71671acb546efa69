use crate::error::{ProxyError, Result};
use crate::translate::transform::{
    TransformOptions, DEFAULT_ANTHROPIC_VERSION, DEFAULT_MAX_TOKENS,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "vertex-claude-proxy";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    pub vertex: VertexConfig,
    /// Client model name -> Vertex model route.
    #[serde(default)]
    pub models: HashMap<String, ModelRoute>,
    #[serde(default)]
    pub params: ParamsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexConfig {
    pub project_id: String,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,
    /// Replaces the `aiplatform.googleapis.com` host, e.g. for a local mock.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_anthropic_version")]
    pub anthropic_version: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u64,
}

/// Either a bare Vertex model id or a table with per-model defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelRoute {
    Id(String),
    Detailed {
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_tokens: Option<u64>,
    },
}

impl ModelRoute {
    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            Self::Id(model) | Self::Detailed { model, .. } => model,
        }
    }

    #[must_use]
    pub fn max_tokens(&self) -> Option<u64> {
        match self {
            Self::Id(_) => None,
            Self::Detailed { max_tokens, .. } => *max_tokens,
        }
    }
}

/// A client model name resolved against `[models]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub requested: String,
    pub vertex_model: String,
    pub max_tokens: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParamsConfig {
    /// Request parameters to drop on top of the built-in OpenAI-only list.
    #[serde(default)]
    pub drop: Vec<String>,
}

fn default_port() -> u16 {
    4000
}

fn default_region() -> String {
    "us-east5".to_string()
}

fn default_access_token_env() -> String {
    "VERTEX_ACCESS_TOKEN".to_string()
}

fn default_anthropic_version() -> String {
    DEFAULT_ANTHROPIC_VERSION.to_string()
}

fn default_max_tokens() -> u64 {
    DEFAULT_MAX_TOKENS
}

impl ProxyConfig {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProxyError::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Search standard locations for a config file.
    /// Priority: CLI arg > CWD > XDG config > home dir
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::load(path);
        }

        let candidates = config_search_paths();
        for candidate in &candidates {
            if candidate.exists() {
                tracing::info!(path = %candidate.display(), "Loading config");
                return Self::load(candidate);
            }
        }

        Err(ProxyError::config(format!(
            "No config file found. Searched: {}. Create one from config.example.toml",
            candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }

    fn validate(&self) -> Result<()> {
        if self.vertex.project_id.trim().is_empty() {
            return Err(ProxyError::config("vertex.project_id must not be empty"));
        }
        if self.vertex.region.trim().is_empty() {
            return Err(ProxyError::config("vertex.region must not be empty"));
        }
        if self.vertex.max_tokens == 0 {
            return Err(ProxyError::config("vertex.max_tokens must be positive"));
        }
        Ok(())
    }

    /// Resolve the bearer token from the configured environment variable
    pub fn resolve_access_token(&self) -> Result<String> {
        std::env::var(&self.vertex.access_token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| {
                ProxyError::config(format!(
                    "Environment variable '{}' not set. Set it with a Vertex AI access token \
                     (e.g. `gcloud auth print-access-token`).",
                    self.vertex.access_token_env
                ))
            })
    }

    /// Map a client model name to its Vertex route. Unmapped names pass
    /// through unchanged.
    #[must_use]
    pub fn resolve_model(&self, requested: &str) -> ResolvedModel {
        let route = self.models.get(requested);
        ResolvedModel {
            requested: requested.to_string(),
            vertex_model: route.map_or_else(|| requested.to_string(), |r| r.model().to_string()),
            max_tokens: route.and_then(ModelRoute::max_tokens),
        }
    }

    #[must_use]
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            anthropic_version: self.vertex.anthropic_version.clone(),
            max_tokens: self.vertex.max_tokens,
            drop_params: self.params.drop.clone(),
        }
    }
}

/// Candidate config file locations, in search order.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    // CWD
    paths.push(PathBuf::from(format!("{APP_NAME}.toml")));

    // XDG / platform config dir
    if cfg!(target_os = "macos") {
        if let Some(home) = dirs_path() {
            paths.push(
                home.join("Library")
                    .join("Application Support")
                    .join(APP_NAME)
                    .join("config.toml"),
            );
        }
    } else {
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join(APP_NAME).join("config.toml"));
        }
        if let Some(home) = dirs_path() {
            paths.push(home.join(".config").join(APP_NAME).join("config.toml"));
        }
    }

    // Home directory fallback
    if let Some(home) = dirs_path() {
        paths.push(home.join(format!(".{APP_NAME}.toml")));
    }

    paths
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
