//! Vertex AI endpoint addressing for Anthropic publisher models.
//!
//! The model is bound through the URL path, never the request body.

use crate::config::VertexConfig;

const GLOBAL_REGION: &str = "global";
const GLOBAL_HOST: &str = "aiplatform.googleapis.com";

/// Where `rawPredict` calls for one project/region go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexEndpoint {
    pub project_id: String,
    pub region: String,
    /// Overrides `https://{host}` when set.
    pub base_url: Option<String>,
}

impl VertexEndpoint {
    #[must_use]
    pub fn from_config(config: &VertexConfig) -> Self {
        Self {
            project_id: config.project_id.clone(),
            region: config.region.clone(),
            base_url: config.base_url.clone(),
        }
    }

    /// `global` uses the un-prefixed host.
    #[must_use]
    pub fn host(&self) -> String {
        if self.region == GLOBAL_REGION {
            GLOBAL_HOST.to_string()
        } else {
            format!("{}-{GLOBAL_HOST}", self.region)
        }
    }

    #[must_use]
    pub fn path_for_model(&self, model: &str) -> String {
        format!(
            "/v1/projects/{}/locations/{}/publishers/anthropic/models/{}:rawPredict",
            self.project_id,
            self.region,
            anthropic_model_id(model)
        )
    }

    #[must_use]
    pub fn url_for_model(&self, model: &str) -> String {
        let base = self
            .base_url
            .as_deref()
            .map_or_else(|| format!("https://{}", self.host()), |b| b.trim_end_matches('/').to_string());
        format!("{base}{}", self.path_for_model(model))
    }
}

/// Strip publisher prefixes clients sometimes include in the model name.
#[must_use]
pub fn anthropic_model_id(model: &str) -> &str {
    model
        .strip_prefix("publishers/anthropic/models/")
        .or_else(|| model.strip_prefix("anthropic/"))
        .or_else(|| model.strip_prefix("vertex_ai/"))
        .unwrap_or(model)
}

/// Whether `model` names a Claude model. Others are still forwarded; this
/// only drives a warning.
#[must_use]
pub fn is_supported_model(model: &str) -> bool {
    model.to_ascii_lowercase().contains("claude")
}
