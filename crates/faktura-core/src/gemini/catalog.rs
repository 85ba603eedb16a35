//! Public model catalog built from the models-list endpoint.
//!
//! Each API entry is mapped through an explicit serde adapter with
//! optional named fields instead of probing arbitrary attributes, so
//! a new reply shape means a new alias, not new reflection.

use serde::{Deserialize, Serialize};

/// One known model, with whatever metadata the API exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: Option<String>,
    #[serde(alias = "displayName")]
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "inputTokenLimit")]
    pub input_token_limit: Option<i64>,
    #[serde(alias = "outputTokenLimit")]
    pub output_token_limit: Option<i64>,
    #[serde(alias = "supportedGenerationMethods")]
    pub supported_generation_methods: Option<Vec<String>>,
    pub version: Option<String>,
    pub state: Option<String>,
}

impl ModelMetadata {
    /// Lowercased name + display name, for filtering.
    fn searchable(&self) -> String {
        format!(
            "{} {}",
            self.name.as_deref().unwrap_or_default(),
            self.display_name.as_deref().unwrap_or_default()
        )
        .to_lowercase()
    }
}

/// The catalog surfaced to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ModelCatalog {
    pub source: String,
    pub count: usize,
    pub quota_note: String,
    pub models: Vec<ModelMetadata>,
}

/// Filter and order raw entries into a catalog.
pub fn build_catalog(
    models: Vec<ModelMetadata>,
    only_gemini: bool,
    name_contains: Option<&str>,
) -> ModelCatalog {
    let filter_text = name_contains.unwrap_or("").trim().to_lowercase();

    let mut items: Vec<ModelMetadata> = models
        .into_iter()
        .filter(|model| {
            let searchable = model.searchable();
            if only_gemini && !searchable.contains("gemini") {
                return false;
            }
            filter_text.is_empty() || searchable.contains(&filter_text)
        })
        .collect();
    items.sort_by(|a, b| a.name.cmp(&b.name));

    ModelCatalog {
        source: "gemini_api".to_string(),
        count: items.len(),
        quota_note: "The public models list typically exposes model metadata and token limits, \
                     but not project/account quota usage or remaining quota."
            .to_string(),
        models: items,
    }
}
