//! Loader configuration.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Where the import runs.
///
/// Browser and worker contexts fetch the library from the CDN; a server
/// context resolves the package through the host's own module resolution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionContext {
    #[default]
    Browser,
    Worker,
    Server,
}

impl ExecutionContext {
    pub fn is_browser(&self) -> bool {
        matches!(self, ExecutionContext::Browser | ExecutionContext::Worker)
    }
}

/// Configuration for a `ModuleRegistry`.
///
/// Every field has a default, so a JSON document only needs the fields it
/// changes:
///
/// ```rust
/// use tjs_loader::{ExecutionContext, LoaderConfig};
///
/// let config = LoaderConfig::from_json(r#"{ "context": "server" }"#).unwrap();
/// assert_eq!(config.context, ExecutionContext::Server);
/// assert_eq!(config.default_version, "latest");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Version imported by `import_default` and deferred bindings.
    pub default_version: String,
    /// CDN prefix; the module URL is `{cdn_base}/{package}@{version}`.
    pub cdn_base: String,
    /// Package for "latest" and major versions 3 and up.
    pub package: String,
    /// Package for major versions below 3.
    pub legacy_package: String,
    pub context: ExecutionContext,
    /// Value written to `env.allowLocalModels` after each import.
    pub allow_local_models: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            default_version: "latest".to_string(),
            cdn_base: "https://cdn.jsdelivr.net/npm".to_string(),
            package: "@huggingface/transformers".to_string(),
            legacy_package: "@xenova/transformers".to_string(),
            context: ExecutionContext::default(),
            allow_local_models: false,
        }
    }
}

impl LoaderConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = version.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.cdn_base, "https://cdn.jsdelivr.net/npm");
        assert_eq!(config.context, ExecutionContext::Browser);
        assert!(!config.allow_local_models);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            LoaderConfig::from_json(r#"{ "default_version": "2.17.2", "context": "worker" }"#)
                .unwrap();
        assert_eq!(config.default_version, "2.17.2");
        assert!(config.context.is_browser());
        assert_eq!(config.package, "@huggingface/transformers");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = LoaderConfig::from_json(r#"{ "context": "mainframe" }"#).unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }
}
