//! Version and URL resolution.

use std::fmt;

use crate::LoaderConfig;

/// What the host is asked to import.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModuleSource {
    /// A module URL, fetched as is.
    Url(String),
    /// A package resolved by the host itself.
    Package { name: String, version: String },
}

impl fmt::Display for ModuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleSource::Url(url) => write!(f, "{}", url),
            ModuleSource::Package { name, version } => write!(f, "{}@{}", name, version),
        }
    }
}

/// Resolve a version string or module URL.
///
/// An absolute URL is used verbatim. Anything else is a version: "latest"
/// and major versions 3 and up map to the current package, everything else
/// (including versions whose major part is not a number) to the legacy one.
///
/// ```rust
/// use tjs_loader::{resolve_source, LoaderConfig, ModuleSource};
///
/// let config = LoaderConfig::default();
/// assert_eq!(
///     resolve_source("2.17.2", &config),
///     ModuleSource::Url("https://cdn.jsdelivr.net/npm/@xenova/transformers@2.17.2".into())
/// );
/// ```
pub fn resolve_source(version_or_url: &str, config: &LoaderConfig) -> ModuleSource {
    if url::Url::parse(version_or_url).is_ok() {
        return ModuleSource::Url(version_or_url.to_string());
    }

    let version = version_or_url;
    let package = if is_current(version) {
        &config.package
    } else {
        &config.legacy_package
    };

    if config.context.is_browser() {
        ModuleSource::Url(format!(
            "{}/{}@{}",
            config.cdn_base.trim_end_matches('/'),
            package,
            version
        ))
    } else {
        ModuleSource::Package {
            name: package.clone(),
            version: version.to_string(),
        }
    }
}

fn is_current(version: &str) -> bool {
    if version == "latest" {
        return true;
    }
    version
        .trim_start_matches(['v', '^', '~', '='])
        .split('.')
        .next()
        .and_then(|major| major.parse::<u64>().ok())
        .is_some_and(|major| major >= 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExecutionContext;

    fn url(s: &str) -> ModuleSource {
        ModuleSource::Url(s.to_string())
    }

    #[test]
    fn latest_and_v3_use_current_package() {
        let config = LoaderConfig::default();
        assert_eq!(
            resolve_source("latest", &config),
            url("https://cdn.jsdelivr.net/npm/@huggingface/transformers@latest")
        );
        assert_eq!(
            resolve_source("3.0.2", &config),
            url("https://cdn.jsdelivr.net/npm/@huggingface/transformers@3.0.2")
        );
        assert_eq!(
            resolve_source("4.1.0", &config),
            url("https://cdn.jsdelivr.net/npm/@huggingface/transformers@4.1.0")
        );
    }

    #[test]
    fn older_and_unparseable_versions_use_legacy_package() {
        let config = LoaderConfig::default();
        assert_eq!(
            resolve_source("2.17.2", &config),
            url("https://cdn.jsdelivr.net/npm/@xenova/transformers@2.17.2")
        );
        assert_eq!(
            resolve_source("next", &config),
            url("https://cdn.jsdelivr.net/npm/@xenova/transformers@next")
        );
    }

    #[test]
    fn urls_are_used_verbatim() {
        let config = LoaderConfig::default();
        let u = "https://example.com/transformers.min.js";
        assert_eq!(resolve_source(u, &config), url(u));
    }

    #[test]
    fn server_context_resolves_packages() {
        let config = LoaderConfig::default().with_context(ExecutionContext::Server);
        let source = resolve_source("2.17.2", &config);
        assert_eq!(
            source,
            ModuleSource::Package {
                name: "@xenova/transformers".to_string(),
                version: "2.17.2".to_string(),
            }
        );
        assert_eq!(source.to_string(), "@xenova/transformers@2.17.2");
    }

    #[test]
    fn trailing_slash_on_cdn_base() {
        let mut config = LoaderConfig::default();
        config.cdn_base = "https://unpkg.com/".to_string();
        assert_eq!(
            resolve_source("3.0.0", &config),
            url("https://unpkg.com/@huggingface/transformers@3.0.0")
        );
    }
}
