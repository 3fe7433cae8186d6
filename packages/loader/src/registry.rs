//! The import registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tjs_core::{ForeignProxy, Library, Namespace, Value};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::{resolve_source, Error, LoaderConfig, ModuleLoader, Result};

/// Imported libraries, one per version-or-URL key.
///
/// Each key is loaded at most once: concurrent first imports of the same key
/// wait on a single load. A failed load drops the key, so a later import
/// tries again.
pub struct ModuleRegistry {
    config: LoaderConfig,
    loader: Arc<dyn ModuleLoader>,
    entries: Mutex<HashMap<String, Arc<OnceCell<Library>>>>,
    most_recent: Mutex<Option<Library>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ModuleRegistry {
    pub fn new(loader: impl ModuleLoader + 'static) -> Self {
        Self::with_config(loader, LoaderConfig::default())
    }

    pub fn with_config(loader: impl ModuleLoader + 'static, config: LoaderConfig) -> Self {
        Self {
            config,
            loader: Arc::new(loader),
            entries: Mutex::new(HashMap::new()),
            most_recent: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Import the library for a version or module URL.
    pub async fn import(&self, version_or_url: &str) -> Result<Namespace> {
        let cell = lock(&self.entries)
            .entry(version_or_url.to_string())
            .or_default()
            .clone();

        if let Some(library) = cell.get() {
            debug!(key = version_or_url, "Using cached library");
            return Ok(library.namespace());
        }

        match cell.get_or_try_init(|| self.initialize(version_or_url)).await {
            Ok(library) => Ok(library.namespace()),
            Err(e) => {
                let mut entries = lock(&self.entries);
                if entries
                    .get(version_or_url)
                    .is_some_and(|c| Arc::ptr_eq(c, &cell) && !c.initialized())
                {
                    entries.remove(version_or_url);
                }
                Err(e)
            }
        }
    }

    /// Import the configured default version.
    pub async fn import_default(&self) -> Result<Namespace> {
        self.import(&self.config.default_version).await
    }

    /// The most recently loaded library's namespace.
    ///
    /// Cache hits do not count as loads.
    pub fn most_recent(&self) -> Option<Namespace> {
        lock(&self.most_recent).as_ref().map(Library::namespace)
    }

    /// Keys that are loaded or being loaded, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = lock(&self.entries).keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether `version_or_url` has been loaded.
    pub fn is_loaded(&self, version_or_url: &str) -> bool {
        lock(&self.entries)
            .get(version_or_url)
            .is_some_and(|cell| cell.initialized())
    }

    async fn initialize(&self, key: &str) -> Result<Library> {
        let source = resolve_source(key, &self.config);
        debug!(key, %source, "Loading library");

        let library = self.loader.load(&source).await.map_err(|e| {
            warn!(key, %source, error = %e, "Failed to load library");
            Error::Initialization {
                location: source.to_string(),
                source: e,
            }
        })?;

        let env = library.namespace().get("env")?.into_proxy()?;
        env.set(
            "allowLocalModels",
            Value::Bool(self.config.allow_local_models),
        )?;
        debug!(key, "Library initialized");

        *lock(&self.most_recent) = Some(library.clone());
        Ok(library)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockLoader;
    use crate::{ExecutionContext, ModuleSource};
    use std::time::Duration;
    use tjs_handle::ForeignValue;

    #[tokio::test]
    async fn import_is_idempotent_per_key() {
        let loader = MockLoader::new();
        let registry = ModuleRegistry::new(loader.clone());

        let first = registry.import("3.0.0").await.unwrap();
        let second = registry.import("3.0.0").await.unwrap();

        assert_eq!(loader.attempts(), 1);
        assert!(first.same_as(&second));
        assert!(registry.is_loaded("3.0.0"));

        // Writes through either namespace reach the same foreign object.
        first.set("marker", Value::from("x")).unwrap();
        assert_eq!(second.get("marker").unwrap(), Value::from("x"));
    }

    #[tokio::test]
    async fn import_disables_local_models() {
        let loader = MockLoader::new();
        let registry = ModuleRegistry::new(loader.clone());
        registry.import("latest").await.unwrap();

        let env = &loader.loaded()[0].env;
        assert_eq!(
            env.get("allowLocalModels").unwrap(),
            ForeignValue::Bool(false)
        );
    }

    #[tokio::test]
    async fn configured_local_models_flag_is_applied() {
        let loader = MockLoader::new();
        let config = LoaderConfig {
            allow_local_models: true,
            ..LoaderConfig::default()
        };
        let registry = ModuleRegistry::with_config(loader.clone(), config);
        registry.import("latest").await.unwrap();
        assert_eq!(
            loader.loaded()[0].env.get("allowLocalModels").unwrap(),
            ForeignValue::Bool(true)
        );
    }

    #[tokio::test]
    async fn failed_import_can_be_retried() {
        let loader = MockLoader::new().fail_next(1);
        let registry = ModuleRegistry::new(loader.clone());

        let err = registry.import("3.0.0").await.unwrap_err();
        match err {
            Error::Initialization { location, source } => {
                assert_eq!(
                    location,
                    "https://cdn.jsdelivr.net/npm/@huggingface/transformers@3.0.0"
                );
                assert!(source.to_string().starts_with("TypeError: Failed to fetch"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!registry.is_loaded("3.0.0"));
        assert!(registry.most_recent().is_none());
        assert!(registry.keys().is_empty());

        registry.import("3.0.0").await.unwrap();
        assert_eq!(loader.attempts(), 2);
        assert!(registry.is_loaded("3.0.0"));
        assert_eq!(registry.keys(), vec!["3.0.0".to_string()]);
    }

    #[tokio::test]
    async fn failed_keys_are_not_kept() {
        let loader = MockLoader::new().fail_next(3);
        let registry = ModuleRegistry::new(loader.clone());

        for key in ["3.0.0", "2.17.2", "https://example.com/typo.js"] {
            assert!(registry.import(key).await.is_err());
        }
        assert!(registry.keys().is_empty());

        registry.import("latest").await.unwrap();
        assert_eq!(registry.keys(), vec!["latest".to_string()]);
    }

    #[tokio::test]
    async fn initialization_errors_keep_the_foreign_error_as_source() {
        use std::error::Error as _;

        let registry = ModuleRegistry::new(MockLoader::new().fail_next(1));
        let err = registry.import("latest").await.unwrap_err();

        let source = err
            .source()
            .and_then(|s| s.downcast_ref::<tjs_handle::HandleError>())
            .expect("foreign error as source");
        assert!(matches!(
            source,
            tjs_handle::HandleError::Thrown { name, .. } if name == "TypeError"
        ));
        assert!(err.to_string().contains("@huggingface/transformers@latest"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_first_imports_load_once() {
        let loader = MockLoader::new().with_delay(Duration::from_millis(20));
        let registry = Arc::new(ModuleRegistry::new(loader.clone()));

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.import("latest").await })
            })
            .collect();

        let mut namespaces = Vec::new();
        for task in tasks {
            namespaces.push(task.await.unwrap().unwrap());
        }

        assert_eq!(loader.attempts(), 1);
        assert!(namespaces.windows(2).all(|w| w[0].same_as(&w[1])));
    }

    #[tokio::test]
    async fn most_recent_tracks_loads_not_hits() {
        let loader = MockLoader::new();
        let registry = ModuleRegistry::new(loader.clone());
        assert!(registry.most_recent().is_none());

        let v3 = registry.import("3.0.0").await.unwrap();
        let v2 = registry.import("2.17.2").await.unwrap();
        assert!(registry.most_recent().unwrap().same_as(&v2));

        registry.import("3.0.0").await.unwrap();
        assert!(registry.most_recent().unwrap().same_as(&v2));
        assert!(!v3.same_as(&v2));
    }

    #[tokio::test]
    async fn keys_resolve_through_the_config() {
        let loader = MockLoader::new();
        let config = LoaderConfig::default()
            .with_context(ExecutionContext::Server)
            .with_default_version("2.17.2");
        let registry = ModuleRegistry::with_config(loader.clone(), config);

        let ns = registry.import_default().await.unwrap();
        assert_eq!(
            loader.loaded()[0].source,
            ModuleSource::Package {
                name: "@xenova/transformers".to_string(),
                version: "2.17.2".to_string(),
            }
        );
        let env = ns.get("env").unwrap().into_proxy().unwrap();
        assert_eq!(env.get("version").unwrap(), Value::from("2.17.2"));
    }
}
