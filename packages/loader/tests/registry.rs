//! The registry driven through a host-side `ModuleLoader`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tjs_core::testing::fake_transformers;
use tjs_core::{ForeignProxy, Kwargs, Library, Value};
use tjs_handle::memory::MemoryRuntime;
use tjs_handle::{HandleError, TypedArray};
use tjs_loader::{DeferredBinding, ModuleLoader, ModuleRegistry, ModuleSource};

/// Serves one fake library per version, keyed by the resolved source.
#[derive(Clone, Default)]
struct VersionedHost {
    runtime: MemoryRuntime,
    fetched: Arc<Mutex<HashMap<String, usize>>>,
}

#[async_trait]
impl ModuleLoader for VersionedHost {
    async fn load(&self, source: &ModuleSource) -> Result<Library, HandleError> {
        *self
            .fetched
            .lock()
            .unwrap()
            .entry(source.to_string())
            .or_default() += 1;
        let version = match source {
            ModuleSource::Url(url) => url.rsplit('@').next().unwrap_or_default().to_string(),
            ModuleSource::Package { version, .. } => version.clone(),
        };
        Ok(fake_transformers(&self.runtime, &version).library(&self.runtime))
    }
}

async fn version_of(registry: &ModuleRegistry, key: &str) -> Value {
    registry
        .import(key)
        .await
        .unwrap()
        .get("env")
        .unwrap()
        .into_proxy()
        .unwrap()
        .get("version")
        .unwrap()
}

#[tokio::test]
async fn versions_are_imported_side_by_side() {
    let host = VersionedHost::default();
    let registry = ModuleRegistry::new(host.clone());

    assert_eq!(version_of(&registry, "2.17.2").await, Value::from("2.17.2"));
    assert_eq!(version_of(&registry, "3.0.0").await, Value::from("3.0.0"));
    assert_eq!(version_of(&registry, "2.17.2").await, Value::from("2.17.2"));

    let fetched = host.fetched.lock().unwrap().clone();
    assert_eq!(fetched.len(), 2);
    assert_eq!(
        fetched["https://cdn.jsdelivr.net/npm/@xenova/transformers@2.17.2"],
        1
    );
    assert_eq!(
        fetched["https://cdn.jsdelivr.net/npm/@huggingface/transformers@3.0.0"],
        1
    );
}

#[tokio::test]
async fn tensors_belong_to_their_own_import() {
    let registry = ModuleRegistry::new(VersionedHost::default());
    let v2 = registry.import("2.17.2").await.unwrap();
    let v3 = registry.import("3.0.0").await.unwrap();

    let tensor = v2
        .get("Tensor")
        .unwrap()
        .into_proxy()
        .unwrap()
        .call(
            vec![Value::Typed(TypedArray::from_slice(&[1.0f32, 2.0]))],
            Kwargs::new(),
        )
        .unwrap()
        .into_proxy()
        .unwrap();
    assert_eq!(tensor.kind(), "tensor");

    // The same object seen through the other import is not its Tensor.
    let seen_by_v3 = v3.library().wrap(tensor.into_handle()).unwrap();
    assert_eq!(seen_by_v3.kind(), "generic");
}

#[tokio::test]
async fn deferred_raw_image_read_uploads_local_files() {
    let host = VersionedHost::default();
    let registry = ModuleRegistry::new(host.clone());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cat.png");
    std::fs::write(&path, b"png bytes").unwrap();

    let image = DeferredBinding::new("RawImage.read")
        .unwrap()
        .invoke(
            &registry,
            vec![Value::from(path.to_string_lossy().into_owned())],
            Kwargs::new(),
        )
        .await
        .unwrap()
        .into_proxy()
        .unwrap();

    let source = image.get("source").unwrap();
    let url = source.as_str().unwrap();
    assert!(url.starts_with("blob:"));
    assert_eq!(host.runtime.blob(url).unwrap().as_ref(), b"png bytes");
    assert_eq!(image.as_image().unwrap().to_array().unwrap().shape(), &[1, 2, 3]);
}
