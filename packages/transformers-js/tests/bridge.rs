//! End to end: deferred top-level exports against a mock host.

use collection_literals::btree;
use serde_json::json;
use tjs_loader::mock::MockLoader;
use transformers_js::{
    deferred, import_transformers_js, CoreError, pipeline, value_to_json, ForeignProxy, Kwargs, LocalImage,
    ModuleRegistry, RawImage, TensorArray, Value, VERSION,
};

#[test]
fn version_is_set() {
    assert!(!VERSION.is_empty());
}

#[tokio::test]
async fn pipeline_imports_on_first_call() {
    let loader = MockLoader::new();
    let registry = ModuleRegistry::new(loader.clone());
    assert_eq!(loader.attempts(), 0);

    let classifier = pipeline(&registry, vec!["sentiment-analysis".into()], Kwargs::new())
        .await
        .unwrap()
        .into_proxy()
        .unwrap();
    assert_eq!(loader.attempts(), 1);

    let output = classifier
        .call(
            vec!["I love transformers!".into()],
            btree! { "topk".to_string() => Value::from(1i64) },
        )
        .unwrap()
        .settle()
        .await
        .unwrap();
    assert_eq!(
        value_to_json(&output).unwrap(),
        json!([{ "label": "POSITIVE", "score": 0.99, "input": "I love transformers!" }])
    );
}

#[tokio::test]
async fn explicit_import_shares_the_default_entry() {
    let loader = MockLoader::new();
    let registry = ModuleRegistry::new(loader.clone());

    let ns = import_transformers_js(&registry, "latest").await.unwrap();
    pipeline(&registry, vec!["sentiment-analysis".into()], Kwargs::new())
        .await
        .unwrap();
    assert_eq!(loader.attempts(), 1);
    assert!(registry.most_recent().unwrap().same_as(&ns));
}

#[tokio::test]
async fn raw_image_reads_local_images_by_blob_url() {
    let loader = MockLoader::new();
    let registry = ModuleRegistry::new(loader.clone());

    let local = LocalImage::new(1, 1, 3, vec![10, 20, 30]).unwrap();
    let result = RawImage::read(&registry, local).await;

    if cfg!(feature = "image") {
        let image = result.unwrap().into_proxy().unwrap();
        let source = image.get("source").unwrap();
        let png = loader.runtime().blob(source.as_str().unwrap()).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    } else {
        assert!(matches!(
            result,
            Err(transformers_js::Error::Core(CoreError::Unavailable { .. }))
        ));
        assert_eq!(loader.attempts(), 1);
    }
}

#[tokio::test]
async fn raw_image_from_url_passes_the_url() {
    let registry = ModuleRegistry::new(MockLoader::new());
    let image = RawImage::from_url(&registry, "https://example.com/cat.png")
        .await
        .unwrap()
        .into_proxy()
        .unwrap();
    assert_eq!(image.kind(), "image");
    let pixels = image.as_image().unwrap().to_array().unwrap();
    assert_eq!(pixels.shape(), &[1, 2, 3]);
    assert_eq!(pixels[[0, 0, 0]], 255);
}

#[tokio::test]
async fn any_export_can_be_deferred() {
    let registry = ModuleRegistry::new(MockLoader::new());

    let tensor = deferred("Tensor")
        .unwrap()
        .invoke(
            &registry,
            vec![
                "int32".into(),
                Value::Array(vec![1i64.into(), 2i64.into(), 3i64.into(), 4i64.into()]),
                Value::Array(vec![2i64.into(), 2i64.into()]),
            ],
            Kwargs::new(),
        )
        .await
        .unwrap()
        .into_proxy()
        .unwrap();

    match tensor.as_tensor().unwrap().to_array().unwrap() {
        TensorArray::Int32(a) => {
            assert_eq!(a.shape(), &[2, 2]);
            assert_eq!(a.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn missing_exports_fail_at_invocation() {
    let loader = MockLoader::new();
    let registry = ModuleRegistry::new(loader.clone());
    let binding = deferred("NoSuchThing").unwrap().attr("create").unwrap();
    assert_eq!(loader.attempts(), 0);

    let err = binding
        .invoke(&registry, vec![], Kwargs::new())
        .await
        .unwrap_err();
    assert_eq!(loader.attempts(), 1);
    assert!(matches!(err, transformers_js::Error::Core(_)));
}
