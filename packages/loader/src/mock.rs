//! Mock module loader for testing.
//!
//! Every successful load evaluates a fresh fake library on the in-memory
//! runtime, so distinct keys get distinct namespaces.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tjs_core::testing::fake_transformers;
use tjs_core::Library;
use tjs_handle::memory::MemoryRuntime;
use tjs_handle::{Handle, HandleError};

use crate::{ModuleLoader, ModuleSource};

/// A library the mock handed out.
#[derive(Clone, Debug)]
pub struct LoadRecord {
    pub source: ModuleSource,
    pub namespace: Handle,
    pub env: Handle,
}

/// A scripted loader that records what it was asked to import.
#[derive(Clone, Default)]
pub struct MockLoader {
    runtime: MemoryRuntime,
    /// Every call to `load`, successful or not.
    attempts: Arc<AtomicUsize>,
    /// Libraries handed out, in order.
    loaded: Arc<Mutex<Vec<LoadRecord>>>,
    /// Number of upcoming loads that fail.
    fail_next: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// The runtime the fake libraries live on (and their blob host).
    pub fn runtime(&self) -> &MemoryRuntime {
        &self.runtime
    }

    /// Fail the next `count` loads with a fetch error.
    pub fn fail_next(self, count: usize) -> Self {
        self.fail_next.store(count, Ordering::SeqCst);
        self
    }

    /// Sleep this long inside every load.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn loaded(&self) -> Vec<LoadRecord> {
        self.loaded.lock().unwrap().clone()
    }

    fn version_of(source: &ModuleSource) -> String {
        match source {
            ModuleSource::Url(url) => url.rsplit('@').next().unwrap_or(url).to_string(),
            ModuleSource::Package { version, .. } => version.clone(),
        }
    }
}

#[async_trait]
impl ModuleLoader for MockLoader {
    async fn load(&self, source: &ModuleSource) -> Result<Library, HandleError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(HandleError::thrown(
                "TypeError",
                format!("Failed to fetch dynamically imported module: {}", source),
            ));
        }

        let fake = fake_transformers(&self.runtime, &Self::version_of(source));
        self.loaded.lock().unwrap().push(LoadRecord {
            source: source.clone(),
            namespace: fake.namespace.clone(),
            env: fake.env.clone(),
        });
        Ok(fake.library(&self.runtime))
    }
}
