//! Process-wide extracted-features registry.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::features::locator::{ArchiveKind, ArchiveLocator};
use crate::features::volume::{load_archive, ExtractedFeatures};
use crate::features::worker::{TaskHandle, Worker};
use crate::features::VolumeData;

/// Tunables for a [`FeatureProvider`].
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Upper bound on how long a data accessor blocks for its archive
    /// load before failing with a timeout.
    pub load_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            load_timeout: Duration::from_secs(10 * 60),
        }
    }
}

/// Registry of [`ExtractedFeatures`] documents over one dataset root.
///
/// Each distinct volume id gets exactly one registered document and one
/// pair of scheduled archive loads, no matter how many callers race for
/// it. All loads share a single worker thread, bounding resource usage at
/// one decompress-and-parse in flight per provider.
///
/// Providers are independent of one another; closing one never affects
/// another, even over the same root directory.
pub struct FeatureProvider {
    shared: Arc<ProviderShared>,
}

pub(crate) struct ProviderShared {
    locator: ArchiveLocator,
    config: ProviderConfig,
    disposed: AtomicBool,
    cache: Mutex<HashMap<String, Arc<ExtractedFeatures>>>,
    worker: Worker,
}

impl FeatureProvider {
    /// Creates a provider over a dataset root directory, spawning its
    /// load worker.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(root, ProviderConfig::default())
    }

    pub fn with_config(root: impl Into<PathBuf>, config: ProviderConfig) -> Result<Self> {
        let worker = Worker::new("extracted-features-loader")?;
        Ok(Self {
            shared: Arc::new(ProviderShared {
                locator: ArchiveLocator::new(root.into()),
                config,
                disposed: AtomicBool::new(false),
                cache: Mutex::new(HashMap::new()),
                worker,
            }),
        })
    }

    /// The registered document for `volume_id`, creating it and
    /// scheduling its archive loads on first request.
    ///
    /// The document exists even when the volume has no archives on disk;
    /// its data accessors then fail with [`Error::NoDataAvailable`].
    /// Fails with [`Error::ProviderDisposed`] after [`close`](Self::close).
    pub fn extracted_features(&self, volume_id: &str) -> Result<Arc<ExtractedFeatures>> {
        let shared = &self.shared;
        if shared.disposed.load(Ordering::Acquire) {
            return Err(Error::ProviderDisposed);
        }

        // Probe the filesystem before taking the cache lock.
        let basic = shared.locator.locate(volume_id, ArchiveKind::Basic)?;
        let advanced = shared.locator.locate(volume_id, ArchiveKind::Advanced)?;

        let mut cache = shared.cache.lock().expect("provider cache poisoned");
        if shared.disposed.load(Ordering::Acquire) {
            return Err(Error::ProviderDisposed);
        }
        if let Some(existing) = cache.get(volume_id) {
            return Ok(Arc::clone(existing));
        }

        if basic.is_none() && advanced.is_none() {
            warn!(volume_id, "no basic or advanced archive for volume");
        }

        // Loads are scheduled only on this vacant-entry path, so exactly
        // one pair of tasks ever exists per volume id.
        let basic_task = basic.map(|path| shared.submit_load(path, volume_id, ArchiveKind::Basic));
        let advanced_task =
            advanced.map(|path| shared.submit_load(path, volume_id, ArchiveKind::Advanced));

        let volume = Arc::new(ExtractedFeatures::new(
            Arc::downgrade(shared),
            volume_id.to_string(),
            shared.config.load_timeout,
            basic_task,
            advanced_task,
        ));
        cache.insert(volume_id.to_string(), Arc::clone(&volume));
        Ok(volume)
    }

    /// Disposes the provider: interrupts the load worker, closes every
    /// registered document, and invalidates the registry. Idempotent;
    /// never fails. Cleanup problems are logged, since disposal must
    /// always run to completion.
    pub fn close(&self) {
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(root = %self.shared.locator.root().display(), "closing provider");

        self.shared.worker.shutdown();

        let mut cache = self.shared.cache.lock().expect("provider cache poisoned");
        for volume in cache.values() {
            // Deregistration no-ops once disposed, so this cannot
            // re-enter the cache lock.
            volume.close();
        }
        if !cache.is_empty() {
            error!(
                entries = cache.len(),
                "provider closed with dangling cache entries"
            );
            cache.clear();
        }
    }
}

impl Drop for FeatureProvider {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for FeatureProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureProvider")
            .field("root", &self.shared.locator.root())
            .field("disposed", &self.shared.disposed.load(Ordering::Acquire))
            .finish()
    }
}

impl ProviderShared {
    fn submit_load(
        self: &Arc<Self>,
        path: PathBuf,
        volume_id: &str,
        kind: ArchiveKind,
    ) -> TaskHandle<VolumeData> {
        let volume_id = volume_id.to_string();
        self.worker
            .submit(move |cancel| load_archive(&path, &volume_id, kind, cancel))
    }

    /// Callback from [`ExtractedFeatures::close`]. A no-op once the
    /// provider is disposed, so a torn-down registry is never touched.
    pub(crate) fn deregister(&self, volume_id: &str) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        let mut cache = self.cache.lock().expect("provider cache poisoned");
        if cache.remove(volume_id).is_none() {
            warn!(volume_id, "volume closed but was not registered");
        }
    }
}

// Documents hold a Weak back-reference; make sure the type stays usable
// across threads.
#[allow(dead_code)]
fn _assert_send_sync() {
    fn check<T: Send + Sync>() {}
    check::<FeatureProvider>();
    check::<Weak<ProviderShared>>();
    check::<Arc<ExtractedFeatures>>();
}
