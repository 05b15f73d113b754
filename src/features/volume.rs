//! Per-volume extracted-features document handle.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use bzip2::read::BzDecoder;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::features::locator::ArchiveKind;
use crate::features::page::PageFeatures;
use crate::features::provider::ProviderShared;
use crate::features::schema::{RawVolume, VolumeData};
use crate::features::worker::{TaskHandle, WaitError};

/// Extracted-features data for one volume.
///
/// Created by a provider, which schedules at most one background load per
/// available archive kind at registration time. Data accessors block on
/// the relevant load with a bounded wait; the load's outcome (including
/// failure) is computed once and reused. Call [`close`](Self::close) when
/// done so the provider can drop its registration.
pub struct ExtractedFeatures {
    provider: Weak<ProviderShared>,
    volume_id: String,
    load_timeout: Duration,
    basic: Option<TaskHandle<VolumeData>>,
    advanced: Option<TaskHandle<VolumeData>>,
}

impl ExtractedFeatures {
    pub(crate) fn new(
        provider: Weak<ProviderShared>,
        volume_id: String,
        load_timeout: Duration,
        basic: Option<TaskHandle<VolumeData>>,
        advanced: Option<TaskHandle<VolumeData>>,
    ) -> Self {
        Self {
            provider,
            volume_id,
            load_timeout,
            basic,
            advanced,
        }
    }

    /// The composite `source.objectid` identifier of this volume.
    pub fn volume_id(&self) -> &str {
        &self.volume_id
    }

    /// Whether a basic archive existed when this volume was located.
    pub fn has_basic(&self) -> bool {
        self.basic.is_some()
    }

    /// Whether an advanced archive existed when this volume was located.
    pub fn has_advanced(&self) -> bool {
        self.advanced.is_some()
    }

    /// Blocks (bounded) on the load of the given archive kind and returns
    /// the validated document.
    ///
    /// Fails with [`Error::DataUnavailable`] when no archive of that kind
    /// exists, [`Error::LoadTimeout`] past the bounded wait,
    /// [`Error::LoadInterrupted`] if the provider was closed, or
    /// [`Error::LoadFailed`] wrapping the cached load failure.
    pub fn archive_data(&self, kind: ArchiveKind) -> Result<Arc<VolumeData>> {
        let task = match kind {
            ArchiveKind::Basic => self.basic.as_ref(),
            ArchiveKind::Advanced => self.advanced.as_ref(),
        }
        .ok_or_else(|| Error::DataUnavailable {
            volume_id: self.volume_id.clone(),
            kind,
        })?;

        task.wait(self.load_timeout).map_err(|e| match e {
            WaitError::Timeout => Error::LoadTimeout {
                volume_id: self.volume_id.clone(),
                kind,
                timeout: self.load_timeout,
            },
            WaitError::Cancelled => Error::LoadInterrupted {
                volume_id: self.volume_id.clone(),
                kind,
            },
            WaitError::Failed(source) => Error::LoadFailed {
                volume_id: self.volume_id.clone(),
                kind,
                source,
            },
        })
    }

    /// Basic-preferred document data, falling back to the advanced
    /// archive when only that one exists.
    fn preferred_data(&self) -> Result<Arc<VolumeData>> {
        if self.basic.is_some() {
            self.archive_data(ArchiveKind::Basic)
        } else if self.advanced.is_some() {
            self.archive_data(ArchiveKind::Advanced)
        } else {
            Err(Error::NoDataAvailable {
                volume_id: self.volume_id.clone(),
            })
        }
    }

    /// A non-blocking view over the volume's bibliographic metadata.
    /// Reading through the view blocks like any other data accessor.
    pub fn metadata(&self) -> VolumeMetadata<'_> {
        VolumeMetadata { volume: self }
    }

    /// The volume title from `metadata.title`.
    pub fn title(&self) -> Result<String> {
        self.metadata_value("title")
    }

    fn metadata_value(&self, key: &str) -> Result<String> {
        let data = self.preferred_data()?;
        data.metadata
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| Error::MissingElement {
                element: format!("metadata.{key}"),
            })
    }

    /// The number of pages from `features.pageCount`.
    pub fn page_count(&self) -> Result<usize> {
        let data = self.preferred_data()?;
        data.features
            .page_count
            .map(|n| n as usize)
            .ok_or_else(|| Error::MissingElement {
                element: "features.pageCount".to_string(),
            })
    }

    /// A view over page `index`.
    ///
    /// Construction is cheap and never blocks; the index is validated
    /// lazily on first data access, which fails with
    /// [`Error::IndexOutOfRange`] when it exceeds the page count at that
    /// time.
    pub fn page(self: &Arc<Self>, index: usize) -> PageFeatures {
        PageFeatures::new(Arc::clone(self), index)
    }

    /// Deregisters this volume from its provider. A no-op once the
    /// provider is disposed. Callers should not close a volume twice.
    pub fn close(&self) {
        if let Some(provider) = self.provider.upgrade() {
            provider.deregister(&self.volume_id);
        }
    }
}

impl std::fmt::Debug for ExtractedFeatures {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractedFeatures")
            .field("volume_id", &self.volume_id)
            .field("has_basic", &self.has_basic())
            .field("has_advanced", &self.has_advanced())
            .finish()
    }
}

/// Non-blocking handle to a volume's `metadata` object.
#[derive(Debug)]
pub struct VolumeMetadata<'a> {
    volume: &'a ExtractedFeatures,
}

impl VolumeMetadata<'_> {
    /// The metadata object's own schema version (`metadata.schemaVersion`),
    /// versioned independently of the features schema.
    pub fn schema_version(&self) -> Result<String> {
        self.volume.metadata_value("schemaVersion")
    }

    pub fn title(&self) -> Result<String> {
        self.volume.title()
    }
}

/// Reader adapter that fails with an interruption error once the worker's
/// shutdown flag is raised, checked between reads so cancellation lands
/// mid-decompress.
struct CancelRead<'a, R> {
    inner: R,
    cancel: &'a AtomicBool,
}

impl<R: Read> Read for CancelRead<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.cancel.load(Ordering::Acquire) {
            return Err(io::Error::other("archive load interrupted"));
        }
        self.inner.read(buf)
    }
}

/// Decompresses, parses, and schema-validates one archive file. Runs on
/// the provider's load worker.
pub(crate) fn load_archive(
    path: &Path,
    volume_id: &str,
    kind: ArchiveKind,
    cancel: &AtomicBool,
) -> Result<VolumeData> {
    debug!(volume_id, %kind, path = %path.display(), "loading archive");
    let result = read_archive(path, cancel).and_then(|raw| raw.validate(kind.schema_version()));
    if let Err(err) = &result {
        if cancel.load(Ordering::Acquire) {
            debug!(volume_id, %kind, "archive load interrupted");
        } else {
            error!(volume_id, %kind, path = %path.display(), "archive load failed: {err}");
        }
    }
    result
}

fn read_archive(path: &Path, cancel: &AtomicBool) -> Result<RawVolume> {
    let file = File::open(path)?;
    let raw = CancelRead {
        inner: BufReader::new(file),
        cancel,
    };
    let decoder = BzDecoder::new(raw);
    Ok(serde_json::from_reader(BufReader::new(decoder))?)
}
