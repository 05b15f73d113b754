use std::io;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::features::{ArchiveKind, Section};

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("malformed escape sequence in cleaned id [{input}] at byte {position}")]
    MalformedEscape { input: String, position: usize },

    #[error("ppath [{0}] contains no shorties")]
    NoShorties(String),

    #[error("archive data missing element '{element}'")]
    MissingElement { element: String },

    #[error("unexpected schema version [{found}], expecting [{expected}]")]
    SchemaVersionMismatch {
        expected: &'static str,
        found: String,
    },

    /// The requested archive kind does not exist on disk for this volume.
    #[error("no {kind} archive available for volume [{volume_id}]")]
    DataUnavailable {
        volume_id: String,
        kind: ArchiveKind,
    },

    /// Neither the basic nor the advanced archive exists for this volume.
    #[error("volume [{volume_id}] has no extracted-features archives")]
    NoDataAvailable { volume_id: String },

    #[error("timed out after {timeout:?} waiting for {kind} archive of volume [{volume_id}]")]
    LoadTimeout {
        volume_id: String,
        kind: ArchiveKind,
        timeout: Duration,
    },

    #[error("load of {kind} archive for volume [{volume_id}] was interrupted")]
    LoadInterrupted {
        volume_id: String,
        kind: ArchiveKind,
    },

    /// A load task failed; the underlying failure is shared by every
    /// accessor that observes it.
    #[error("failed loading {kind} archive for volume [{volume_id}]")]
    LoadFailed {
        volume_id: String,
        kind: ArchiveKind,
        #[source]
        source: Arc<Error>,
    },

    #[error("provider is disposed")]
    ProviderDisposed,

    #[error("page index {index} out of range for volume with {page_count} pages")]
    IndexOutOfRange { index: usize, page_count: usize },

    #[error("section [{0}] has no data")]
    NoSectionData(Section),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("archive parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
