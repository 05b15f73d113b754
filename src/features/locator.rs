//! Locates extracted-features archives inside an HTRC dataset tree.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::pairtree::{self, PAIRTREE_ROOT};

/// The two archive flavors an HTRC volume may carry. A volume can have
/// either, both, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Basic,
    Advanced,
}

impl ArchiveKind {
    pub const ALL: [ArchiveKind; 2] = [ArchiveKind::Basic, ArchiveKind::Advanced];

    /// The directory and file-name token for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            ArchiveKind::Basic => "basic",
            ArchiveKind::Advanced => "advanced",
        }
    }

    /// The `features.schemaVersion` value an archive of this kind must
    /// declare.
    pub fn schema_version(self) -> &'static str {
        match self {
            ArchiveKind::Basic => "2.0",
            ArchiveKind::Advanced => "2.0",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computes candidate archive paths under a dataset root directory.
///
/// Datasets are laid out as
/// `<root>/<kind>/<source>/pairtree_root/<ppath...>/<cleanid>/<source>.<cleanid>.<kind>.json.bz2`.
#[derive(Debug, Clone)]
pub(crate) struct ArchiveLocator {
    root: PathBuf,
}

impl ArchiveLocator {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The path at which an archive of `kind` would live for `volume_id`,
    /// whether or not it exists.
    pub fn candidate(&self, volume_id: &str, kind: ArchiveKind) -> Result<PathBuf> {
        let (source, object_id) = pairtree::split_composite(volume_id)?;
        let ppath = pairtree::to_ppath(object_id)?;
        let clean = pairtree::clean_id(object_id);
        Ok(self
            .root
            .join(kind.as_str())
            .join(source)
            .join(PAIRTREE_ROOT)
            .join(ppath)
            .join(&clean)
            .join(format!("{source}.{clean}.{kind}.json.bz2")))
    }

    /// Resolves the archive of `kind` for `volume_id`, or `None` if no
    /// such file exists. Absence is a normal state, not an error.
    pub fn locate(&self, volume_id: &str, kind: ArchiveKind) -> Result<Option<PathBuf>> {
        let file = self.candidate(volume_id, kind)?;
        Ok(if file.is_file() { Some(file) } else { None })
    }
}
