//! Pairtree identifier-to-path mapping.
//!
//! Implements the Pairtree specification v0.1: an arbitrary identifier is
//! cleaned ([`clean_id`]) and then chunked into fixed-length path segments
//! ("shorties", with a possibly shorter final "morty"), producing a
//! relative directory path (a "ppath") with bounded fan-out at every
//! level. The mapping is exactly reversible: [`ppath_base`] strips any
//! encapsulating object directory appended below a ppath, and
//! [`to_object_id`] recovers the original identifier.
//!
//! All functions here are pure; they never touch the filesystem.

pub mod codec;

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

pub use codec::{clean_id, unclean_id};

/// Conventional shorty length used throughout HTRC datasets.
pub const DEFAULT_SHORTY_LENGTH: usize = 2;

/// Directory name marking the root of a pairtree hierarchy.
pub const PAIRTREE_ROOT: &str = "pairtree_root";

/// Segments beginning with this token are pairtree bookkeeping, never
/// part of an identifier.
const RESERVED_PREFIX: &str = "pairtree";

/// Maps an identifier to its relative ppath using the conventional
/// two-character segments.
pub fn to_ppath(id: &str) -> Result<PathBuf> {
    to_ppath_with(id, DEFAULT_SHORTY_LENGTH)
}

/// Maps an identifier to its relative ppath with an explicit segment
/// length.
///
/// The identifier is cleaned and split into `shorty_length`-character
/// segments; the final segment carries whatever remains and may be
/// shorter. Fails with [`Error::InvalidArgument`] for a blank identifier
/// or a zero segment length.
pub fn to_ppath_with(id: &str, shorty_length: usize) -> Result<PathBuf> {
    if id.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "identifier must not be blank".to_string(),
        ));
    }
    if shorty_length == 0 {
        return Err(Error::InvalidArgument(
            "path segment length must be greater than 0".to_string(),
        ));
    }

    let clean = clean_id(id);
    let mut path = PathBuf::new();
    // Cleaned ids are pure ASCII, so byte offsets are char boundaries.
    let mut rest = clean.as_str();
    while !rest.is_empty() {
        let cut = shorty_length.min(rest.len());
        let (segment, tail) = rest.split_at(cut);
        path.push(segment);
        rest = tail;
    }
    Ok(path)
}

/// Returns the longest leading prefix of `ppath` that is a well-formed
/// ppath, excluding any trailing encapsulating directory.
pub fn ppath_base(ppath: &Path) -> Result<PathBuf> {
    ppath_base_with(ppath, DEFAULT_SHORTY_LENGTH)
}

/// [`ppath_base`] with an explicit segment length.
///
/// Walks the path's segments, accepting full-length shorties and at most
/// one trailing morty. A segment longer than `shorty_length`, a segment
/// beginning with the reserved `pairtree` token, or any segment after a
/// morty terminates the walk; whatever follows is an encapsulating
/// directory. Fails with [`Error::NoShorties`] when the very first
/// segment is already too long, since such a path encodes no identifier
/// at all.
pub fn ppath_base_with(ppath: &Path, shorty_length: usize) -> Result<PathBuf> {
    if shorty_length == 0 {
        return Err(Error::InvalidArgument(
            "path segment length must be greater than 0".to_string(),
        ));
    }

    let mut base = PathBuf::new();
    for segment in segments(ppath)? {
        if segment.len() > shorty_length || segment.starts_with(RESERVED_PREFIX) {
            break;
        }
        base.push(segment);
        if segment.len() < shorty_length {
            // A morty is always the final ppath segment.
            break;
        }
    }

    if base.as_os_str().is_empty() {
        return Err(Error::NoShorties(ppath.display().to_string()));
    }
    Ok(base)
}

/// Recovers the identifier encoded by `ppath`, ignoring any trailing
/// encapsulating directory.
pub fn to_object_id(ppath: &Path) -> Result<String> {
    to_object_id_with(ppath, DEFAULT_SHORTY_LENGTH)
}

/// [`to_object_id`] with an explicit segment length.
pub fn to_object_id_with(ppath: &Path, shorty_length: usize) -> Result<String> {
    let base = ppath_base_with(ppath, shorty_length)?;
    let mut clean = String::new();
    for segment in segments(&base)? {
        clean.push_str(segment);
    }
    unclean_id(&clean)
}

fn segments(path: &Path) -> Result<Vec<&str>> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(os) => Some(
                os.to_str()
                    .ok_or_else(|| Error::InvalidArgument(format!("non-UTF-8 path segment in [{}]", path.display()))),
            ),
            Component::CurDir => None,
            _ => Some(Err(Error::InvalidArgument(format!(
                "ppath must be relative: [{}]",
                path.display()
            )))),
        })
        .collect()
}

/// A parsed HTRC pairtree document file path.
///
/// HTRC datasets lay volumes out as
/// `<libid>/pairtree_root/<ppath...>/<cleanid>.<ext>`; parsing such a path
/// recovers the source library id plus the clean and raw object ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPath {
    document_path: PathBuf,
    library_id: String,
    clean_id: String,
    unclean_id: String,
    ppath: PathBuf,
}

impl DocumentPath {
    /// Parses a full pairtree file path.
    ///
    /// Fails with [`Error::InvalidArgument`] if the path has no
    /// `pairtree_root` component, no library id before it, or a file name
    /// without an extension, and with [`Error::MalformedEscape`] if the
    /// clean id does not decode.
    pub fn parse(path: &Path) -> Result<Self> {
        // Document paths may be absolute; only the named components matter.
        let parts = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(os) => Some(os.to_str().ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "non-UTF-8 path segment in [{}]",
                        path.display()
                    ))
                })),
                _ => None,
            })
            .collect::<Result<Vec<_>>>()?;
        let invalid =
            || Error::InvalidArgument(format!("not a pairtree file path: [{}]", path.display()));

        let root_pos = parts
            .iter()
            .position(|s| *s == PAIRTREE_ROOT)
            .ok_or_else(invalid)?;
        if root_pos == 0 || parts.len() < root_pos + 3 {
            return Err(invalid());
        }

        let library_id = parts[root_pos - 1].to_string();
        let file_name = parts[parts.len() - 1];
        let (clean_id, _ext) = file_name.rsplit_once('.').ok_or_else(invalid)?;
        if clean_id.is_empty() {
            return Err(invalid());
        }

        let unclean_id = unclean_id(clean_id)?;
        let ppath = parts[root_pos + 1..parts.len() - 1].iter().collect();

        Ok(Self {
            document_path: path.to_path_buf(),
            library_id,
            clean_id: clean_id.to_string(),
            unclean_id,
            ppath,
        })
    }

    /// The path this value was parsed from.
    pub fn document_path(&self) -> &Path {
        &self.document_path
    }

    /// The source library id.
    pub fn library_id(&self) -> &str {
        &self.library_id
    }

    /// The clean id prefixed with its library id.
    pub fn clean_id(&self) -> String {
        format!("{}.{}", self.library_id, self.clean_id)
    }

    /// The clean id without the library prefix.
    pub fn clean_id_without_library(&self) -> &str {
        &self.clean_id
    }

    /// The raw (unclean) id prefixed with its library id.
    pub fn unclean_id(&self) -> String {
        format!("{}.{}", self.library_id, self.unclean_id)
    }

    /// The raw id without the library prefix.
    pub fn unclean_id_without_library(&self) -> &str {
        &self.unclean_id
    }

    /// The ppath between `pairtree_root` and the file, including any
    /// encapsulating directory.
    pub fn ppath(&self) -> &Path {
        &self.ppath
    }
}

/// Builds the `<libid>/pairtree_root/<ppath...>/<cleanid>` object
/// directory for a composite `library.objectid` raw identifier.
pub fn path_from_unclean_id(unclean_id: &str) -> Result<PathBuf> {
    let (library_id, object_id) = split_composite(unclean_id)?;
    object_dir(library_id, object_id)
}

/// Builds the object directory for a composite `library.objectid` clean
/// identifier.
pub fn path_from_clean_id(composite_clean_id: &str) -> Result<PathBuf> {
    let (library_id, clean_object_id) = split_composite(composite_clean_id)?;
    let object_id = unclean_id(clean_object_id)?;
    object_dir(library_id, &object_id)
}

fn object_dir(library_id: &str, object_id: &str) -> Result<PathBuf> {
    let ppath = to_ppath(object_id)?;
    Ok(PathBuf::from(library_id)
        .join(PAIRTREE_ROOT)
        .join(ppath)
        .join(clean_id(object_id)))
}

/// Splits a composite `source.objectid` identifier at its first `.`.
pub(crate) fn split_composite(id: &str) -> Result<(&str, &str)> {
    id.split_once('.')
        .ok_or_else(|| Error::InvalidArgument(format!("not a composite volume id: [{id}]")))
}
