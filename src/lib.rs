//! Client library for HathiTrust Research Center (HTRC) extracted-features
//! data.
//!
//! HTRC datasets store precomputed per-page linguistic statistics for each
//! digitized volume as bzip2-compressed JSON archives, laid out on disk
//! under a [pairtree](https://confluence.ucop.edu/display/Curation/PairTree)
//! hierarchy. This crate covers both halves of that arrangement:
//!
//! - [`pairtree`]: the identifier-to-path mapping — cleaning raw
//!   identifiers into path-safe form, chunking them into bounded-fan-out
//!   directory paths, and reversing both steps exactly.
//! - [`features`]: a concurrent, lazily-populated registry
//!   ([`FeatureProvider`]) that locates a volume's archives through the
//!   pairtree mapping, loads and schema-validates them once on a shared
//!   background worker, and exposes structured page-level read access
//!   ([`ExtractedFeatures`], [`PageFeatures`], [`PartOfSpeechData`]).
//!
//! ```no_run
//! use htrc_client::FeatureProvider;
//!
//! # fn main() -> htrc_client::Result<()> {
//! let provider = FeatureProvider::new("/data/htrc")?;
//! let volume = provider.extracted_features("hvd.ah3d1a")?;
//! println!("{}: {} pages", volume.title()?, volume.page_count()?);
//! let body = volume.page(0).body_data();
//! for token in body.tokens()? {
//!     println!("{token}: {}", body.count(&token)?);
//! }
//! volume.close();
//! provider.close();
//! # Ok(())
//! # }
//! ```
//!
//! Everything is read-only: the archive format and on-disk layout are
//! externally defined and only consumed here.

pub mod error;
pub mod features;
pub mod pairtree;

pub use error::{Error, Result};
pub use features::{
    ArchiveKind, ExtractedFeatures, FeatureProvider, PageFeatures, PartOfSpeech,
    PartOfSpeechData, ProviderConfig, Section, VolumeMetadata,
};
