//! Extracted-features access: locating, loading, and reading the
//! per-volume archives of an HTRC dataset.

mod locator;
mod page;
mod pos;
mod provider;
mod schema;
mod volume;
mod worker;

pub use locator::ArchiveKind;
pub use page::{PageFeatures, PartOfSpeechData, Section};
pub use pos::PartOfSpeech;
pub use provider::{FeatureProvider, ProviderConfig};
pub use schema::{Features, PageData, SectionData, VolumeData};
pub use volume::{ExtractedFeatures, VolumeMetadata};
