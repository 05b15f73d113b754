//! Per-page and per-section views over a loaded volume.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::features::locator::ArchiveKind;
use crate::features::schema::{PageData, VolumeData};
use crate::features::volume::ExtractedFeatures;

/// The section of a page a part-of-speech view reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Body,
    Header,
    Footer,
}

impl Section {
    pub fn as_str(self) -> &'static str {
        match self {
            Section::Body => "body",
            Section::Header => "header",
            Section::Footer => "footer",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A view over one page of a volume's basic features.
///
/// Cheap to construct and clone. The underlying archive data is resolved
/// on first data access (blocking on the load if necessary) and cached on
/// the view, so repeated accessors such as token lookups never re-block.
#[derive(Clone)]
pub struct PageFeatures {
    inner: Arc<PageInner>,
}

struct PageInner {
    volume: Arc<ExtractedFeatures>,
    index: usize,
    // Resolved basic archive, cached on first successful access.
    basic: Mutex<Option<Arc<VolumeData>>>,
}

impl PageFeatures {
    pub(crate) fn new(volume: Arc<ExtractedFeatures>, index: usize) -> Self {
        Self {
            inner: Arc::new(PageInner {
                volume,
                index,
                basic: Mutex::new(None),
            }),
        }
    }

    /// The volume this page belongs to.
    pub fn volume(&self) -> &Arc<ExtractedFeatures> {
        &self.inner.volume
    }

    /// The zero-based page index this view was created with.
    pub fn index(&self) -> usize {
        self.inner.index
    }

    /// Resolves (and caches) the basic archive, validating the page index
    /// against it. Racing callers may resolve redundantly; the cache
    /// write is idempotent.
    fn basic_data(&self) -> Result<Arc<VolumeData>> {
        if let Some(data) = self.inner.basic.lock().expect("page cache poisoned").clone() {
            return Ok(data);
        }

        let data = self.inner.volume.archive_data(ArchiveKind::Basic)?;
        let page_count = data.features.pages.len();
        if self.inner.index >= page_count {
            return Err(Error::IndexOutOfRange {
                index: self.inner.index,
                page_count,
            });
        }

        *self.inner.basic.lock().expect("page cache poisoned") = Some(Arc::clone(&data));
        Ok(data)
    }

    fn with_page<R>(&self, f: impl FnOnce(&PageData) -> Result<R>) -> Result<R> {
        let data = self.basic_data()?;
        f(&data.features.pages[self.inner.index])
    }

    /// The page's sequence label (`pages[i].seq`).
    pub fn seq(&self) -> Result<String> {
        self.with_page(|page| {
            page.seq.clone().ok_or_else(|| Error::MissingElement {
                element: "pages[].seq".to_string(),
            })
        })
    }

    /// The page's scan date (`pages[i].dateCreated`).
    pub fn date_created(&self) -> Result<String> {
        self.with_page(|page| {
            page.date_created
                .clone()
                .ok_or_else(|| Error::MissingElement {
                    element: "pages[].dateCreated".to_string(),
                })
        })
    }

    pub fn token_count(&self) -> Result<u64> {
        self.with_page(|page| {
            page.token_count.ok_or_else(|| Error::MissingElement {
                element: "pages[].tokenCount".to_string(),
            })
        })
    }

    pub fn line_count(&self) -> Result<u64> {
        self.with_page(|page| {
            page.line_count.ok_or_else(|| Error::MissingElement {
                element: "pages[].lineCount".to_string(),
            })
        })
    }

    /// Part-of-speech data for the page body.
    pub fn body_data(&self) -> PartOfSpeechData {
        self.section_data(Section::Body)
    }

    /// Part-of-speech data for the page header.
    pub fn header_data(&self) -> PartOfSpeechData {
        self.section_data(Section::Header)
    }

    /// Part-of-speech data for the page footer.
    pub fn footer_data(&self) -> PartOfSpeechData {
        self.section_data(Section::Footer)
    }

    pub fn section_data(&self, section: Section) -> PartOfSpeechData {
        PartOfSpeechData {
            page: self.clone(),
            section,
        }
    }
}

impl fmt::Debug for PageFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageFeatures")
            .field("volume_id", &self.inner.volume.volume_id())
            .field("index", &self.inner.index)
            .finish()
    }
}

/// Token and part-of-speech counts for one section of one page.
#[derive(Debug, Clone)]
pub struct PartOfSpeechData {
    page: PageFeatures,
    section: Section,
}

impl PartOfSpeechData {
    /// The page this view reads from.
    pub fn page(&self) -> &PageFeatures {
        &self.page
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn is_body(&self) -> bool {
        self.section == Section::Body
    }

    pub fn is_header(&self) -> bool {
        self.section == Section::Header
    }

    pub fn is_footer(&self) -> bool {
        self.section == Section::Footer
    }

    fn with_token_pos_count<R>(
        &self,
        f: impl FnOnce(&HashMap<String, HashMap<String, u64>>) -> R,
    ) -> Result<R> {
        let section = self.section;
        self.page.with_page(|page| {
            let data = match section {
                Section::Body => &page.body,
                Section::Header => &page.header,
                Section::Footer => &page.footer,
            }
            .as_ref()
            .ok_or(Error::NoSectionData(section))?;
            let counts = data
                .token_pos_count
                .as_ref()
                .ok_or_else(|| Error::MissingElement {
                    element: format!("pages[].{section}.tokenPosCount"),
                })?;
            Ok(f(counts))
        })
    }

    /// The set of tokens appearing in this section.
    pub fn tokens(&self) -> Result<HashSet<String>> {
        self.with_token_pos_count(|counts| counts.keys().cloned().collect())
    }

    /// Per-part-of-speech counts for `token`. An unknown token yields an
    /// empty map, not an error.
    pub fn pos_count(&self, token: &str) -> Result<HashMap<String, u64>> {
        self.with_token_pos_count(|counts| counts.get(token).cloned().unwrap_or_default())
    }

    /// Total occurrences of `token` in this section, summed across parts
    /// of speech.
    pub fn count(&self, token: &str) -> Result<u64> {
        self.with_token_pos_count(|counts| {
            counts
                .get(token)
                .map(|by_pos| by_pos.values().sum())
                .unwrap_or(0)
        })
    }
}
