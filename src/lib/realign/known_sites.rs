//! Known indel sites loaded from a tab-separated file.
//!
//! The file has a header line `contig	position	ref	alt` and one VCF-style row per site:
//! a 1-based position and anchored alleles whose first base is shared. Only simple insertions
//! and deletions are kept; SNVs, MNVs and complex alleles are dropped.

use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::model::{IndelEvent, ReferenceRegion};
use crate::validation::validate_file_exists;

/// One row of a known-sites file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownSiteRecord {
    /// Reference sequence name
    pub contig: String,
    /// 1-based position of the anchor base
    pub position: usize,
    /// Reference allele, starting with the anchor base
    #[serde(rename = "ref")]
    pub reference: String,
    /// Alternate allele, starting with the anchor base
    pub alt: String,
}

impl KnownSiteRecord {
    /// Converts the anchored alleles into an [`IndelEvent`], or `None` if the site is not a simple
    /// insertion or deletion.
    #[must_use]
    pub fn to_indel_event(&self) -> Option<IndelEvent> {
        let reference = self.reference.as_bytes();
        let alt = self.alt.as_bytes();
        if self.position == 0 || reference.is_empty() || alt.is_empty() {
            return None;
        }
        if !reference[0].eq_ignore_ascii_case(&alt[0]) {
            return None;
        }

        // 0-based position of the first base after the anchor
        let start = self.position;
        match (reference.len(), alt.len()) {
            (1, n) if n > 1 => Some(IndelEvent {
                start,
                end: start,
                inserted: alt[1..].to_ascii_uppercase(),
            }),
            (n, 1) if n > 1 => Some(IndelEvent { start, end: start + n - 1, inserted: Vec::new() }),
            _ => None,
        }
    }
}

/// Known indels grouped by contig and sorted by start.
#[derive(Debug, Clone, Default)]
pub struct KnownSites {
    by_contig: AHashMap<String, Vec<IndelEvent>>,
}

impl KnownSites {
    /// Builds the table from `(contig, event)` pairs, dropping duplicates.
    pub fn new(events: impl IntoIterator<Item = (String, IndelEvent)>) -> Self {
        let mut by_contig: AHashMap<String, Vec<IndelEvent>> = AHashMap::new();
        for (contig, event) in events {
            by_contig.entry(contig).or_default().push(event);
        }
        for events in by_contig.values_mut() {
            events.sort_by(|a, b| {
                (a.start, a.end, &a.inserted).cmp(&(b.start, b.end, &b.inserted))
            });
            events.dedup();
        }
        Self { by_contig }
    }

    /// Builds the table from file rows, skipping anything that is not a simple indel.
    pub fn from_records(records: impl IntoIterator<Item = KnownSiteRecord>) -> Self {
        let mut skipped = 0usize;
        let events: Vec<(String, IndelEvent)> = records
            .into_iter()
            .filter_map(|record| match record.to_indel_event() {
                Some(event) => Some((record.contig, event)),
                None => {
                    skipped += 1;
                    None
                }
            })
            .collect();
        if skipped > 0 {
            debug!("Ignored {skipped} known sites that are not simple insertions or deletions");
        }
        Self::new(events)
    }

    /// Reads a known-sites TSV file.
    ///
    /// # Errors
    /// Returns an error if the file is missing or any row fails to parse.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        validate_file_exists(path, "known sites")?;
        let records: Vec<KnownSiteRecord> = DelimFile::default()
            .read_tsv(&path)
            .with_context(|| format!("Failed to read known sites: {}", path.display()))?;
        let total = records.len();
        let sites = Self::from_records(records);
        info!("Loaded {} known indels from {} sites in {}", sites.len(), total, path.display());
        Ok(sites)
    }

    /// Total number of indels across contigs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_contig.values().map(Vec::len).sum()
    }

    /// True if the table holds no indels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Indels lying entirely within `region`.
    pub fn within<'a>(&'a self, region: &'a ReferenceRegion) -> impl Iterator<Item = &'a IndelEvent> {
        let events = self.by_contig.get(region.reference_name()).map_or(&[][..], Vec::as_slice);
        let first = events.partition_point(|e| e.start < region.start());
        events[first..]
            .iter()
            .take_while(move |e| e.start <= region.end())
            .filter(move |e| e.end <= region.end())
    }
}
