//! Target region discovery.
//!
//! The [`RegionScanner`] folds over position-ordered reads and clusters those carrying indel
//! evidence, plus the reads overlapping them, into disjoint [`TargetRegion`]s. Every read comes
//! back out exactly once, either as a member of a region or as [`ScanItem::Unaffected`].
//!
//! Close conditions for the open region:
//! - the next read is on another reference
//! - the next read starts more than [`TARGET_CLOSE_SLACK`] bases past the region end
//! - growing the region to cover the next read would exceed `max_target_size`
//!
//! When a region closes because of its width, the read that triggered the close may start a new
//! region only if it carries indel evidence and starts at or after the closed region's end.
//! Otherwise it is unaffected and counted in [`ScanCounters::skipped_target_capacity`].
//!
//! Reads without indel evidence that overlap no open region are held back until they start more
//! than `max_target_size` bases behind the scan position. A region that opens or grows over a
//! held read takes it in, so reads upstream of the first gapped read still get scored.

use std::collections::VecDeque;

use ahash::AHashSet;
use log::debug;

use crate::errors::{RealignError, Result};
use crate::model::{AlignedRead, IndexedRead, ReferenceRegion};

use super::config::RealignmentConfig;

/// Bases past the end of the open region within which reads may still extend it.
pub const TARGET_CLOSE_SLACK: usize = 10;

/// A reference interval with indel evidence and the reads aligned within it.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetRegion {
    region: ReferenceRegion,
    members: Vec<IndexedRead>,
}

impl TargetRegion {
    /// Creates a region from its interval and members.
    #[must_use]
    pub fn new(region: ReferenceRegion, members: Vec<IndexedRead>) -> Self {
        Self { region, members }
    }

    /// The covered interval (hull of member spans).
    #[must_use]
    pub fn region(&self) -> &ReferenceRegion {
        &self.region
    }

    /// Member reads in scan order.
    #[must_use]
    pub fn members(&self) -> &[IndexedRead] {
        &self.members
    }

    /// Splits the region into its interval and members.
    #[must_use]
    pub fn into_parts(self) -> (ReferenceRegion, Vec<IndexedRead>) {
        (self.region, self.members)
    }
}

/// One output element of the scan.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanItem {
    /// A closed target region with its members
    Target(TargetRegion),
    /// A read outside any region, passed through as-is
    Unaffected(IndexedRead),
}

/// Counts of reads that the scan did not place into a region for a reason worth reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCounters {
    /// Reads seen
    pub reads: u64,
    /// Unmapped reads
    pub unmapped: u64,
    /// Mapped reads with an unusable alignment
    pub malformed: u64,
    /// Reads that could not join a region without breaking disjointness or the width limit
    pub skipped_target_capacity: u64,
}

/// A read without indel evidence waiting for a region to cover it.
#[derive(Debug)]
struct HeldRead {
    item: IndexedRead,
    span: ReferenceRegion,
    /// Overlapped a region but could not join it
    blocked: bool,
}

/// An explicit fold over ordered reads producing [`ScanItem`]s.
pub struct RegionScanner {
    max_indel_size: usize,
    max_target_size: usize,
    check_order: bool,
    open: Option<TargetRegion>,
    held: VecDeque<HeldRead>,
    current_reference: Option<String>,
    closed_end: Option<usize>,
    last_start: Option<usize>,
    finished_references: AHashSet<String>,
    counters: ScanCounters,
}

impl RegionScanner {
    /// Creates a scanner using the size limits from `config`.
    ///
    /// When `config.is_sorted` is set, input order is verified as reads arrive.
    #[must_use]
    pub fn new(config: &RealignmentConfig) -> Self {
        Self {
            max_indel_size: config.max_indel_size,
            max_target_size: config.max_target_size,
            check_order: config.is_sorted,
            open: None,
            held: VecDeque::new(),
            current_reference: None,
            closed_end: None,
            last_start: None,
            finished_references: AHashSet::new(),
            counters: ScanCounters::default(),
        }
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn counters(&self) -> ScanCounters {
        self.counters
    }

    /// Feeds one read and returns whatever became final because of it.
    ///
    /// # Errors
    /// Returns [`RealignError::InputNotSorted`] when ordered input was declared and this read
    /// goes backwards.
    pub fn add_read(&mut self, item: IndexedRead) -> Result<Vec<ScanItem>> {
        self.counters.reads += 1;
        let mut out = Vec::new();

        if !item.read.is_mapped() {
            self.counters.unmapped += 1;
            out.push(ScanItem::Unaffected(item));
            return Ok(out);
        }

        if let Err(reason) = item.read.check_alignment() {
            debug!("Skipping read '{}' with malformed alignment: {}", item.read.name(), reason);
            self.counters.malformed += 1;
            out.push(ScanItem::Unaffected(item));
            return Ok(out);
        }

        // check_alignment guarantees a placement from here on
        let Some(span) = item.read.span() else {
            out.push(ScanItem::Unaffected(item));
            return Ok(out);
        };

        self.advance_to(&item.read, &span, &mut out)?;
        self.release_held(span.start(), &mut out);

        let evidence = item.read.has_indel(self.max_indel_size);
        let overlaps_open = self.open.as_ref().is_some_and(|open| open.region.overlaps(&span));
        if !evidence && !overlaps_open {
            if span.width() > self.max_target_size {
                out.push(ScanItem::Unaffected(item));
            } else {
                self.held.push_back(HeldRead { item, span, blocked: false });
            }
            return Ok(out);
        }

        if span.width() > self.max_target_size {
            self.counters.skipped_target_capacity += 1;
            out.push(ScanItem::Unaffected(item));
            return Ok(out);
        }

        let hull = self.open.as_ref().and_then(|open| open.region.hull(&span));
        match hull {
            Some(hull) if hull.width() <= self.max_target_size => {
                if let Some(open) = self.open.as_mut() {
                    open.region = hull;
                    open.members.push(item);
                }
            }
            Some(_) => {
                self.close_open(&mut out);
                self.open_or_skip(item, span, evidence, &mut out);
            }
            None => self.open_or_skip(item, span, evidence, &mut out),
        }
        self.admit_held();

        Ok(out)
    }

    /// Closes any open region and releases every held read.
    pub fn finish(&mut self) -> Vec<ScanItem> {
        let mut out = Vec::new();
        self.close_open(&mut out);
        self.release_held(usize::MAX, &mut out);
        out
    }

    /// Handles reference changes, order checking, and slack-based closing ahead of `read`.
    fn advance_to(
        &mut self,
        read: &AlignedRead,
        span: &ReferenceRegion,
        out: &mut Vec<ScanItem>,
    ) -> Result<()> {
        let name = span.reference_name();
        let start = span.start();

        if self.current_reference.as_deref() != Some(name) {
            if self.check_order && self.finished_references.contains(name) {
                return Err(self.not_sorted(read, span));
            }
            self.close_open(out);
            self.release_held(usize::MAX, out);
            if let Some(previous) = self.current_reference.take() {
                self.finished_references.insert(previous);
            }
            self.current_reference = Some(name.to_string());
            self.closed_end = None;
            self.last_start = None;
        }

        if self.check_order && self.last_start.is_some_and(|last| start < last) {
            return Err(self.not_sorted(read, span));
        }
        self.last_start = Some(start);

        if self.open.as_ref().is_some_and(|open| start > open.region.end() + TARGET_CLOSE_SLACK) {
            self.close_open(out);
        }
        Ok(())
    }

    fn open_or_skip(
        &mut self,
        item: IndexedRead,
        span: ReferenceRegion,
        evidence: bool,
        out: &mut Vec<ScanItem>,
    ) {
        let after_closed = self.closed_end.is_none_or(|end| span.start() >= end);
        if evidence && after_closed {
            self.open = Some(TargetRegion::new(span, vec![item]));
        } else {
            self.counters.skipped_target_capacity += 1;
            out.push(ScanItem::Unaffected(item));
        }
    }

    /// Moves held reads overlapping the open region into it, repeating while the region grows.
    fn admit_held(&mut self) {
        let Some(open) = self.open.as_mut() else {
            return;
        };
        let mut grew = true;
        while grew {
            grew = false;
            let mut i = 0;
            while i < self.held.len() {
                let span = &self.held[i].span;
                if !span.overlaps(&open.region) {
                    i += 1;
                    continue;
                }
                let fits = open.region.hull(span).filter(|hull| {
                    hull.width() <= self.max_target_size
                        && self.closed_end.is_none_or(|end| hull.start() >= end)
                });
                match fits {
                    Some(hull) => {
                        if let Some(held) = self.held.remove(i) {
                            open.region = hull;
                            open.members.push(held.item);
                            grew = true;
                        }
                    }
                    None => {
                        self.held[i].blocked = true;
                        i += 1;
                    }
                }
            }
        }
    }

    /// Releases held reads that start at least `max_target_size` bases before `position`; no
    /// region reaching a read at `position` could still cover them.
    fn release_held(&mut self, position: usize, out: &mut Vec<ScanItem>) {
        while self
            .held
            .front()
            .is_some_and(|held| position.saturating_sub(held.span.start()) >= self.max_target_size)
        {
            if let Some(held) = self.held.pop_front() {
                if held.blocked {
                    self.counters.skipped_target_capacity += 1;
                }
                out.push(ScanItem::Unaffected(held.item));
            }
        }
    }

    fn close_open(&mut self, out: &mut Vec<ScanItem>) {
        if let Some(mut region) = self.open.take() {
            self.closed_end = Some(region.region.end());
            region.members.sort_by_key(|m| (m.read.start(), m.index));
            out.push(ScanItem::Target(region));
        }
    }

    fn not_sorted(&self, read: &AlignedRead, span: &ReferenceRegion) -> RealignError {
        let previous = match (&self.current_reference, self.last_start) {
            (Some(name), Some(last)) => format!("{name}:{last}"),
            (Some(name), None) => name.clone(),
            _ => "start of input".to_string(),
        };
        RealignError::InputNotSorted {
            read_name: read.name().to_string(),
            ref_name: span.reference_name().to_string(),
            position: span.start(),
            previous,
        }
    }
}

/// Lazy adaptor running a [`RegionScanner`] over an iterator of reads.
pub struct RegionScan<I> {
    reads: I,
    scanner: RegionScanner,
    pending: VecDeque<ScanItem>,
    done: bool,
}

impl<I: Iterator<Item = IndexedRead>> RegionScan<I> {
    /// Wraps `reads`, which must be in scan order.
    pub fn new(reads: I, config: &RealignmentConfig) -> Self {
        Self { reads, scanner: RegionScanner::new(config), pending: VecDeque::new(), done: false }
    }

    /// Counters accumulated so far; complete once the iterator is exhausted.
    #[must_use]
    pub fn counters(&self) -> ScanCounters {
        self.scanner.counters()
    }
}

impl<I: Iterator<Item = IndexedRead>> Iterator for RegionScan<I> {
    type Item = Result<ScanItem>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(Ok(item));
            }
            if self.done {
                return None;
            }
            match self.reads.next() {
                Some(read) => match self.scanner.add_read(read) {
                    Ok(items) => self.pending.extend(items),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                },
                None => {
                    self.done = true;
                    self.pending.extend(self.scanner.finish());
                }
            }
        }
    }
}

/// Orders reads for scanning: placed reads first, then by reference name, start and input index.
pub fn sort_for_scan(reads: &mut [IndexedRead]) {
    reads.sort_by(|a, b| scan_key(a).cmp(&scan_key(b)));
}

fn scan_key(r: &IndexedRead) -> (bool, Option<&str>, Option<usize>, usize) {
    let placed = r.read.reference_name().is_some() && r.read.start().is_some();
    (!placed, r.read.reference_name(), r.read.start(), r.index)
}
