//! Half-open intervals on a named reference sequence.

use std::fmt;

/// A reference name plus a 0-based, half-open `[start, end)` interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceRegion {
    reference_name: String,
    start: usize,
    end: usize,
}

impl ReferenceRegion {
    /// Creates a new region.
    ///
    /// # Panics
    /// Panics if `end < start`.
    #[must_use]
    pub fn new(reference_name: impl Into<String>, start: usize, end: usize) -> Self {
        assert!(end >= start, "region end ({end}) must not precede start ({start})");
        Self { reference_name: reference_name.into(), start, end }
    }

    /// The reference sequence name.
    #[must_use]
    pub fn reference_name(&self) -> &str {
        &self.reference_name
    }

    /// 0-based inclusive start.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// 0-based exclusive end.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of reference bases covered.
    #[must_use]
    pub fn width(&self) -> usize {
        self.end - self.start
    }

    /// Midpoint of the region, rounded down.
    #[must_use]
    pub fn center(&self) -> usize {
        self.start + self.width() / 2
    }

    /// True if the two regions share at least one base on the same reference.
    #[must_use]
    pub fn overlaps(&self, other: &ReferenceRegion) -> bool {
        self.reference_name == other.reference_name
            && self.start < other.end
            && other.start < self.end
    }

    /// True if `other` lies entirely within this region.
    #[must_use]
    pub fn contains(&self, other: &ReferenceRegion) -> bool {
        self.reference_name == other.reference_name
            && self.start <= other.start
            && other.end <= self.end
    }

    /// Smallest region covering both, or `None` if they are on different references.
    #[must_use]
    pub fn hull(&self, other: &ReferenceRegion) -> Option<ReferenceRegion> {
        (self.reference_name == other.reference_name).then(|| ReferenceRegion {
            reference_name: self.reference_name.clone(),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        })
    }
}

impl fmt::Display for ReferenceRegion {
    /// Formats as `name:start-end` using 1-based inclusive coordinates.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.reference_name, self.start + 1, self.end)
    }
}
