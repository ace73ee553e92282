//! Derived transfer metrics.
//!
//! The ratio is owned by this crate and only ever recomputed from the two
//! counters; it is never set directly.

use serde::{Deserialize, Serialize};

/// Ratio reported when something was uploaded but nothing downloaded yet.
pub const NO_DOWNLOADS_RATIO: f64 = -1.0;

/// Compute the share ratio for a pair of counters.
///
/// Total over all inputs:
/// - `0` when nothing was uploaded (including when both are zero)
/// - [`NO_DOWNLOADS_RATIO`] when uploaded > 0 and downloaded == 0
/// - otherwise `uploaded / downloaded`, rounded to two decimals
pub fn compute_ratio(uploaded: u64, downloaded: u64) -> f64 {
    if uploaded > 0 && downloaded == 0 {
        NO_DOWNLOADS_RATIO
    } else if uploaded == 0 || downloaded == 0 {
        0.0
    } else {
        ((uploaded as f64 / downloaded as f64) * 100.0).round() / 100.0
    }
}

/// Upload/download counters with their derived ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferStats {
    uploaded: u64,
    downloaded: u64,
    ratio: f64,
}

impl TransferStats {
    /// Create stats from counters, deriving the ratio.
    pub fn new(uploaded: u64, downloaded: u64) -> Self {
        Self {
            uploaded,
            downloaded,
            ratio: compute_ratio(uploaded, downloaded),
        }
    }

    /// Bytes uploaded.
    pub fn uploaded(&self) -> u64 {
        self.uploaded
    }

    /// Bytes downloaded.
    pub fn downloaded(&self) -> u64 {
        self.downloaded
    }

    /// The derived ratio as of the last recomputation.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Replace both counters and recompute.
    pub fn set_counters(&mut self, uploaded: u64, downloaded: u64) {
        self.uploaded = uploaded;
        self.downloaded = downloaded;
        self.recompute();
    }

    /// Add to the counters and recompute.
    pub fn add(&mut self, uploaded: u64, downloaded: u64) {
        self.uploaded = self.uploaded.saturating_add(uploaded);
        self.downloaded = self.downloaded.saturating_add(downloaded);
        self.recompute();
    }

    /// Recompute the ratio from the counters.
    ///
    /// Returns `true` if the stored ratio changed.
    pub fn recompute(&mut self) -> bool {
        let ratio = compute_ratio(self.uploaded, self.downloaded);
        let changed = ratio.to_bits() != self.ratio.to_bits();
        self.ratio = ratio;
        changed
    }
}
