//! Page geometry derived from a measured content height.

use serde::{Deserialize, Serialize};

/// Upper bound on the page count. Content taller than this many pages is
/// presented as `MAX_PAGES` pages; the overflow is unreachable by navigation.
pub const MAX_PAGES: u32 = 10_000;

/// Where simulated page breaks fall in a continuously rendered document.
///
/// Invariants: `1 <= page_count <= MAX_PAGES`, and `break_offsets` has exactly
/// `page_count - 1` entries at `(i + 1) * page_height_px`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub page_height_px: f64,
    pub total_content_height_px: f64,
    pub page_count: u32,
    pub break_offsets: Vec<f64>,
}

impl PageGeometry {
    /// Computes geometry for `content_height_px` at a fixed page height.
    ///
    /// Negative or non-finite heights count as empty content. A non-positive
    /// page height yields a single page.
    pub fn compute(content_height_px: f64, page_height_px: f64) -> Self {
        let total = if content_height_px.is_finite() {
            content_height_px.max(0.0)
        } else {
            0.0
        };

        let page_count = if page_height_px > 0.0 && page_height_px.is_finite() {
            let pages = (total / page_height_px).ceil();
            if pages > f64::from(MAX_PAGES) {
                MAX_PAGES
            } else {
                (pages as u32).max(1)
            }
        } else {
            1
        };

        let break_offsets = (1..page_count)
            .map(|i| f64::from(i) * page_height_px)
            .collect();

        Self {
            page_height_px,
            total_content_height_px: total,
            page_count,
            break_offsets,
        }
    }

    /// Clamps a 1-based page number into `[1, page_count]`.
    pub fn clamp_page(&self, page: u32) -> u32 {
        page.clamp(1, self.page_count)
    }

    /// Content-space top of `page` (1-based).
    pub fn page_top(&self, page: u32) -> f64 {
        f64::from(self.clamp_page(page) - 1) * self.page_height_px
    }
}
