//! Physical page sizes and the on-screen viewport.
//!
//! CSS reference pixels: 96 px per inch, so 1 mm = 96 / 25.4 px.

use serde::{Deserialize, Serialize};

pub const PX_PER_INCH: f64 = 96.0;
pub const MM_PER_INCH: f64 = 25.4;
/// Fraction of the fitted scale actually used, so the page never touches the viewport edges.
pub const SAFETY_MARGIN: f64 = 0.9;

pub fn mm_to_px(mm: f64) -> f64 {
    mm * PX_PER_INCH / MM_PER_INCH
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaperSize {
    /// 210 × 297 mm.
    A4,
    /// 8.5 × 11 in.
    Letter,
}

impl PaperSize {
    /// (width, height) in millimetres.
    pub fn dimensions_mm(self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (210.0, 297.0),
            PaperSize::Letter => (215.9, 279.4),
        }
    }

    pub fn width_px(self) -> f64 {
        mm_to_px(self.dimensions_mm().0)
    }

    pub fn height_px(self) -> f64 {
        mm_to_px(self.dimensions_mm().1)
    }
}

/// On-screen area available to the preview, in px.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// False until the host has laid the viewport out with a real size.
    pub fn is_measurable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Largest scale at which one full page fits the viewport in both dimensions,
/// reduced by [`SAFETY_MARGIN`]. `None` if the viewport is not measurable.
pub fn display_scale(paper: PaperSize, viewport: Viewport) -> Option<f64> {
    if !viewport.is_measurable() {
        return None;
    }
    let fit = (viewport.width / paper.width_px()).min(viewport.height / paper.height_px());
    Some(fit * SAFETY_MARGIN)
}
