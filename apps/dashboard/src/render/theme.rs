use serde::Serialize;

use crate::layout::FontFamily;

/// The height-affecting part of a visual theme. Colors live with the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub name: &'static str,
    pub font: FontFamily,
    pub font_size_px: f64,
    /// Line height as a multiple of the font size.
    pub line_height: f64,
    /// Section heading size as a multiple of the font size.
    pub heading_scale: f64,
    pub margin_mm: f64,
    pub section_gap_px: f64,
    pub item_gap_px: f64,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            name: "classic",
            font: FontFamily::EbGaramond,
            font_size_px: 15.0,
            line_height: 1.4,
            heading_scale: 1.3,
            margin_mm: 20.0,
            section_gap_px: 18.0,
            item_gap_px: 8.0,
        }
    }

    pub fn modern() -> Self {
        Self {
            name: "modern",
            font: FontFamily::Inter,
            font_size_px: 14.0,
            line_height: 1.5,
            heading_scale: 1.4,
            margin_mm: 18.0,
            section_gap_px: 22.0,
            item_gap_px: 10.0,
        }
    }

    pub fn compact() -> Self {
        Self {
            name: "compact",
            font: FontFamily::Lato,
            font_size_px: 12.0,
            line_height: 1.3,
            heading_scale: 1.2,
            margin_mm: 12.0,
            section_gap_px: 12.0,
            item_gap_px: 4.0,
        }
    }

    /// Looks a theme up by name, falling back to `classic`.
    pub fn by_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "modern" => Self::modern(),
            "compact" => Self::compact(),
            _ => Self::classic(),
        }
    }
}
