// Document rendering: resume data + theme → positioned text blocks.
// The preview engine only needs the total height and the ability to pick out
// the lines in a vertical slice; everything else is renderer-internal.

pub mod text_layout;
pub mod theme;

use serde::Serialize;
use serde_json::Value;

pub use text_layout::TextLayoutRenderer;
pub use theme::Theme;

/// Turns resume data into a laid-out document.
///
/// Must be pure: identical inputs give identical output, so one output can
/// back both the hidden measurement copy and the visible copy.
pub trait DocumentRenderer {
    fn render(&self, data: &Value, theme: &Theme, width_px: f64) -> RenderedDocument;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockKind {
    Title,
    Heading { level: u8 },
    Paragraph,
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Line {
    pub text: String,
    pub top_px: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub kind: BlockKind,
    pub top_px: f64,
    pub height_px: f64,
    pub line_height_px: f64,
    pub lines: Vec<Line>,
}

/// A fully laid-out, unpaginated document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub width_px: f64,
    /// Natural height of the whole document; what the layout observer measures.
    pub height_px: f64,
    pub blocks: Vec<Block>,
}

impl RenderedDocument {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Lines whose top edge falls in `[top_px, bottom_px)`, with their block kind.
    pub fn lines_in(&self, top_px: f64, bottom_px: f64) -> Vec<(BlockKind, &Line)> {
        self.blocks
            .iter()
            .filter(|b| b.top_px < bottom_px && b.top_px + b.height_px > top_px)
            .flat_map(|b| b.lines.iter().map(move |l| (b.kind, l)))
            .filter(|(_, l)| l.top_px >= top_px && l.top_px < bottom_px)
            .collect()
    }
}
