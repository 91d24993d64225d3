//! Text-layout renderer for free-form resume data.
//!
//! Walk rules:
//! - top-level `name` string → title
//! - object/array under a key → heading (humanized key), then its contents
//! - array elements: scalars → bullets, objects → nested items separated by a gap
//! - other scalars → paragraphs; nulls and empty strings are skipped
//!
//! Text is wrapped with the theme font's width metrics at the page content width.

use serde_json::{Map, Value};

use crate::layout::{get_metrics, mm_to_px};
use crate::render::{Block, BlockKind, DocumentRenderer, Line, RenderedDocument, Theme};

const TITLE_SCALE: f64 = 2.0;
const SUBHEADING_SCALE: f64 = 1.05;
const BULLET_INDENT_EM: f64 = 1.2;

#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayoutRenderer;

impl DocumentRenderer for TextLayoutRenderer {
    fn render(&self, data: &Value, theme: &Theme, width_px: f64) -> RenderedDocument {
        let margin = mm_to_px(theme.margin_mm);
        let mut cursor = Cursor {
            theme,
            content_width_px: (width_px - 2.0 * margin).max(theme.font_size_px),
            y: margin,
            blocks: Vec::new(),
        };

        match data {
            Value::Object(map) => cursor.object(map, 0),
            other => cursor.value(None, other, 0),
        }

        let height_px = if cursor.blocks.is_empty() {
            0.0
        } else {
            cursor.y + margin
        };

        RenderedDocument {
            width_px,
            height_px,
            blocks: cursor.blocks,
        }
    }
}

struct Cursor<'a> {
    theme: &'a Theme,
    content_width_px: f64,
    y: f64,
    blocks: Vec<Block>,
}

impl Cursor<'_> {
    fn object(&mut self, map: &Map<String, Value>, depth: u8) {
        let title = match depth {
            0 => map.get("name").and_then(Value::as_str),
            _ => None,
        };
        if let Some(name) = title {
            self.push(BlockKind::Title, name, TITLE_SCALE, 0.0);
        }
        for (key, value) in map {
            if title.is_some() && key == "name" {
                continue;
            }
            self.value(Some(key), value, depth);
        }
    }

    fn value(&mut self, key: Option<&str>, value: &Value, depth: u8) {
        match value {
            Value::Null => {}
            Value::Object(map) if map.is_empty() => {}
            Value::Array(items) if items.is_empty() => {}
            Value::Object(map) => {
                if let Some(key) = key {
                    self.heading(key, depth);
                }
                self.object(map, depth + 1);
            }
            Value::Array(items) => {
                if let Some(key) = key {
                    self.heading(key, depth);
                }
                for item in items {
                    match item {
                        Value::Object(map) => {
                            self.object(map, depth + 1);
                            self.y += self.theme.item_gap_px;
                        }
                        Value::Array(_) => self.value(None, item, depth + 1),
                        scalar => {
                            if let Some(text) = scalar_text(scalar) {
                                self.push(BlockKind::Bullet, &text, 1.0, BULLET_INDENT_EM);
                            }
                        }
                    }
                }
            }
            scalar => {
                if let Some(text) = scalar_text(scalar) {
                    self.push(BlockKind::Paragraph, &text, 1.0, 0.0);
                }
            }
        }
    }

    fn heading(&mut self, key: &str, depth: u8) {
        let level = depth + 1;
        if level == 1 && !self.blocks.is_empty() {
            self.y += self.theme.section_gap_px;
        }
        let scale = if level == 1 {
            self.theme.heading_scale
        } else {
            SUBHEADING_SCALE
        };
        self.push(BlockKind::Heading { level }, &humanize(key), scale, 0.0);
    }

    fn push(&mut self, kind: BlockKind, text: &str, size_scale: f64, indent_em: f64) {
        let size_px = self.theme.font_size_px * size_scale;
        let indent_px = indent_em * size_px;
        let width_em = ((self.content_width_px - indent_px) / size_px).max(1.0);

        let wrapped = get_metrics(self.theme.font).wrap(text, width_em as f32);
        if wrapped.is_empty() {
            return;
        }

        let line_height_px = size_px * self.theme.line_height;
        let top_px = self.y;
        let lines: Vec<Line> = wrapped
            .into_iter()
            .enumerate()
            .map(|(i, text)| Line {
                text,
                top_px: top_px + i as f64 * line_height_px,
            })
            .collect();
        let height_px = lines.len() as f64 * line_height_px;

        self.blocks.push(Block {
            kind,
            top_px,
            height_px,
            line_height_px,
            lines,
        });
        self.y += height_px;
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// `work_experience` / `workExperience` → `Work Experience`.
fn humanize(key: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in key.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PaperSize;
    use serde_json::json;

    fn render(data: Value) -> RenderedDocument {
        TextLayoutRenderer.render(&data, &Theme::classic(), PaperSize::A4.width_px())
    }

    fn sample_resume() -> Value {
        json!({
            "name": "Ada Lovelace",
            "summary": "Engineer focused on analytical engines and numerical methods.",
            "experience": [
                {
                    "role": "Lead Analyst",
                    "company": "Babbage & Co",
                    "highlights": [
                        "Wrote the first published algorithm for the Analytical Engine",
                        "Translated and annotated Menabrea's memoir"
                    ]
                }
            ],
            "skills": ["Mathematics", "Algorithms"],
            "empty_section": []
        })
    }

    #[test]
    fn test_empty_document_has_zero_height() {
        assert_eq!(render(Value::Null).height_px, 0.0);
        assert_eq!(render(json!({})).height_px, 0.0);
        assert!(render(json!({ "skills": [] })).is_empty());
    }

    #[test]
    fn test_blocks_follow_walk_rules() {
        let doc = render(sample_resume());
        let kinds: Vec<BlockKind> = doc.blocks.iter().map(|b| b.kind).collect();

        assert_eq!(kinds[0], BlockKind::Title);
        assert!(kinds.contains(&BlockKind::Heading { level: 1 }));
        assert!(kinds.contains(&BlockKind::Bullet));
        assert!(!doc
            .blocks
            .iter()
            .any(|b| b.lines.iter().any(|l| l.text == "Empty Section")));
    }

    #[test]
    fn test_blocks_stack_without_overlap() {
        let doc = render(sample_resume());
        for pair in doc.blocks.windows(2) {
            assert!(pair[1].top_px >= pair[0].top_px + pair[0].height_px - 1e-9);
        }
        let last = doc.blocks.last().unwrap();
        assert!(doc.height_px > last.top_px + last.height_px);
    }

    #[test]
    fn test_more_content_is_taller() {
        let short = render(json!({ "skills": ["Rust"] }));
        let bullets: Vec<String> = (0..200)
            .map(|i| format!("Delivered project number {i} on time and under budget"))
            .collect();
        let long = render(json!({ "skills": bullets }));
        assert!(long.height_px > short.height_px * 10.0);
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(render(sample_resume()), render(sample_resume()));
    }

    #[test]
    fn test_theme_changes_height() {
        let data = sample_resume();
        let width = PaperSize::A4.width_px();
        let classic = TextLayoutRenderer.render(&data, &Theme::classic(), width);
        let compact = TextLayoutRenderer.render(&data, &Theme::compact(), width);
        assert!(compact.height_px < classic.height_px);
    }

    #[test]
    fn test_lines_in_slice() {
        let doc = render(sample_resume());
        let all = doc.lines_in(0.0, doc.height_px);
        let total: usize = doc.blocks.iter().map(|b| b.lines.len()).sum();
        assert_eq!(all.len(), total);

        let title = &doc.blocks[0].lines[0];
        let first = doc.lines_in(0.0, title.top_px + 1.0);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].1.text, "Ada Lovelace");
    }

    #[test]
    fn test_humanize_keys() {
        assert_eq!(humanize("work_experience"), "Work Experience");
        assert_eq!(humanize("workExperience"), "Work Experience");
        assert_eq!(humanize("skills"), "Skills");
    }
}
