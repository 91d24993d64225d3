//! Approximate glyph-width metrics for the preview fonts.
//!
//! Widths are in em units and grouped by character class rather than stored
//! per glyph. That is accurate enough to decide where a line wraps within a
//! word or two, which is all the preview needs: the print pipeline does its
//! own typesetting.

use serde::{Deserialize, Serialize};

/// Font families used by the preview themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    /// Humanist sans-serif (modern theme).
    Inter,
    /// Old-style serif (classic theme).
    EbGaramond,
    /// Compact sans-serif (compact theme).
    Lato,
}

/// Class-based width table for one family.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub family: FontFamily,
    space: f32,
    narrow: f32,
    lower: f32,
    upper: f32,
    wide: f32,
    digit: f32,
    punctuation: f32,
    /// Fallback for characters outside ASCII.
    pub average_char_width: f32,
}

static INTER: FontMetrics = FontMetrics {
    family: FontFamily::Inter,
    space: 0.25,
    narrow: 0.26,
    lower: 0.54,
    upper: 0.65,
    wide: 0.84,
    digit: 0.56,
    punctuation: 0.36,
    average_char_width: 0.52,
};

static EB_GARAMOND: FontMetrics = FontMetrics {
    family: FontFamily::EbGaramond,
    space: 0.21,
    narrow: 0.22,
    lower: 0.46,
    upper: 0.56,
    wide: 0.72,
    digit: 0.48,
    punctuation: 0.30,
    average_char_width: 0.44,
};

static LATO: FontMetrics = FontMetrics {
    family: FontFamily::Lato,
    space: 0.24,
    narrow: 0.25,
    lower: 0.51,
    upper: 0.62,
    wide: 0.80,
    digit: 0.53,
    punctuation: 0.33,
    average_char_width: 0.49,
};

pub fn get_metrics(family: FontFamily) -> &'static FontMetrics {
    match family {
        FontFamily::Inter => &INTER,
        FontFamily::EbGaramond => &EB_GARAMOND,
        FontFamily::Lato => &LATO,
    }
}

fn is_narrow(c: char) -> bool {
    matches!(
        c,
        'i' | 'j' | 'l' | 't' | 'f' | 'r' | 'I' | '.' | ',' | '\'' | '!' | '|' | ':' | ';'
    )
}

impl FontMetrics {
    pub fn char_width(&self, c: char) -> f32 {
        match c {
            ' ' => self.space,
            c if is_narrow(c) => self.narrow,
            'm' | 'w' | 'M' | 'W' | '@' | '%' => self.wide,
            'A'..='Z' => self.upper,
            'a'..='z' => self.lower,
            '0'..='9' => self.digit,
            c if c.is_ascii() => self.punctuation,
            _ => self.average_char_width,
        }
    }

    /// Width of `s` in em.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Greedy word wrap at `max_width_em`. Words wider than a full line are
    /// split at character boundaries. Blank input yields no lines.
    pub fn wrap(&self, text: &str, max_width_em: f32) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in text.split_whitespace() {
            let word_width = self.measure_str(word);

            if word_width > max_width_em {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                }
                for c in word.chars() {
                    let w = self.char_width(c);
                    if !current.is_empty() && current_width + w > max_width_em {
                        lines.push(std::mem::take(&mut current));
                        current_width = 0.0;
                    }
                    current.push(c);
                    current_width += w;
                }
                continue;
            }

            let space = if current.is_empty() { 0.0 } else { self.space };
            if !current.is_empty() && current_width + space + word_width > max_width_em {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            } else if !current.is_empty() {
                current.push(' ');
                current_width += space;
            }
            current.push_str(word);
            current_width += word_width;
        }

        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}
