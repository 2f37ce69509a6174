//! Greedy word-wrap against a pixel width budget.

use super::font::Face;

/// One wrapped output line.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub text: String,
    /// Rendered width in pixels.
    pub width: f32,
    /// Glyph box height in pixels (line gap excluded).
    pub height: f32,
}

impl LayoutLine {
    fn measured(text: String, face: &Face) -> Self {
        let width = face.measure(&text);
        Self {
            text,
            width,
            height: face.height(),
        }
    }

    /// True when this line is a lone word that did not fit the budget.
    pub fn is_oversized(&self, max_width: f32) -> bool {
        self.width > max_width && !self.text.contains(char::is_whitespace)
    }
}

/// Wrap `text` into lines no wider than `max_width`.
///
/// Paragraphs (separated by `\n`, `\r\n` tolerated) wrap independently and an
/// empty paragraph yields an empty line. Words are never split: a word wider
/// than the budget gets a line of its own.
pub fn wrap_text(text: &str, face: &Face, max_width: f32) -> Vec<LayoutLine> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        wrap_paragraph(paragraph, face, max_width, &mut lines);
    }
    lines
}

fn wrap_paragraph(paragraph: &str, face: &Face, max_width: f32, lines: &mut Vec<LayoutLine>) {
    let mut current = String::new();

    for word in paragraph.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if face.measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(LayoutLine::measured(std::mem::take(&mut current), face));
            current.push_str(word);
        }
    }

    lines.push(LayoutLine::measured(current, face));
}
