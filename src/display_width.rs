use unicode_width::UnicodeWidthStr;

/// Average glyph advance as a fraction of the font size.
const CHAR_WIDTH_EM: f32 = 0.6;
const LINE_HEIGHT_EM: f32 = 1.25;

pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Split a label into lines on `\n` or `<br/>`, `<br>`, `<br />` (case-insensitive).
pub fn split_lines(s: &str) -> Vec<&str> {
    let lower = s.to_ascii_lowercase();
    let lower_bytes = lower.as_bytes();
    let mut result = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < lower_bytes.len() {
        let tag_len = if lower_bytes[i] == b'\n' {
            1
        } else if lower_bytes[i..].starts_with(b"<br/>") {
            5
        } else if lower_bytes[i..].starts_with(b"<br />") {
            6
        } else if lower_bytes[i..].starts_with(b"<br>") {
            4
        } else {
            0
        };

        if tag_len > 0 {
            result.push(&s[start..i]);
            start = i + tag_len;
            i = start;
            continue;
        }
        i += 1;
    }
    result.push(&s[start..]);
    result
}

/// Maximum display width among the label's lines, in columns.
pub fn multiline_width(s: &str) -> usize {
    split_lines(s)
        .iter()
        .map(|line| display_width(line))
        .max()
        .unwrap_or(0)
}

pub fn line_count(s: &str) -> usize {
    split_lines(s).len()
}

/// Estimated rendered width of the widest line, in pixels.
pub fn text_width_px(s: &str, font_size: f32) -> f32 {
    multiline_width(s) as f32 * font_size * CHAR_WIDTH_EM
}

pub fn line_height_px(font_size: f32) -> f32 {
    font_size * LINE_HEIGHT_EM
}

pub fn text_height_px(s: &str, font_size: f32) -> f32 {
    line_count(s) as f32 * line_height_px(font_size)
}
