use std::collections::HashMap;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

fn default_char_size() -> (f32, f32) {
    (8.0, 8.0)
}

/// Metrics of one bitmap font. Glyph rendering lives in the platform layer;
/// the runtime only needs measurement.
#[derive(Clone, Serialize, Deserialize)]
pub struct FontDef {
    #[serde(default = "default_char_size")]
    pub char_size: (f32, f32),
}

impl Default for FontDef {
    fn default() -> Self {
        Self {
            char_size: default_char_size(),
        }
    }
}

#[derive(Resource, Clone, Default)]
pub struct FontLibrary {
    pub fonts: HashMap<String, FontDef>,
}

impl FontLibrary {
    pub fn get(&self, name: &str) -> FontDef {
        self.fonts.get(name).cloned().unwrap_or_default()
    }

    pub fn load_json(&mut self, json: &str) -> Result<(), String> {
        let fonts: HashMap<String, FontDef> =
            serde_json::from_str(json).map_err(|e| format!("bad font definitions: {e}"))?;
        self.fonts.extend(fonts);
        Ok(())
    }
}

/// Length of a string as displayed: `<...>` markup tags don't count.
pub fn tagged_len(text: &str) -> usize {
    let mut count = 0;
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => count += 1,
            _ => {}
        }
    }
    count
}

/// Applies the substring window of a textout command: keep `length` visible
/// characters starting at visible index `start`, preserving any tags.
pub fn substring_window(text: &str, start: usize, length: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut visible = 0usize;
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push(ch);
            }
            '>' => {
                in_tag = false;
                out.push(ch);
            }
            _ if in_tag => out.push(ch),
            _ => {
                if visible >= start && visible < start.saturating_add(length) {
                    out.push(ch);
                }
                visible += 1;
            }
        }
    }
    out
}

/// Width of the rendered text in pixels for a monospace font.
pub fn text_width(text: &str, font: &FontDef) -> f32 {
    tagged_len(text) as f32 * font.char_size.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_do_not_count() {
        assert_eq!(tagged_len("<color=red>Hi</color>"), 2);
        assert_eq!(tagged_len("plain"), 5);
        assert_eq!(tagged_len(""), 0);
    }

    #[test]
    fn window_keeps_tags_and_slices_visible_chars() {
        assert_eq!(substring_window("abcdef", 2, 3), "cde");
        assert_eq!(substring_window("<b>abc</b>", 1, 1), "<b>b</b>");
        assert_eq!(substring_window("abc", 0, usize::MAX), "abc");
    }

    #[test]
    fn width_is_visible_chars_times_char_width() {
        let font = FontDef {
            char_size: (8.0, 8.0),
        };
        assert_eq!(text_width("<x>ab</x>", &font), 16.0);
    }
}
