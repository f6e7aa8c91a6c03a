use crate::views::LabelNode;

/// Opacity of a label chip's background tint.
pub const CHIP_BACKGROUND_OPACITY: f32 = 0.1;

/// Convert `#rrggbb` (leading `#` optional, any case) to a CSS `rgba(...)`
/// string. Anything else yields black at the requested opacity.
pub fn hex_to_rgba(hex: &str, opacity: f32) -> String {
    match parse_hex(hex) {
        Some((r, g, b)) => format!("rgba({r}, {g}, {b}, {opacity})"),
        None => format!("rgba(0, 0, 0, {opacity})"),
    }
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Colors for rendering a label badge on a card.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelChip {
    pub text: String,
    pub text_color: String,
    pub background: String,
    pub border: String,
}

impl LabelChip {
    pub fn for_label(label: &LabelNode) -> Self {
        LabelChip {
            text: label.name.clone(),
            text_color: label.color.clone(),
            background: hex_to_rgba(&label.color, CHIP_BACKGROUND_OPACITY),
            border: format!("1px solid {}", label.color),
        }
    }
}
