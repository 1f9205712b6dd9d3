/// Color parsing for color-typed fields.
///
/// Accepts `#rgb`, `#rrggbb`, `0xrrggbb` and a small table of CSS names.
/// Components are stored as 0..1 floats without color-space conversion.

use glam::Vec3;

const NAMED_COLORS: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("white", 0xffffff),
    ("red", 0xff0000),
    ("green", 0x008000),
    ("lime", 0x00ff00),
    ("blue", 0x0000ff),
    ("yellow", 0xffff00),
    ("cyan", 0x00ffff),
    ("magenta", 0xff00ff),
    ("orange", 0xffa500),
    ("purple", 0x800080),
    ("hotpink", 0xff69b4),
    ("gray", 0x808080),
    ("grey", 0x808080),
];

/// Convert a packed `0xRRGGBB` value into 0..1 components
pub fn color_from_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
    )
}

/// Parse a color string, returning `None` for unrecognized input
pub fn parse_color(input: &str) -> Option<Vec3> {
    let trimmed = input.trim();
    let lowered = trimmed.to_ascii_lowercase();

    if let Some(&(_, hex)) = NAMED_COLORS.iter().find(|(name, _)| *name == lowered) {
        return Some(color_from_hex(hex));
    }

    let digits = lowered
        .strip_prefix('#')
        .or_else(|| lowered.strip_prefix("0x"))?;

    match digits.len() {
        6 => u32::from_str_radix(digits, 16).ok().map(color_from_hex),
        3 => {
            let short = u32::from_str_radix(digits, 16).ok()?;
            let r = (short >> 8) & 0xf;
            let g = (short >> 4) & 0xf;
            let b = short & 0xf;
            Some(color_from_hex((r * 17) << 16 | (g * 17) << 8 | (b * 17)))
        }
        _ => None,
    }
}
