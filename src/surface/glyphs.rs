//! Built-in 3x5 pixel font used for timecode labels.

/// Glyph cell width in font units.
pub const GLYPH_WIDTH: u32 = 3;
/// Glyph cell height in font units.
pub const GLYPH_HEIGHT: u32 = 5;
/// Horizontal advance per character, including one unit of spacing.
const ADVANCE: u32 = GLYPH_WIDTH + 1;

/// Returns the five 3-bit rows of a character, top row first. Characters
/// without a glyph render as blanks.
pub fn glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        _ => [0; 5],
    }
}

/// Integer scale factor for a requested text size in pixels.
pub fn scale_for(size: f32) -> u32 {
    ((size / GLYPH_HEIGHT as f32).round() as u32).max(1)
}

/// Rendered width of `text` at `size`, excluding trailing spacing.
pub fn text_width(text: &str, size: f32) -> f32 {
    let count = text.chars().count() as u32;
    if count == 0 {
        return 0.0;
    }
    let scale = scale_for(size);
    (count * ADVANCE * scale - scale) as f32
}

/// Calls `plot(x, y, scale)` for the top-left corner of every lit font cell
/// of `text`, laid out from `left` with the glyph tops at `top`.
pub fn layout(text: &str, left: f32, top: f32, size: f32, mut plot: impl FnMut(f32, f32, u32)) {
    let scale = scale_for(size);
    for (index, c) in text.chars().enumerate() {
        let origin_x = left + (index as u32 * ADVANCE * scale) as f32;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                    plot(
                        origin_x + (col * scale) as f32,
                        top + (row as u32 * scale) as f32,
                        scale,
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width_scales() {
        assert_eq!(text_width("", 5.0), 0.0);
        assert_eq!(text_width("1", 5.0), 3.0);
        assert_eq!(text_width("10.00", 5.0), 19.0);
        assert_eq!(text_width("10.00", 10.0), 38.0);
    }

    #[test]
    fn test_layout_plots_lit_cells() {
        let mut cells = 0;
        layout(".", 0.0, 0.0, 5.0, |x, y, scale| {
            assert_eq!((x, y, scale), (1.0, 4.0, 1));
            cells += 1;
        });
        assert_eq!(cells, 1);
    }
}
