//! Built-in 5x7 glyph set for label text.
//!
//! Each glyph is 7 rows of 5 bits, MSB-left. Covers A-Z, 0-9, space and
//! hyphen, which is the full alphabet of the COCO label set; lowercase input
//! is rendered with the uppercase forms. Unknown characters fall back to a
//! filled box.

/// Glyph cell width in pixels (before scaling).
pub const GLYPH_WIDTH: u32 = 5;
/// Glyph cell height in pixels (before scaling).
pub const GLYPH_HEIGHT: u32 = 7;
/// Integer scale factor; 5x7 at 3x lands near the original 20px label size.
pub const SCALE: u32 = 3;

const SPACE: [u8; 7] = [0x00; 7];
const UNKNOWN: [u8; 7] = [0x1F; 7];
const HYPHEN: [u8; 7] = [0x00, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00];

const LETTERS: [[u8; 7]; 26] = [
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1C, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1C], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
];

const DIGITS: [[u8; 7]; 10] = [
    [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E], // 0
    [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E], // 1
    [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F], // 2
    [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E], // 3
    [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02], // 4
    [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E], // 5
    [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E], // 6
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08], // 7
    [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E], // 8
    [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C], // 9
];

/// Glyph rows for a character.
pub fn glyph_for(ch: char) -> &'static [u8; 7] {
    match ch {
        ' ' => &SPACE,
        '-' => &HYPHEN,
        'a'..='z' => &LETTERS[(ch as u8 - b'a') as usize],
        'A'..='Z' => &LETTERS[(ch as u8 - b'A') as usize],
        '0'..='9' => &DIGITS[(ch as u8 - b'0') as usize],
        _ => &UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_maps_to_uppercase_forms() {
        assert_eq!(glyph_for('p'), glyph_for('P'));
    }

    #[test]
    fn space_is_blank() {
        assert!(glyph_for(' ').iter().all(|&row| row == 0));
    }

    #[test]
    fn unknown_char_falls_back_to_box() {
        assert_eq!(glyph_for('?'), &UNKNOWN);
    }

    #[test]
    fn rows_fit_in_five_bits() {
        for ch in ('a'..='z').chain('0'..='9') {
            for &row in glyph_for(ch) {
                assert!(row <= 0x1F, "glyph '{}' row {:#x} overflows", ch, row);
            }
        }
    }
}
