//! Helvetica metrics and WinAnsi encoding for overlay text.
//!
//! The overlay uses the standard Type1 Helvetica font, which every PDF
//! viewer provides, so no font program is embedded. Centred text needs the
//! advance widths to compute its left edge.

/// Helvetica advance widths (1000 units/em) for WinAnsi codes 32..=126.
const HELVETICA_ASCII: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, // space ! " # $ % & '
    333, 333, 389, 584, 278, 333, 278, 278, // ( ) * + , - . /
    556, 556, 556, 556, 556, 556, 556, 556, // 0-7
    556, 556, 278, 278, 584, 584, 584, 556, // 8 9 : ; < = > ?
    1015, 667, 667, 722, 722, 667, 611, 778, // @ A-G
    722, 278, 500, 667, 556, 833, 722, 778, // H-O
    667, 778, 722, 667, 611, 722, 667, 944, // P-W
    667, 667, 611, 278, 278, 278, 469, 556, // X Y Z [ \ ] ^ _
    333, 556, 556, 500, 556, 556, 278, 556, // ` a-g
    556, 222, 222, 500, 222, 833, 556, 556, // h-o
    556, 556, 333, 500, 278, 556, 500, 722, // p-w
    500, 500, 500, 334, 260, 334, 584, // x y z { | } ~
];

fn helvetica_width(byte: u8) -> u16 {
    match byte {
        32..=126 => HELVETICA_ASCII[(byte - 32) as usize],
        0xA0 => 278,
        _ => 556,
    }
}

/// Width of `text` in points when set in Helvetica at `font_size`.
pub fn string_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = encode_winansi(text)
        .bytes
        .iter()
        .map(|&b| u32::from(helvetica_width(b)))
        .sum();
    units as f32 * font_size / 1000.0
}

/// WinAnsi bytes for a string, plus how many characters had no mapping.
pub struct Encoded {
    pub bytes: Vec<u8>,
    pub replaced: usize,
}

/// Encodes to Windows-1252; unmappable characters become `?`.
pub fn encode_winansi(text: &str) -> Encoded {
    let mut replaced = 0;
    let bytes = text
        .chars()
        .map(|c| {
            char_to_winansi(c).unwrap_or_else(|| {
                replaced += 1;
                b'?'
            })
        })
        .collect();
    Encoded { bytes, replaced }
}

fn char_to_winansi(c: char) -> Option<u8> {
    let byte = match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// First `max` characters of `text` (characters, not bytes).
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_width_matches_afm() {
        assert!((string_width("2", 8.0) - 4.448).abs() < 1e-4);
        assert!((string_width("EA", 8.0) - (667.0 + 667.0) * 8.0 / 1000.0).abs() < 1e-4);
        assert_eq!(string_width("", 10.0), 0.0);
    }

    #[test]
    fn encodes_latin1_and_replaces_the_rest() {
        let enc = encode_winansi("Caf\u{e9} \u{2014} \u{4e2d}");
        assert_eq!(enc.bytes, vec![b'C', b'a', b'f', 0xE9, b' ', 0x97, b' ', b'?']);
        assert_eq!(enc.replaced, 1);
    }

    #[test]
    fn truncation_counts_characters() {
        let fifty = "A".repeat(50);
        let fifty_one = format!("{fifty}B");
        assert_eq!(truncate_chars(&fifty, 50), fifty);
        assert_eq!(truncate_chars(&fifty_one, 50), fifty);
        assert_eq!(truncate_chars("\u{e9}\u{e9}\u{e9}", 2), "\u{e9}\u{e9}");
    }
}
