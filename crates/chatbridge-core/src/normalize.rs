//! Text normalization for command matching.
//!
//! Chat input arrives with arbitrary casing and with or without Vietnamese
//! tone marks. Both sides of a comparison go through [`normalize`] so that
//! `"Bật Đèn"` and `"bat den"` compare equal.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Lower-case `text` and strip its diacritics.
///
/// Decomposes to NFD, drops combining marks, then recomposes to NFC. The
/// stroke letter `đ` has no canonical decomposition and is folded to `d`
/// explicitly.
///
/// ```
/// use chatbridge_core::normalize::normalize;
///
/// assert_eq!(normalize("Bật Đèn"), "bat den");
/// assert_eq!(normalize("ON"), "on");
/// ```
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == 'đ' { 'd' } else { c })
        .nfc()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_case_and_tone_marks() {
        assert_eq!(normalize("Đèn"), normalize("den"));
        assert_eq!(normalize("Tắt Đèn"), "tat den");
        assert_eq!(normalize("ĐỘ ẨM"), "do am");
        assert_eq!(normalize("Nhiệt độ"), "nhiet do");
    }

    #[test]
    fn test_is_idempotent() {
        for input in ["Bật đèn", "HUMIDITY", "nhiệt độ phòng", "", "  spaced  "] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_preserves_non_letters() {
        assert_eq!(normalize("led 1 (on)"), "led 1 (on)");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_precomposed_and_decomposed_input_agree() {
        // "é" as a single code point vs "e" + COMBINING ACUTE ACCENT
        assert_eq!(normalize("\u{00e9}"), normalize("e\u{0301}"));
    }
}
