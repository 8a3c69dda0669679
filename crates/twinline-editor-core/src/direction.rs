//! Per-line writing direction detection.
//!
//! Looks at the first meaningful character of a line's source, after any
//! leading markdown marker run, and picks `ltr` or `rtl`.

use crate::types::Direction;

/// Leading marker characters stripped before inspecting the first character:
/// headings, quotes, list bullets, emphasis, rules and code ticks.
const MARKER_CHARS: &[char] = &['#', '>', '*', '_', '-', '+', '~', '`'];

/// Characters in the Hebrew, Arabic, Syriac, Thaana and NKo blocks and the
/// Hebrew/Arabic presentation forms.
pub fn is_rtl_char(c: char) -> bool {
    matches!(
        c,
        '\u{0591}'..='\u{07FF}' | '\u{FB1D}'..='\u{FDFD}' | '\u{FE70}'..='\u{FEFC}'
    )
}

/// Strip one leading marker run (or an ordered-list number) plus the
/// whitespace around it.
fn strip_leading_marker(text: &str) -> &str {
    let rest = text.trim_start();
    let after_marker = if rest.starts_with(MARKER_CHARS) {
        rest.trim_start_matches(MARKER_CHARS)
    } else {
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        match rest[digits..].strip_prefix('.') {
            Some(after_dot) if digits > 0 => after_dot,
            _ => rest,
        }
    };
    after_marker.trim_start()
}

/// Detect the direction of a single line of source text.
///
/// With an `rtl` default, a line opening with an ASCII letter or digit reads
/// left-to-right and everything else stays right-to-left. With an `ltr`
/// default, only characters in the right-to-left ranges flip the line.
pub fn detect(text: &str, default: Direction) -> Direction {
    let Some(first) = strip_leading_marker(text).chars().next() else {
        return default;
    };

    match default {
        Direction::Rtl if first.is_ascii_alphanumeric() => Direction::Ltr,
        Direction::Rtl => Direction::Rtl,
        Direction::Ltr if is_rtl_char(first) => Direction::Rtl,
        Direction::Ltr => Direction::Ltr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rtl_default_latin_override() {
        assert_eq!(detect("123 abc", Direction::Rtl), Direction::Ltr);
        assert_eq!(detect("hello", Direction::Rtl), Direction::Ltr);
        assert_eq!(detect("שלום", Direction::Rtl), Direction::Rtl);
        // Punctuation and non-Latin scripts keep the default.
        assert_eq!(detect("«quote»", Direction::Rtl), Direction::Rtl);
        assert_eq!(detect("Ωmega", Direction::Rtl), Direction::Rtl);
    }

    #[test]
    fn test_ltr_default() {
        assert_eq!(detect("hello", Direction::Ltr), Direction::Ltr);
        assert_eq!(detect("123", Direction::Ltr), Direction::Ltr);
        assert_eq!(detect("مرحبا", Direction::Ltr), Direction::Rtl);
        assert_eq!(detect("שלום", Direction::Ltr), Direction::Rtl);
        assert_eq!(detect("ﭏ presentation form", Direction::Ltr), Direction::Rtl);
    }

    #[test]
    fn test_empty_uses_default() {
        assert_eq!(detect("", Direction::Ltr), Direction::Ltr);
        assert_eq!(detect("", Direction::Rtl), Direction::Rtl);
        assert_eq!(detect("   ", Direction::Ltr), Direction::Ltr);
        assert_eq!(detect("## ", Direction::Rtl), Direction::Rtl);
    }

    #[test]
    fn test_markers_are_skipped() {
        assert_eq!(detect("# שלום", Direction::Ltr), Direction::Rtl);
        assert_eq!(detect("> שלום", Direction::Ltr), Direction::Rtl);
        assert_eq!(detect("- hello", Direction::Rtl), Direction::Ltr);
        assert_eq!(detect("  12. שלום", Direction::Ltr), Direction::Rtl);
        assert_eq!(detect("```rust", Direction::Rtl), Direction::Ltr);
    }

    #[test]
    fn test_only_one_marker_run_is_stripped() {
        // "> " is stripped, then "1." remains and its digit decides.
        assert_eq!(detect("> 1. שלום", Direction::Rtl), Direction::Ltr);
        // The space ends the quote run, so the emphasis stars are content.
        assert_eq!(detect("> **שלום**", Direction::Ltr), Direction::Ltr);
        // A number without a dot is content, not a marker.
        assert_eq!(detect("12 שלום", Direction::Ltr), Direction::Ltr);
    }

    #[test]
    fn test_placeholder_glyph() {
        assert_eq!(detect("\u{200B}", Direction::Rtl), Direction::Rtl);
        assert_eq!(detect("\u{200B}", Direction::Ltr), Direction::Ltr);
    }
}
