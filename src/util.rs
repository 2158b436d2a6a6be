//! String helpers used by attribute coercion.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// A whitespace run that does not start on an ideographic space (U+3000).
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s&&[^\x{3000}]]\s*").expect("valid whitespace pattern"));

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(\.\d+)?").expect("valid decimal pattern"));

static FLOAT_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[+-]?(?:Infinity|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)")
        .expect("valid float pattern")
});

pub(crate) static DIGITS_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid digits pattern"));

pub(crate) static UNIT_STRIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d.-]").expect("valid unit pattern"));

/// Collapse every run of whitespace into a single space.
///
/// A run may not begin on an ideographic space (U+3000), which carries
/// layout meaning in CJK text, but one trailing a regular space is folded in.
pub fn compress_spaces(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, " ").into_owned()
}

/// Round fractional channel values in `rgb(...)`/`rgba(...)` colors.
///
/// Only the first three numbers (the color channels) are rounded, the alpha
/// channel keeps its fraction. Other color syntaxes pass through unchanged.
pub fn normalize_color(color: &str) -> String {
    if !color.starts_with("rgb") {
        return color.to_string();
    }

    let mut channels_left = 3;
    DECIMAL
        .replace_all(color, |caps: &Captures| {
            let round = channels_left > 0 && caps.get(1).is_some();
            channels_left -= 1;
            match caps[0].parse::<f64>() {
                Ok(n) if round => format_number(n.round()),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Parse the longest numeric prefix of `s`, ignoring leading whitespace.
///
/// `"12px"` parses as `12`, `"-.5e2deg"` as `-50`, `"px"` fails.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    let found = FLOAT_PREFIX.find(s)?;
    found.as_str().trim_start().parse::<f64>().ok()
}

/// Format a number the way attribute strings expect it: integers without a
/// trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compress_spaces() {
        assert_eq!(compress_spaces("a  b\t\n c"), "a b c");
        assert_eq!(compress_spaces("a\u{3000}b"), "a\u{3000}b");
    }

    #[test]
    fn test_ideographic_space_only_survives_at_run_start() {
        assert_eq!(compress_spaces(" \u{3000}x"), " x");
        assert_eq!(compress_spaces("a\t\u{3000}\u{3000}b"), "a b");
        assert_eq!(compress_spaces("\u{3000} x"), "\u{3000} x");
    }

    #[test]
    fn test_normalize_color_rounds_channels_only() {
        assert_eq!(normalize_color("rgb(10.4, 20.6, 30)"), "rgb(10, 21, 30)");
        assert_eq!(
            normalize_color("rgba(0.5, 1.5, 2.2, 0.25)"),
            "rgba(1, 2, 2, 0.25)"
        );
        assert_eq!(normalize_color("#ff0000"), "#ff0000");
    }

    #[test]
    fn test_integer_channels_still_count_toward_three() {
        assert_eq!(
            normalize_color("rgba(1, 2, 3, 0.6)"),
            "rgba(1, 2, 3, 0.6)"
        );
    }

    #[test]
    fn test_parse_float_prefix() {
        assert_eq!(parse_float_prefix("12px"), Some(12.0));
        assert_eq!(parse_float_prefix("  -3.5deg"), Some(-3.5));
        assert_eq!(parse_float_prefix(".5"), Some(0.5));
        assert_eq!(parse_float_prefix("-.5e2deg"), Some(-50.0));
        assert_eq!(parse_float_prefix("1e2"), Some(100.0));
        assert_eq!(parse_float_prefix("1e"), Some(1.0));
        assert_eq!(parse_float_prefix("5."), Some(5.0));
        assert_eq!(parse_float_prefix("-Infinity"), Some(f64::NEG_INFINITY));
        assert_eq!(parse_float_prefix("px"), None);
        assert_eq!(parse_float_prefix("-"), None);
        assert_eq!(parse_float_prefix(""), None);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-2.5), "-2.5");
    }
}
