//! Attribute coercion for drawing callbacks.
//!
//! Attribute values reach callbacks untyped: a width may be `4`, `"4"` or
//! `"4px"`, an angle may be `"90deg"` or `"1.57rad"`. [`Property`] wraps one
//! named value and converts it on demand. Getters without a `try_` prefix
//! never fail; unusable input coerces to zero (or the empty string), which
//! is what a drawing routine wants when a component passes garbage.

use std::borrow::Cow;
use std::f64::consts::PI;

use thiserror::Error;

use crate::util::{
    compress_spaces, format_number, normalize_color, parse_float_prefix, DIGITS_ONLY, UNIT_STRIP,
};
use crate::value::Value;

/// Why an attribute could not be read as a number.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PropertyError {
    #[error("property `{0}` has no value")]
    Empty(String),
    #[error("property `{name}` is not a number: {value:?}")]
    NotANumber { name: String, value: String },
}

/// A named, lazily coerced attribute value.
#[derive(Debug, Clone, PartialEq)]
pub struct Property<'a> {
    name: Cow<'a, str>,
    value: Option<Cow<'a, Value>>,
}

impl<'a> Property<'a> {
    pub fn new(name: &'a str, value: Option<&'a Value>) -> Self {
        Self {
            name: Cow::Borrowed(name),
            value: value.map(Cow::Borrowed),
        }
    }

    /// A property that owns its value.
    pub fn owned(name: impl Into<String>, value: impl Into<Value>) -> Property<'static> {
        Property {
            name: Cow::Owned(name.into()),
            value: Some(Cow::Owned(value.into())),
        }
    }

    pub fn empty() -> Property<'static> {
        Property {
            name: Cow::Borrowed("EMPTY"),
            value: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_deref()
    }

    /// Whether a meaningful value is present.
    ///
    /// Missing, null and empty-string values never count. Numeric zero only
    /// counts when `zero_is_value` is set.
    pub fn has_value(&self, zero_is_value: bool) -> bool {
        match self.value() {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => zero_is_value || *n != 0.0,
            Some(_) => true,
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self.value(), Some(Value::String(_)))
    }

    fn string_ends_with(&self, suffix: &str) -> bool {
        self.value()
            .and_then(Value::as_str)
            .is_some_and(|s| s.ends_with(suffix))
    }

    pub fn is_url_definition(&self) -> bool {
        self.value()
            .and_then(Value::as_str)
            .is_some_and(|s| s.starts_with("url("))
    }

    /// True for values expressed in pixels: a `px` suffix or a bare integer.
    pub fn is_pixels(&self) -> bool {
        if !self.has_value(false) {
            return false;
        }
        let s = self.string();
        s.ends_with("px") || DIGITS_ONLY.is_match(&s)
    }

    /// String form of the value; empty when missing.
    pub fn string(&self) -> String {
        match self.value() {
            None | Some(Value::Null) => String::new(),
            Some(value) => value_to_string(value),
        }
    }

    /// String form of the value, or `default` when there is no value.
    pub fn string_or(&self, default: &str) -> String {
        if self.has_value(false) {
            self.string()
        } else {
            default.to_string()
        }
    }

    /// Parse the value as a number. A trailing `%` divides by 100.
    ///
    /// Unlike the defaulting getters, zero counts as a value here.
    pub fn try_number(&self) -> Result<f64, PropertyError> {
        if !self.has_value(true) {
            return Err(PropertyError::Empty(self.name.to_string()));
        }
        let n = match self.value() {
            Some(Value::Number(n)) => *n,
            Some(Value::Bool(_)) | Some(Value::Map(_)) => return Err(self.nan()),
            _ => {
                let s = self.string();
                let n = parse_float_prefix(&s).ok_or_else(|| self.nan())?;
                if s.ends_with('%') {
                    n / 100.0
                } else {
                    n
                }
            }
        };
        if n.is_nan() {
            return Err(self.nan());
        }
        Ok(n)
    }

    fn nan(&self) -> PropertyError {
        PropertyError::NotANumber {
            name: self.name.to_string(),
            value: self.string(),
        }
    }

    /// Numeric value, or zero when missing or unparsable.
    pub fn number(&self) -> f64 {
        self.try_number().unwrap_or(0.0)
    }

    /// Numeric value, or `default` when there is no value.
    pub fn number_or(&self, default: f64) -> f64 {
        if self.has_value(false) {
            self.number()
        } else {
            default
        }
    }

    /// Length in pixels; zero when missing.
    pub fn pixels(&self) -> f64 {
        if !self.has_value(false) {
            return 0.0;
        }
        self.number()
    }

    /// Duration in milliseconds. Values without an `ms` suffix are seconds.
    pub fn milliseconds(&self) -> f64 {
        if !self.has_value(false) {
            return 0.0;
        }
        if self.string_ends_with("ms") {
            self.number()
        } else {
            self.number() * 1000.0
        }
    }

    /// Angle in radians. Bare numbers are degrees.
    pub fn radians(&self) -> f64 {
        if !self.has_value(false) {
            return 0.0;
        }
        if self.string_ends_with("deg") {
            self.number() * (PI / 180.0)
        } else if self.string_ends_with("grad") {
            self.number() * (PI / 200.0)
        } else if self.string_ends_with("rad") {
            self.number()
        } else {
            self.number() * (PI / 180.0)
        }
    }

    /// Color string with rgb channel fractions rounded.
    pub fn color(&self) -> String {
        normalize_color(&self.string())
    }

    pub fn color_or(&self, default: &str) -> String {
        normalize_color(&self.string_or(default))
    }

    /// The unit suffix: everything but digits, dots and minus signs.
    pub fn units(&self) -> String {
        UNIT_STRIP.replace_all(&self.string(), "").into_owned()
    }

    /// Split a whitespace-separated list into one property per item.
    pub fn split(&self, separator: &str) -> Vec<Property<'static>> {
        let name = self.name.to_string();
        compress_spaces(&self.string())
            .trim()
            .split(separator)
            .map(|part| Property::owned(name.clone(), part))
            .collect()
    }

    /// Map an SVG `dominant-baseline` keyword onto a canvas text baseline.
    pub fn text_baseline(&self) -> Option<&'static str> {
        if !self.has_value(false) {
            return None;
        }
        let baseline = match self.string().as_str() {
            "baseline" | "alphabetic" | "mathematical" => "alphabetic",
            "before-edge" | "text-before-edge" => "top",
            "middle" | "central" => "middle",
            "after-edge" | "text-after-edge" => "bottom",
            "ideographic" => "ideographic",
            "hanging" => "hanging",
            _ => return None,
        };
        Some(baseline)
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::List(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Map(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(value: impl Into<Value>) -> Property<'static> {
        Property::owned("test", value)
    }

    #[test]
    fn test_has_value() {
        assert!(!Property::empty().has_value(false));
        assert!(!prop("").has_value(false));
        assert!(!prop(0).has_value(false));
        assert!(prop(0).has_value(true));
        assert!(prop("0").has_value(false));
        assert!(!prop(Value::Null).has_value(true));
    }

    #[test]
    fn test_number_parsing() {
        assert_eq!(prop(12).number(), 12.0);
        assert_eq!(prop("12px").number(), 12.0);
        assert_eq!(prop("50%").number(), 0.5);
        assert_eq!(prop("abc").number(), 0.0);
        assert!(matches!(
            prop("abc").try_number(),
            Err(PropertyError::NotANumber { .. })
        ));
        assert!(matches!(
            Property::empty().try_number(),
            Err(PropertyError::Empty(_))
        ));
        assert_eq!(prop(0).try_number(), Ok(0.0));
        assert!(prop(f64::NAN).try_number().is_err());
    }

    #[test]
    fn test_number_or_default() {
        assert_eq!(Property::empty().number_or(7.0), 7.0);
        assert_eq!(prop("3").number_or(7.0), 3.0);
    }

    #[test]
    fn test_pixels() {
        assert!(prop("4px").is_pixels());
        assert!(prop(4).is_pixels());
        assert!(!prop("4em").is_pixels());
        assert_eq!(prop("4px").pixels(), 4.0);
        assert_eq!(Property::empty().pixels(), 0.0);
    }

    #[test]
    fn test_radians() {
        let half_turn = prop("180deg").radians();
        assert!((half_turn - PI).abs() < 1e-12);
        assert!((prop(90).radians() - PI / 2.0).abs() < 1e-12);
        assert!((prop("200grad").radians() - PI).abs() < 1e-12);
        assert!((prop("1.5rad").radians() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_milliseconds() {
        assert_eq!(prop("250ms").milliseconds(), 250.0);
        assert_eq!(prop("2s").milliseconds(), 2000.0);
        assert_eq!(prop(1).milliseconds(), 1000.0);
    }

    #[test]
    fn test_units_and_split() {
        assert_eq!(prop("-12.5px").units(), "px");
        let parts = prop("1  2\t3").split(" ");
        let numbers: Vec<f64> = parts.iter().map(Property::number).collect();
        assert_eq!(numbers, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_color_normalization() {
        assert_eq!(prop("rgb(1.6, 2, 3)").color(), "rgb(2, 2, 3)");
        assert_eq!(Property::empty().color_or("black"), "black");
    }

    #[test]
    fn test_text_baseline() {
        assert_eq!(prop("central").text_baseline(), Some("middle"));
        assert_eq!(prop("nonsense").text_baseline(), None);
        assert_eq!(Property::empty().text_baseline(), None);
    }
}
