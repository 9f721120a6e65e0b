//! Scalar extractors.
//!
//! Every extractor follows the same contract: a present value that parses is
//! returned, an absent optional value yields the default, an absent required
//! value is [`SdfError::MissingRequiredField`], and a present value that does
//! not parse is [`SdfError::MalformedField`]. Defaults never stand in for bad
//! content.

use nalgebra::Vector3;

use crate::error::{Result, SdfError};
use crate::types::Color;
use crate::xml::XmlElement;

/// Shared extraction logic. `parse` receives the trimmed raw value.
fn extract<T>(
    field: &'static str,
    raw: Option<&str>,
    default: T,
    required: bool,
    context: &str,
    parse: impl FnOnce(&str) -> std::result::Result<T, String>,
) -> Result<T> {
    match raw {
        Some(raw) => parse(raw.trim())
            .map_err(|message| SdfError::malformed_field(field, raw, message, context)),
        None if required => Err(SdfError::missing_field(field, context)),
        None => Ok(default),
    }
}

fn finite(token: &str) -> std::result::Result<f64, String> {
    let value: f64 = token
        .parse()
        .map_err(|_| format!("expected a number, got {token:?}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("expected a finite number, got {token:?}"))
    }
}

fn finite_list(s: &str) -> std::result::Result<Vec<f64>, String> {
    s.split_whitespace().map(finite).collect()
}

/// Parse a boolean: `true`/`false` (any ASCII case) or `1`/`0`.
///
/// # Errors
///
/// See the module docs.
pub fn parse_bool(
    field: &'static str,
    raw: Option<&str>,
    default: bool,
    required: bool,
    context: &str,
) -> Result<bool> {
    extract(field, raw, default, required, context, |s| {
        if s.eq_ignore_ascii_case("true") || s == "1" {
            Ok(true)
        } else if s.eq_ignore_ascii_case("false") || s == "0" {
            Ok(false)
        } else {
            Err("expected true, false, 1 or 0".to_string())
        }
    })
}

/// Parse a signed base-10 integer.
///
/// # Errors
///
/// See the module docs.
pub fn parse_int(
    field: &'static str,
    raw: Option<&str>,
    default: i32,
    required: bool,
    context: &str,
) -> Result<i32> {
    extract(field, raw, default, required, context, |s| {
        s.parse().map_err(|e| format!("expected an integer: {e}"))
    })
}

/// Parse an unsigned base-10 integer.
///
/// # Errors
///
/// See the module docs.
pub fn parse_uint(
    field: &'static str,
    raw: Option<&str>,
    default: u32,
    required: bool,
    context: &str,
) -> Result<u32> {
    extract(field, raw, default, required, context, |s| {
        s.parse()
            .map_err(|e| format!("expected a non-negative integer: {e}"))
    })
}

/// Parse a finite floating point number.
///
/// # Errors
///
/// See the module docs. `nan` and `inf` are malformed.
pub fn parse_double(
    field: &'static str,
    raw: Option<&str>,
    default: f64,
    required: bool,
    context: &str,
) -> Result<f64> {
    extract(field, raw, default, required, context, finite)
}

/// Parse a string. The value is trimmed; any content is accepted.
///
/// # Errors
///
/// Only [`SdfError::MissingRequiredField`].
pub fn parse_string(
    field: &'static str,
    raw: Option<&str>,
    default: &str,
    required: bool,
    context: &str,
) -> Result<String> {
    extract(field, raw, default.to_string(), required, context, |s| {
        Ok(s.to_string())
    })
}

/// Parse three whitespace-separated finite numbers.
///
/// # Errors
///
/// See the module docs.
pub fn parse_vector3(
    field: &'static str,
    raw: Option<&str>,
    default: Vector3<f64>,
    required: bool,
    context: &str,
) -> Result<Vector3<f64>> {
    extract(field, raw, default, required, context, |s| {
        match finite_list(s)?.as_slice() {
            &[x, y, z] => Ok(Vector3::new(x, y, z)),
            values => Err(format!("expected 3 values, got {}", values.len())),
        }
    })
}

/// Parse an `r g b [a]` color. Components must lie in `[0, 1]`; alpha
/// defaults to 1.
///
/// # Errors
///
/// See the module docs.
pub fn parse_color(
    field: &'static str,
    raw: Option<&str>,
    default: Color,
    required: bool,
    context: &str,
) -> Result<Color> {
    extract(field, raw, default, required, context, |s| {
        let values = finite_list(s)?;
        if values.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return Err("color components must be in [0, 1]".to_string());
        }
        match values.as_slice() {
            &[r, g, b] => Ok(Color::new(r, g, b, 1.0)),
            &[r, g, b, a] => Ok(Color::new(r, g, b, a)),
            values => Err(format!("expected 3 or 4 values, got {}", values.len())),
        }
    })
}

// ============================================================================
// Attribute helpers
// ============================================================================
//
// These read an attribute of `e` and label failures with `e.describe()`. The
// description is only built on the error path.

fn labeled<T>(e: &XmlElement, result: Result<T>) -> Result<T> {
    result.map_err(|err| err.within(&e.describe()))
}

/// Optional boolean attribute.
pub fn attr_bool(e: &XmlElement, field: &'static str, default: bool) -> Result<bool> {
    labeled(e, parse_bool(field, e.attribute(field), default, false, ""))
}

/// Optional unsigned attribute.
pub fn attr_uint(e: &XmlElement, field: &'static str, default: u32) -> Result<u32> {
    labeled(e, parse_uint(field, e.attribute(field), default, false, ""))
}

/// Required unsigned attribute.
pub fn require_uint(e: &XmlElement, field: &'static str) -> Result<u32> {
    labeled(e, parse_uint(field, e.attribute(field), 0, true, ""))
}

/// Optional number attribute.
pub fn attr_double(e: &XmlElement, field: &'static str, default: f64) -> Result<f64> {
    labeled(e, parse_double(field, e.attribute(field), default, false, ""))
}

/// Required number attribute.
pub fn require_double(e: &XmlElement, field: &'static str) -> Result<f64> {
    labeled(e, parse_double(field, e.attribute(field), 0.0, true, ""))
}

/// Optional number attribute that must not be negative.
pub fn attr_non_negative(e: &XmlElement, field: &'static str, default: f64) -> Result<f64> {
    let value = attr_double(e, field, default)?;
    non_negative(e, field, value)
}

/// Required number attribute that must not be negative.
pub fn require_non_negative(e: &XmlElement, field: &'static str) -> Result<f64> {
    let value = require_double(e, field)?;
    non_negative(e, field, value)
}

fn non_negative(e: &XmlElement, field: &'static str, value: f64) -> Result<f64> {
    if value < 0.0 {
        Err(SdfError::malformed_field(
            field,
            value.to_string(),
            "must not be negative",
            e.describe(),
        ))
    } else {
        Ok(value)
    }
}

/// Optional string attribute.
pub fn attr_string(e: &XmlElement, field: &'static str) -> Option<String> {
    e.attribute(field).map(|s| s.trim().to_string())
}

/// Required string attribute.
pub fn require_string(e: &XmlElement, field: &'static str) -> Result<String> {
    labeled(e, parse_string(field, e.attribute(field), "", true, ""))
}

/// Required, non-empty `name` attribute.
pub fn attr_name(e: &XmlElement) -> Result<String> {
    let name = require_string(e, "name")?;
    if name.is_empty() {
        return Err(SdfError::malformed_field(
            "name",
            "",
            "name must not be empty",
            e.describe(),
        ));
    }
    Ok(name)
}

/// Optional vector attribute.
pub fn attr_vector3(
    e: &XmlElement,
    field: &'static str,
    default: Vector3<f64>,
) -> Result<Vector3<f64>> {
    labeled(e, parse_vector3(field, e.attribute(field), default, false, ""))
}

/// Required vector attribute.
pub fn require_vector3(e: &XmlElement, field: &'static str) -> Result<Vector3<f64>> {
    labeled(
        e,
        parse_vector3(field, e.attribute(field), Vector3::zeros(), true, ""),
    )
}

/// Optional color attribute.
pub fn attr_color(e: &XmlElement, field: &'static str, default: Color) -> Result<Color> {
    labeled(e, parse_color(field, e.attribute(field), default, false, ""))
}

/// Required color attribute.
pub fn require_color(e: &XmlElement, field: &'static str) -> Result<Color> {
    labeled(
        e,
        parse_color(field, e.attribute(field), Color::BLACK, true, ""),
    )
}

// ============================================================================
// Child text helpers
// ============================================================================

/// Optional number stored as the text of child `<tag>`.
///
/// A repeated `<tag>` is a [`SdfError::DuplicateElement`].
pub fn child_double(e: &XmlElement, tag: &'static str, default: f64) -> Result<f64> {
    let text = e.unique_child(tag)?.map(XmlElement::text);
    labeled(e, parse_double(tag, text, default, false, ""))
}

/// Optional unsigned integer stored as the text of child `<tag>`.
pub fn child_uint(e: &XmlElement, tag: &'static str, default: u32) -> Result<u32> {
    let text = e.unique_child(tag)?.map(XmlElement::text);
    labeled(e, parse_uint(tag, text, default, false, ""))
}

/// Optional string stored as the text of child `<tag>`.
pub fn child_string(e: &XmlElement, tag: &'static str) -> Result<Option<String>> {
    Ok(e.unique_child(tag)?.map(|c| c.text().trim().to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use approx::assert_relative_eq;

    #[test]
    fn test_bool_vocabulary() {
        for (raw, expected) in [
            ("true", true),
            ("TRUE", true),
            (" True ", true),
            ("1", true),
            ("false", false),
            ("False", false),
            ("0", false),
        ] {
            assert_eq!(parse_bool("b", Some(raw), !expected, false, "t").unwrap(), expected);
        }
        for raw in ["yes", "", "2", "t"] {
            let err = parse_bool("b", Some(raw), false, false, "t").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedField, "input: {raw:?}");
        }
    }

    #[test]
    fn test_absent_values() {
        assert!(parse_bool("b", None, true, false, "t").unwrap());
        assert_eq!(parse_int("i", None, -3, false, "t").unwrap(), -3);
        assert_eq!(parse_uint("u", None, 7, false, "t").unwrap(), 7);
        assert_eq!(parse_string("s", None, "dflt", false, "t").unwrap(), "dflt");

        let err = parse_double("radius", None, 1.0, true, "sphere").unwrap_err();
        assert!(matches!(
            err,
            SdfError::MissingRequiredField { field: "radius", ref context } if context == "sphere"
        ));
    }

    #[test]
    fn test_bad_content_never_defaults() {
        let err = parse_double("x", Some("abc"), 1.0, false, "t").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedField);
        let err = parse_uint("n", Some("-1"), 5, false, "t").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedField);
        let err = parse_int("n", Some("1.5"), 5, false, "t").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedField);
    }

    #[test]
    fn test_doubles() {
        assert_relative_eq!(parse_double("x", Some(" 1e-3 "), 0.0, true, "t").unwrap(), 1e-3);
        assert_relative_eq!(parse_double("x", Some("-.5"), 0.0, true, "t").unwrap(), -0.5);
        for raw in ["nan", "inf", "-inf", "1 2"] {
            assert!(parse_double("x", Some(raw), 0.0, true, "t").is_err(), "{raw}");
        }
    }

    #[test]
    fn test_vector3() {
        let v = parse_vector3("xyz", Some("  1   2   3  "), Vector3::zeros(), true, "t").unwrap();
        assert_relative_eq!(v, Vector3::new(1.0, 2.0, 3.0));
        for raw in ["1 2", "1 2 3 4", "1 x 3", ""] {
            let err = parse_vector3("xyz", Some(raw), Vector3::zeros(), true, "t").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedField, "input: {raw:?}");
        }
    }

    #[test]
    fn test_color() {
        let c = parse_color("rgba", Some("0.1 0.2 0.3"), Color::BLACK, true, "t").unwrap();
        assert_relative_eq!(c.a, 1.0);
        let c = parse_color("rgba", Some("0.1 0.2 0.3 0.5"), Color::BLACK, true, "t").unwrap();
        assert_relative_eq!(c.a, 0.5);
        for raw in ["0.1 0.2", "1 1 1 1 1", "1.5 0 0", "-0.1 0 0 1"] {
            assert!(parse_color("rgba", Some(raw), Color::BLACK, true, "t").is_err(), "{raw}");
        }
    }

    #[test]
    fn test_attribute_helpers_label_errors() {
        let e = XmlElement::new("sphere").with_attribute("radius", "wide");
        let err = require_double(&e, "radius").unwrap_err();
        match err {
            SdfError::MalformedField {
                field,
                value,
                context,
                ..
            } => {
                assert_eq!(field, "radius");
                assert_eq!(value, "wide");
                assert_eq!(context, "sphere");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let e = XmlElement::new("link").with_attribute("name", "base");
        let err = require_double(&e, "mass").unwrap_err();
        assert!(err.to_string().contains("link 'base'"));
    }

    #[test]
    fn test_non_negative() {
        let e = XmlElement::new("cylinder")
            .with_attribute("radius", "-1")
            .with_attribute("length", "2");
        assert_eq!(
            require_non_negative(&e, "radius").unwrap_err().kind(),
            ErrorKind::MalformedField
        );
        assert_relative_eq!(require_non_negative(&e, "length").unwrap(), 2.0);
    }

    #[test]
    fn test_attr_name() {
        let e = XmlElement::new("link").with_attribute("name", " base ");
        assert_eq!(attr_name(&e).unwrap(), "base");

        let e = XmlElement::new("link").with_attribute("name", "");
        assert!(matches!(
            attr_name(&e).unwrap_err(),
            SdfError::MalformedField { field: "name", ref context, .. } if context == "link ''"
        ));

        let e = XmlElement::new("link").with_attribute("name", "  ");
        assert_eq!(attr_name(&e).unwrap_err().kind(), ErrorKind::MalformedField);

        let e = XmlElement::new("link");
        assert_eq!(
            attr_name(&e).unwrap_err().kind(),
            ErrorKind::MissingRequiredField
        );
    }

    #[test]
    fn test_child_text() {
        let e = XmlElement::new("physics")
            .with_child(XmlElement::new("update_rate").with_text("1000"))
            .with_child(XmlElement::new("max_contacts").with_text("x"));
        assert_relative_eq!(child_double(&e, "update_rate", 0.0).unwrap(), 1000.0);
        assert_relative_eq!(child_double(&e, "missing", 4.0).unwrap(), 4.0);
        assert!(child_uint(&e, "max_contacts", 20).is_err());
    }

    #[test]
    fn test_child_text_repeated() {
        let e = XmlElement::new("physics")
            .with_child(XmlElement::new("update_rate").with_text("10"))
            .with_child(XmlElement::new("update_rate").with_text("abc"));
        let err = child_double(&e, "update_rate", 0.0).unwrap_err();
        assert!(matches!(
            err,
            SdfError::DuplicateElement { element: "update_rate", ref context }
                if context == "physics"
        ));

        let e = XmlElement::new("contact")
            .with_child(XmlElement::new("topic").with_text("a"))
            .with_child(XmlElement::new("topic").with_text("b"));
        assert_eq!(
            child_string(&e, "topic").unwrap_err().kind(),
            ErrorKind::DuplicateElement
        );

        let e = XmlElement::new("contact").with_child(XmlElement::new("topic").with_text(" t "));
        assert_eq!(child_string(&e, "topic").unwrap().as_deref(), Some("t"));
        assert_eq!(child_string(&e, "missing").unwrap(), None);
    }
}
