//! Placeholder interpolation
//!
//! Replaces `{key}` placeholders in a message with values from a
//! [`LogContext`]. Keys match `[A-Za-z0-9_.]+`. A placeholder is left
//! untouched when its key is missing or its value is an aggregate.

use super::log_context::{FieldValue, LogContext};
use std::borrow::Cow;

#[inline]
fn is_key_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.'
}

/// String form of a context value, or `None` if it must not be substituted
///
/// Precedence: errors, custom `Display` values, bool/null literals,
/// resources, scalars. Lists and maps are never rendered.
pub fn render_value(value: &FieldValue) -> Option<Cow<'_, str>> {
    match value {
        FieldValue::Error(err) => Some(Cow::Owned(err.to_string())),
        FieldValue::Display(d) => Some(Cow::Owned(d.to_string())),
        FieldValue::Bool(true) => Some(Cow::Borrowed("true")),
        FieldValue::Bool(false) => Some(Cow::Borrowed("false")),
        FieldValue::Null => Some(Cow::Borrowed("null")),
        FieldValue::Resource(kind) => Some(Cow::Owned(format!("[resource({})]", kind))),
        FieldValue::String(s) => Some(Cow::Borrowed(s.as_str())),
        FieldValue::Int(i) => Some(Cow::Owned(i.to_string())),
        FieldValue::UInt(u) => Some(Cow::Owned(u.to_string())),
        FieldValue::Float(f) => Some(Cow::Owned(f.to_string())),
        FieldValue::List(_) | FieldValue::Map(_) => None,
    }
}

/// Render `template` against `vars`
///
/// Substituted text is never rescanned, so a value containing `{x}` is
/// emitted literally.
pub fn interpolate(template: &str, vars: &LogContext) -> String {
    if !template.contains('{') {
        return template.to_string();
    }

    let bytes = template.as_bytes();
    let mut out = String::with_capacity(template.len());
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }

        let start = i + 1;
        let mut end = start;
        while end < bytes.len() && is_key_byte(bytes[end]) {
            end += 1;
        }

        if end == start || end >= bytes.len() || bytes[end] != b'}' {
            // Not a placeholder; resume at the next byte so "{{key}" still matches
            i += 1;
            continue;
        }

        let key = &template[start..end];
        if let Some(rendered) = vars.get(key).and_then(render_value) {
            out.push_str(&template[copied..i]);
            out.push_str(&rendered);
            copied = end + 1;
        }
        i = end + 1;
    }

    out.push_str(&template[copied..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fmt;

    struct Dummy;

    impl fmt::Display for Dummy {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("DUMMY")
        }
    }

    #[test]
    fn test_no_placeholders_unchanged() {
        let ctx = LogContext::new().with_field("name", "World");
        assert_eq!(interpolate("plain text", &ctx), "plain text");
    }

    #[test]
    fn test_missing_key_left_verbatim() {
        assert_eq!(interpolate("a {missing} b", &LogContext::new()), "a {missing} b");
    }

    #[test]
    fn test_basic_substitution() {
        let ctx = LogContext::new().with_field("name", "World");
        assert_eq!(interpolate("Hello {name}", &ctx), "Hello World");
    }

    #[test]
    fn test_context_replacement_mixed() {
        let ctx = LogContext::new()
            .with_field("user", "Bob")
            .with_field("foo.bar", "Bar");
        assert_eq!(
            interpolate("{Message {nothing} {user} {foo.bar} a}", &ctx),
            "{Message {nothing} Bob Bar a}"
        );
    }

    #[test]
    fn test_nested_braces() {
        let ctx = LogContext::new().with_field("k", 1);
        assert_eq!(interpolate("{{k}}", &ctx), "{1}");
        assert_eq!(interpolate("{k", &ctx), "{k");
        assert_eq!(interpolate("{}", &ctx), "{}");
    }

    #[test]
    fn test_value_precedence() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "oops");
        let ctx = LogContext::new()
            .with_field("err", FieldValue::error(&io_err))
            .with_field("obj", FieldValue::display(Dummy))
            .with_field("yes", true)
            .with_field("no", false)
            .with_field("nil", FieldValue::Null)
            .with_field("fh", FieldValue::resource("stream"))
            .with_field("n", 0)
            .with_field("f", 0.5);

        assert!(interpolate("{err}", &ctx).starts_with("Error(oops at "));
        assert_eq!(interpolate("{obj}", &ctx), "DUMMY");
        assert_eq!(interpolate("{yes} {no} {nil}", &ctx), "true false null");
        assert_eq!(interpolate("{fh}", &ctx), "[resource(stream)]");
        assert_eq!(interpolate("{n} {f}", &ctx), "0 0.5");
    }

    #[test]
    fn test_aggregates_are_skipped() {
        let mut nested = BTreeMap::new();
        nested.insert("with object".to_string(), FieldValue::display(Dummy));
        let ctx = LogContext::new()
            .with_field("list", vec![1, 2, 3])
            .with_field("nested", FieldValue::Map(nested));

        assert_eq!(interpolate("{list} {nested}", &ctx), "{list} {nested}");
    }

    #[test]
    fn test_substitution_not_rescanned() {
        let ctx = LogContext::new()
            .with_field("a", "{b}")
            .with_field("b", "x");
        assert_eq!(interpolate("{a}{b}", &ctx), "{b}x");
    }

    #[test]
    fn test_unicode_around_placeholders() {
        let ctx = LogContext::new().with_field("who", "wörld");
        assert_eq!(interpolate("héllo {who} ✓", &ctx), "héllo wörld ✓");
    }
}
