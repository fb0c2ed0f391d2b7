//! Formatting helpers used while expanding resume templates.
//!
//! Everything in here is independent of the template engine; the engine
//! adapters live in [`crate::render::template`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::HelperError;
use crate::util::static_regex;

pub mod address;
pub mod image;

pub use image::ImageEmbedder;

/// Result of a helper that may not be available yet.
pub enum Deferred {
    Ready(Result<String, HelperError>),
    Pending(BoxFuture<'static, Result<String, HelperError>>),
}

impl Deferred {
    pub fn ready(value: String) -> Self {
        Self::Ready(Ok(value))
    }

    pub async fn resolve(self) -> Result<String, HelperError> {
        match self {
            Self::Ready(result) => result,
            Self::Pending(future) => future.await,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl std::fmt::Debug for Deferred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Structural equality, false whenever `a` is falsy.
pub fn equals(a: &Value, b: &Value) -> bool {
    is_truthy(a) && a == b
}

pub fn and(a: &Value, b: &Value) -> bool {
    is_truthy(a) && is_truthy(b)
}

pub fn to_lowercase(s: &str) -> String {
    s.to_lowercase()
}

/// Strips the leading `scheme://` from a URL.
pub fn remove_protocol(url: &str) -> String {
    static_regex!(r"^[A-Za-z][A-Za-z0-9+.-]*://").replacen(url, 1, "").into_owned()
}

/// Joins the scalar arguments. `None` stands for an undefined argument.
pub fn concat<'a, I>(args: I) -> String
where
    I: IntoIterator<Item = Option<&'a Value>>,
{
    args.into_iter().fold(String::new(), |mut out, arg| {
        match arg {
            None => out.push_str("undefined"),
            Some(Value::String(s)) => out.push_str(s),
            Some(Value::Number(n)) => out.push_str(&n.to_string()),
            Some(Value::Bool(b)) => out.push_str(if *b { "true" } else { "false" }),
            Some(Value::Null | Value::Array(_) | Value::Object(_)) => (),
        }
        out
    })
}

pub fn format_address(
    street: &str,
    city: &str,
    region: &str,
    postal_code: &str,
    country_code: &str,
) -> String {
    address::Address {
        street,
        city,
        region,
        postal_code,
        country_code,
    }
    .lines()
    .join(address::LINE_BREAK)
}

/// Formats a resume date.
///
/// A bare year is returned as-is, a year and month becomes `MM/YYYY` and a
/// full date becomes `MM/DD/YYYY`.
pub fn format_date(input: &str) -> Result<String, HelperError> {
    if static_regex!(r"^[1-2][0-9]{3}$").is_match(input) {
        return Ok(input.to_owned());
    }

    if let Some(caps) = static_regex!(r"^([1-2][0-9]{3})-([0-1]?[0-9])$").captures(input) {
        let month: u32 = caps[2]
            .parse()
            .map_err(|_| HelperError::InvalidDate(input.to_owned()))?;
        if !(1..=12).contains(&month) {
            return Err(HelperError::InvalidDate(input.to_owned()));
        }
        return Ok(format!("{month:02}/{}", &caps[1]));
    }

    parse_full_date(input)
        .map(|date| date.format("%m/%d/%Y").to_string())
        .ok_or_else(|| HelperError::InvalidDate(input.to_owned()))
}

fn parse_full_date(input: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%B %d, %Y"];

    let input = input.trim();
    DateTime::parse_from_rfc3339(input)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S")
                .map(|dt| dt.date())
                .ok()
        })
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        })
}

/// Converts markdown to HTML when enabled; returns the text untouched otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer {
    enabled: bool,
}

impl MarkdownRenderer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn render(&self, text: &str) -> String {
        if self.enabled {
            markdown_to_html(text)
        } else {
            text.to_owned()
        }
    }
}

fn markdown_to_html(text: &str) -> String {
    use pulldown_cmark::{html, Options, Parser};

    let parser = Parser::new_ext(text, Options::all());
    let mut buf = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut buf, parser);
    buf
}

#[cfg(test)]
mod test {
    #![allow(warnings, unused)]

    use super::*;
    use serde_json::json;

    #[test]
    fn format_date_standalone_year() {
        assert_eq!(format_date("2020").unwrap(), "2020");
        assert_eq!(format_date("1900").unwrap(), "1900");
        assert_eq!(format_date("2222").unwrap(), "2222");
    }

    #[test]
    fn format_date_year_with_month() {
        assert_eq!(format_date("2020-12").unwrap(), "12/2020");
        assert_eq!(format_date("2020-01").unwrap(), "01/2020");
        assert_eq!(format_date("2020-1").unwrap(), "01/2020");
    }

    #[test]
    fn format_date_full_date() {
        assert_eq!(format_date("2020-12-12").unwrap(), "12/12/2020");
        assert_eq!(format_date("2020-01-12").unwrap(), "01/12/2020");
        assert_eq!(format_date("2020-1-12").unwrap(), "01/12/2020");
    }

    #[test]
    fn format_date_other_full_date_shapes() {
        assert_eq!(format_date("2021/3/4").unwrap(), "03/04/2021");
        assert_eq!(format_date("2021-03-04T10:00:00Z").unwrap(), "03/04/2021");
        assert_eq!(format_date("2021-03-04T10:00:00").unwrap(), "03/04/2021");
        assert_eq!(format_date("4 March 2021").unwrap(), "03/04/2021");
    }

    #[test]
    fn format_date_rejects_garbage() {
        for input in ["", "yesterday", "2020-13", "2020-0", "2020-02-30", "3020"] {
            assert!(
                matches!(format_date(input), Err(HelperError::InvalidDate(_))),
                "'{input}' should be invalid"
            );
        }
    }

    #[test]
    fn concat_joins_scalars() {
        let args = [json!("ba"), json!("na"), json!("na")];
        assert_eq!(concat(args.iter().map(Some)), "banana");

        let args = [json!(1), json!(2), json!(3)];
        assert_eq!(concat(args.iter().map(Some)), "123");

        let args = [json!("foo"), json!(2), json!(false)];
        assert_eq!(concat(args.iter().map(Some)), "foo2false");
    }

    #[test]
    fn concat_skips_compound_values_and_null() {
        let args = [json!({}), json!([]), Value::Null];
        assert_eq!(concat(args.iter().map(Some)), "");
    }

    #[test]
    fn concat_spells_out_undefined() {
        let defined = json!("undefined");
        assert_eq!(concat([Some(&defined), None]), "undefinedundefined");
    }

    #[test]
    fn remove_protocol_strips_scheme() {
        assert_eq!(remove_protocol("https://example.com"), "example.com");
        assert_eq!(remove_protocol("ftp://host/a://b"), "host/a://b");
        assert_eq!(remove_protocol("example.com/path"), "example.com/path");
        assert_eq!(
            remove_protocol("linkedin.com/in/ada?next=https://x.dev"),
            "linkedin.com/in/ada?next=https://x.dev"
        );
    }

    #[test]
    fn lowercase() {
        assert_eq!(to_lowercase("GitHub"), "github");
    }

    #[test]
    fn equals_short_circuits_on_falsy() {
        assert!(equals(&json!("a"), &json!("a")));
        assert!(equals(&json!([1, 2]), &json!([1, 2])));
        assert!(!equals(&json!("a"), &json!("b")));
        assert!(!equals(&json!(""), &json!("")));
        assert!(!equals(&json!(0), &json!(0)));
        assert!(!equals(&Value::Null, &Value::Null));
    }

    #[test]
    fn and_uses_truthiness() {
        assert!(and(&json!("x"), &json!(1)));
        assert!(and(&json!([]), &json!({})));
        assert!(!and(&json!("x"), &json!(false)));
        assert!(!and(&json!(0), &json!(true)));
    }

    #[test]
    fn markdown_disabled_is_identity() {
        let md = MarkdownRenderer::default();
        assert!(!md.is_enabled());
        assert_eq!(md.render("**bold** <b>"), "**bold** <b>");
    }

    #[test]
    fn markdown_enabled_converts() {
        let md = MarkdownRenderer::new(true);
        assert_eq!(md.render("**bold**"), "<p><strong>bold</strong></p>\n");
    }

    #[test]
    fn format_address_joins_lines() {
        assert_eq!(
            format_address("123 Main St", "Springfield", "IL", "62701", "US"),
            "123 Main St<br/>Springfield, IL 62701"
        );
    }

    #[test]
    fn deferred_ready_resolves_without_runtime() {
        let value = futures::executor::block_on(Deferred::ready("x".into()).resolve());
        assert_eq!(value.unwrap(), "x");
    }
}
