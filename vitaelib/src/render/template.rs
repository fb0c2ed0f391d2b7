use std::path::Path;
use tera::Tera;
use tracing::{instrument, trace};

use crate::config::{RenderConfig, Strictness};
use crate::error::RenderError;
use crate::helpers::{ImageEmbedder, MarkdownRenderer};
use crate::theme::ThemePaths;

use super::deferred::DeferredValues;

pub const TEMPLATE_NAME: &str = "resume.tera";

/// Builds a template engine holding the theme partials, the top-level
/// template and every resume helper.
#[instrument(skip_all)]
pub fn build_engine(
    paths: &ThemePaths,
    template: &str,
    config: &RenderConfig,
    images: &ImageEmbedder,
    deferred: &DeferredValues,
) -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".tera"]);

    for glob in paths.absolute_partial_globs() {
        if !glob_base(&glob).is_dir() {
            trace!(%glob, "no partial directory, skipping");
            continue;
        }
        trace!(%glob, "loading partials");
        let partials = Tera::new(&glob).map_err(RenderError::Template)?;
        tera.extend(&partials).map_err(RenderError::Template)?;
    }

    register_helpers(&mut tera, config, images, deferred);

    tera.add_raw_template(TEMPLATE_NAME, template)
        .map_err(RenderError::Template)?;

    Ok(tera)
}

/// Directory part of a glob, up to the first wildcard.
fn glob_base(glob: &str) -> &Path {
    let end = glob
        .find(|c| matches!(c, '*' | '?' | '[' | '{'))
        .unwrap_or(glob.len());
    Path::new(&glob[..end])
}

fn register_helpers(
    tera: &mut Tera,
    config: &RenderConfig,
    images: &ImageEmbedder,
    deferred: &DeferredValues,
) {
    #[allow(clippy::wildcard_imports)]
    use functions::*;

    tera.register_function(Equals::NAME, Equals);
    tera.register_function(Both::NAME, Both);
    tera.register_function(Concat::NAME, Concat);
    tera.register_function(FormatAddress::NAME, FormatAddress);
    tera.register_function(
        ImagePathOrDataUri::NAME,
        ImagePathOrDataUri::new(images.clone(), deferred.clone(), config.strictness()),
    );

    tera.register_filter(Lowercase::NAME, Lowercase);
    tera.register_filter(RemoveProtocol::NAME, RemoveProtocol);
    tera.register_filter(FormatDate::NAME, FormatDate::new(config.strictness()));
    tera.register_filter(
        MarkdownToHtml::NAME,
        MarkdownToHtml::new(MarkdownRenderer::new(config.markdown_enabled())),
    );
}

/// Reports a helper failure according to the configured strictness.
fn lenient_or_fail(
    strictness: Strictness,
    helper: &str,
    error: crate::error::HelperError,
) -> tera::Result<tera::Value> {
    match strictness {
        Strictness::Strict => Err(tera::Error::chain(
            format!("helper `{helper}` failed"),
            error,
        )),
        Strictness::Lenient => {
            tracing::warn!(helper, %error, "helper failed, rendering nothing in its place");
            Ok(tera::Value::String(String::new()))
        }
    }
}

mod functions {
    use std::collections::HashMap;
    use tera::{try_get_value, Value};

    use super::{lenient_or_fail, DeferredValues};
    use crate::config::Strictness;
    use crate::helpers::{self, address, Deferred, ImageEmbedder, MarkdownRenderer};

    fn required<'a>(
        args: &'a HashMap<String, Value>,
        helper: &str,
        key: &str,
    ) -> tera::Result<&'a Value> {
        args.get(key)
            .ok_or_else(|| tera::Error::msg(format!("`{key}` required when calling `{helper}`")))
    }

    /// Missing and null arguments read as an empty string.
    fn optional_str<'a>(
        args: &'a HashMap<String, Value>,
        helper: &str,
        key: &str,
    ) -> tera::Result<&'a str> {
        match args.get(key) {
            None | Some(Value::Null) => Ok(""),
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(other) => Err(tera::Error::msg(format!(
                "`{helper}` expected `{key}` to be a string, got '{other}'"
            ))),
        }
    }

    pub struct Equals;

    impl Equals {
        pub const NAME: &'static str = "equals";
    }

    impl tera::Function for Equals {
        fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
            let a = required(args, Self::NAME, "a")?;
            let b = required(args, Self::NAME, "b")?;
            Ok(Value::Bool(helpers::equals(a, b)))
        }
    }

    /// `and` is a reserved word in template expressions.
    pub struct Both;

    impl Both {
        pub const NAME: &'static str = "both";
    }

    impl tera::Function for Both {
        fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
            let a = required(args, Self::NAME, "a")?;
            let b = required(args, Self::NAME, "b")?;
            Ok(Value::Bool(helpers::and(a, b)))
        }
    }

    /// Joins `values=[...]`. Undefined variables are rejected by the engine
    /// before the call, so `undefined` is only produced when called from Rust.
    pub struct Concat;

    impl Concat {
        pub const NAME: &'static str = "concat";
    }

    impl tera::Function for Concat {
        fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
            let joined = match required(args, Self::NAME, "values")? {
                Value::Array(values) => helpers::concat(values.iter().map(Some)),
                single => helpers::concat([Some(single)]),
            };
            Ok(Value::String(joined))
        }
    }

    pub struct FormatAddress;

    impl FormatAddress {
        pub const NAME: &'static str = "format_address";
    }

    impl tera::Function for FormatAddress {
        fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
            let address = address::Address {
                street: optional_str(args, Self::NAME, "street")?,
                city: optional_str(args, Self::NAME, "city")?,
                region: optional_str(args, Self::NAME, "region")?,
                postal_code: optional_str(args, Self::NAME, "postal_code")?,
                country_code: optional_str(args, Self::NAME, "country_code")?,
            };
            let lines: Vec<String> = address
                .lines()
                .iter()
                .map(|line| tera::escape_html(line))
                .collect();
            Ok(Value::String(lines.join(address::LINE_BREAK)))
        }

        fn is_safe(&self) -> bool {
            true
        }
    }

    /// Emits a placeholder while the image is pending. The output must be
    /// printed as-is; a filter that alters the placeholder fails the render.
    pub struct ImagePathOrDataUri {
        embedder: ImageEmbedder,
        deferred: DeferredValues,
        strictness: Strictness,
    }

    impl ImagePathOrDataUri {
        pub const NAME: &'static str = "image_path_or_data_uri";

        pub fn new(embedder: ImageEmbedder, deferred: DeferredValues, strictness: Strictness) -> Self {
            Self {
                embedder,
                deferred,
                strictness,
            }
        }
    }

    impl tera::Function for ImagePathOrDataUri {
        fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
            let path = optional_str(args, Self::NAME, "path")?;
            match self.embedder.embed(path) {
                Deferred::Ready(Ok(value)) => Ok(Value::String(value)),
                Deferred::Ready(Err(e)) => lenient_or_fail(self.strictness, Self::NAME, e),
                Deferred::Pending(future) => Ok(Value::String(self.deferred.defer(future))),
            }
        }
    }

    pub struct Lowercase;

    impl Lowercase {
        pub const NAME: &'static str = "lowercase";
    }

    impl tera::Filter for Lowercase {
        fn filter(&self, value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
            let s = try_get_value!("lowercase", "value", String, value);
            Ok(Value::String(helpers::to_lowercase(&s)))
        }
    }

    pub struct RemoveProtocol;

    impl RemoveProtocol {
        pub const NAME: &'static str = "remove_protocol";
    }

    impl tera::Filter for RemoveProtocol {
        fn filter(&self, value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
            let url = try_get_value!("remove_protocol", "value", String, value);
            Ok(Value::String(helpers::remove_protocol(&url)))
        }
    }

    pub struct FormatDate {
        strictness: Strictness,
    }

    impl FormatDate {
        pub const NAME: &'static str = "format_date";

        pub fn new(strictness: Strictness) -> Self {
            Self { strictness }
        }
    }

    impl tera::Filter for FormatDate {
        fn filter(&self, value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
            let input = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                other => {
                    return Err(tera::Error::msg(format!(
                        "`format_date` expected a string, got '{other}'"
                    )))
                }
            };
            match helpers::format_date(&input) {
                Ok(date) => Ok(Value::String(date)),
                Err(e) => lenient_or_fail(self.strictness, Self::NAME, e),
            }
        }

        // output is only ever digits and slashes
        fn is_safe(&self) -> bool {
            true
        }
    }

    pub struct MarkdownToHtml {
        markdown: MarkdownRenderer,
    }

    impl MarkdownToHtml {
        pub const NAME: &'static str = "md_to_html";

        pub fn new(markdown: MarkdownRenderer) -> Self {
            Self { markdown }
        }
    }

    impl tera::Filter for MarkdownToHtml {
        fn filter(&self, value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
            let text = try_get_value!("md_to_html", "value", String, value);
            if !self.markdown.is_enabled() {
                return Ok(Value::String(tera::escape_html(&text)));
            }
            Ok(Value::String(self.markdown.render(&text)))
        }

        fn is_safe(&self) -> bool {
            true
        }
    }

}
