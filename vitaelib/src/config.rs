use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{instrument, trace};

use crate::{util, Result};

/// How helper failures inside a render are treated.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Any helper failure fails the whole render.
    #[default]
    Strict,
    /// Image and date helper failures are logged and render as an empty string.
    Lenient,
}

/// Color overrides for the four palette slots of the stylesheet.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(
        alias = "colored_accent",
        alias = "coloredAccent",
        skip_serializing_if = "Option::is_none"
    )]
    pub highlighted_accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Palette {
    pub const DEFAULT_BACKGROUND: &'static str = "#222831";
    pub const DEFAULT_ACCENT: &'static str = "#393e46";
    pub const DEFAULT_HIGHLIGHTED_ACCENT: &'static str = "#FF5701";
    pub const DEFAULT_TEXT: &'static str = "#FFFFFF";

    /// Pairs of (default token, override) in substitution order. Slots without
    /// an override are skipped.
    pub fn substitutions(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (Self::DEFAULT_BACKGROUND, self.background.as_deref()),
            (Self::DEFAULT_ACCENT, self.accent.as_deref()),
            (Self::DEFAULT_HIGHLIGHTED_ACCENT, self.highlighted_accent.as_deref()),
            (Self::DEFAULT_TEXT, self.text.as_deref()),
        ]
        .into_iter()
        .filter_map(|(default, color)| color.map(|color| (default, color)))
    }

    /// Replaces every occurrence of each configured slot's default color.
    pub fn apply(&self, css: &str) -> String {
        self.substitutions()
            .fold(css.to_owned(), |css, (default, color)| {
                css.replace(default, color)
            })
    }
}

/// Immutable formatting configuration handed to the renderer.
///
/// The markdown and image toggles can only be switched on.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderConfig {
    markdown: bool,
    process_images: bool,
    palette: Palette,
    strictness: Strictness,
}

impl RenderConfig {
    pub const MARKDOWN_ENV: &'static str = "RENDER_MARKDOWN";
    pub const PROCESS_IMAGE_ENV: &'static str = "PROCESS_IMAGE";

    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with toggles enabled from the environment.
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Enables toggles whose environment variable is set to a non-empty value.
    #[must_use]
    pub fn apply_env(mut self) -> Self {
        if util::env_flag(Self::MARKDOWN_ENV) {
            trace!("markdown support enabled from environment");
            self = self.enable_markdown_support();
        }
        if util::env_flag(Self::PROCESS_IMAGE_ENV) {
            trace!("image processing enabled from environment");
            self = self.enable_image_processing();
        }
        self
    }

    #[must_use]
    pub fn enable_markdown_support(mut self) -> Self {
        self.markdown = true;
        self
    }

    #[must_use]
    pub fn enable_image_processing(mut self) -> Self {
        self.process_images = true;
        self
    }

    #[must_use]
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    #[must_use]
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn markdown_enabled(&self) -> bool {
        self.markdown
    }

    pub fn image_processing_enabled(&self) -> bool {
        self.process_images
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }
}

/// On-disk settings, read from a TOML file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub markdown: bool,
    pub process_images: bool,
    pub strictness: Strictness,
    pub colors: Palette,
}

impl Settings {
    #[instrument]
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = util::read_to_string(path)?;
        Self::from_toml_str(&raw)
            .wrap_err_with(|| format!("Failed to parse settings file '{}'", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).wrap_err("Failed to serialize settings")
    }

    pub fn into_config(self) -> RenderConfig {
        let mut config = RenderConfig::new()
            .with_palette(self.colors)
            .with_strictness(self.strictness);
        if self.markdown {
            config = config.enable_markdown_support();
        }
        if self.process_images {
            config = config.enable_image_processing();
        }
        config
    }
}

impl From<&RenderConfig> for Settings {
    fn from(config: &RenderConfig) -> Self {
        Self {
            markdown: config.markdown_enabled(),
            process_images: config.image_processing_enabled(),
            strictness: config.strictness(),
            colors: config.palette().clone(),
        }
    }
}
