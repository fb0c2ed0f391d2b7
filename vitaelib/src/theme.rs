use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{instrument, trace};

use crate::config::Palette;
use crate::error::RenderError;

pub type GlobalThemePaths = Arc<ThemePaths>;

/// Layout of a theme directory. All paths are relative to `root`.
#[derive(Debug, Clone, Serialize)]
pub struct ThemePaths {
    pub root: PathBuf,
    pub stylesheet: PathBuf,
    pub template: PathBuf,
    pub partial_globs: Vec<String>,
    pub icon_stylesheet: Option<PathBuf>,
}

impl ThemePaths {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            stylesheet: PathBuf::from("styles/main.css"),
            template: PathBuf::from("resume.tera"),
            partial_globs: vec![
                "views/partials/**/*.tera".to_owned(),
                "views/components/**/*.tera".to_owned(),
            ],
            icon_stylesheet: None,
        }
    }

    /// The theme shipped with this crate.
    pub fn bundled() -> Self {
        Self::new(concat!(env!("CARGO_MANIFEST_DIR"), "/theme"))
    }

    #[must_use]
    pub fn with_icon_stylesheet<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.icon_stylesheet = Some(path.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn absolute_stylesheet(&self) -> PathBuf {
        self.root.join(&self.stylesheet)
    }

    pub fn absolute_template(&self) -> PathBuf {
        self.root.join(&self.template)
    }

    pub fn absolute_icon_stylesheet(&self) -> Option<PathBuf> {
        self.icon_stylesheet
            .as_ref()
            .map(|path| self.root.join(path))
    }

    pub fn absolute_partial_globs(&self) -> impl Iterator<Item = String> + '_ {
        self.partial_globs
            .iter()
            .map(|glob| self.root.join(glob).display().to_string())
    }
}

impl Default for ThemePaths {
    fn default() -> Self {
        Self::bundled()
    }
}

#[instrument]
pub fn read_theme_file(path: &Path) -> Result<String, RenderError> {
    trace!("read theme file");
    std::fs::read_to_string(path).map_err(|source| RenderError::TemplateUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads the theme stylesheet and applies the palette overrides.
pub fn load_stylesheet(paths: &ThemePaths, palette: &Palette) -> Result<String, RenderError> {
    let css = read_theme_file(&paths.absolute_stylesheet())?;
    Ok(palette.apply(&css))
}

/// Reads the optional icon stylesheet. Absent configuration yields an empty string.
pub fn load_icon_stylesheet(paths: &ThemePaths) -> Result<String, RenderError> {
    match paths.absolute_icon_stylesheet() {
        Some(path) => read_theme_file(&path),
        None => Ok(String::new()),
    }
}
