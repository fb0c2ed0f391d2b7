use serde_json::Value;
use std::sync::Arc;
use tracing::{instrument, trace};

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::helpers::ImageEmbedder;
use crate::theme::{self, GlobalThemePaths, ThemePaths};
use crate::Result;

pub mod deferred;
pub mod template;

use deferred::DeferredValues;

/// Renders resume documents with a theme.
///
/// Every call reads the theme from disk, so edits to the theme are picked up
/// without rebuilding the renderer.
#[derive(Debug, Clone)]
pub struct ResumeRenderer {
    paths: GlobalThemePaths,
    config: Arc<RenderConfig>,
    images: ImageEmbedder,
}

impl ResumeRenderer {
    pub fn new(paths: GlobalThemePaths, config: RenderConfig) -> Self {
        let images = ImageEmbedder::new(config.image_processing_enabled());
        Self {
            paths,
            config: Arc::new(config),
            images,
        }
    }

    pub fn with_bundled_theme(config: RenderConfig) -> Self {
        Self::new(Arc::new(ThemePaths::bundled()), config)
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn paths(&self) -> GlobalThemePaths {
        Arc::clone(&self.paths)
    }

    /// Renders to HTML, resolving deferred helper values before returning.
    ///
    /// Deferred values are driven on a private single-threaded runtime. Calling
    /// this from within an async context while values are pending fails with
    /// [`RenderError::NestedRuntime`]; use [`render_async`](Self::render_async)
    /// there instead.
    #[instrument(skip_all)]
    pub fn render(&self, resume: &Value) -> Result<String> {
        let (markup, deferred) = self.evaluate(resume)?;
        if deferred.is_empty() {
            return Ok(markup);
        }

        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(RenderError::NestedRuntime.into());
        }

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(RenderError::Runtime)?;

        Ok(rt.block_on(deferred.resolve_into(markup, self.config.strictness()))?)
    }

    /// Renders to HTML, awaiting deferred helper values on the caller's runtime.
    #[instrument(skip_all)]
    pub async fn render_async(&self, resume: &Value) -> Result<String> {
        let (markup, deferred) = self.evaluate(resume)?;
        Ok(deferred
            .resolve_into(markup, self.config.strictness())
            .await?)
    }

    fn evaluate(&self, resume: &Value) -> std::result::Result<(String, DeferredValues), RenderError> {
        let css = theme::load_stylesheet(&self.paths, self.config.palette())?;
        let icons = theme::load_icon_stylesheet(&self.paths)?;
        let template = theme::read_theme_file(&self.paths.absolute_template())?;

        let deferred = DeferredValues::new();
        let tera = template::build_engine(
            &self.paths,
            &template,
            &self.config,
            &self.images,
            &deferred,
        )?;

        let mut ctx = tera::Context::new();
        ctx.insert("css", &css);
        ctx.insert("fa", &icons);
        ctx.insert("resume", resume);

        let markup = tera
            .render(template::TEMPLATE_NAME, &ctx)
            .map_err(RenderError::Template)?;
        trace!(pending = deferred.len(), "template evaluated");

        Ok((markup, deferred))
    }
}
