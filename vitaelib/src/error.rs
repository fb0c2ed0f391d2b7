use std::path::PathBuf;
use thiserror::Error;

/// Failure raised by a single helper invocation.
#[derive(Error, Debug)]
pub enum HelperError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unable to interpret '{0}' as a date")]
    InvalidDate(String),

    #[error("there was an error when trying to convert the image '{path}'")]
    Image {
        path: String,
        #[source]
        source: ImageFetchError,
    },
}

#[derive(Error, Debug)]
pub enum ImageFetchError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("the template or stylesheet at '{}' could not be read", path.display())]
    TemplateUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template rendering failed")]
    Template(#[source] tera::Error),

    #[error("template rendering failed")]
    Deferred(#[source] HelperError),

    #[error("failed starting up runtime for deferred helper values")]
    Runtime(#[source] std::io::Error),

    #[error("a deferred helper value was altered by a filter before it could be substituted")]
    AlteredDeferred,

    #[error("synchronous render called from within an async runtime, use `render_async` instead")]
    NestedRuntime,
}
