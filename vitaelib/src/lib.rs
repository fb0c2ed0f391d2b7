#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::implicit_hasher)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod error;
pub mod helpers;
pub mod render;
pub mod theme;
pub mod util;

pub use config::{Palette, RenderConfig, Settings, Strictness};
pub use error::{HelperError, ImageFetchError, RenderError};
pub use render::ResumeRenderer;
pub use theme::{GlobalThemePaths, ThemePaths};

pub type Result<T> = eyre::Result<T>;
