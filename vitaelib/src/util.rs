use eyre::WrapErr;
use std::path::Path;
use tracing::{instrument, trace};

use crate::Result;

#[macro_export]
macro_rules! static_regex {
    ($re:literal $(,)?) => {{
        static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
        RE.get_or_init(|| {
            regex::Regex::new($re).expect(&format!("Malformed regex '{}'. This is a bug.", $re))
        })
    }};
}

pub(crate) use static_regex;

/// Reads a UTF-8 file, attaching the path to any error.
#[instrument]
pub fn read_to_string(path: &Path) -> Result<String> {
    trace!("read file");
    std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read '{}'", path.display()))
}

/// Reports whether an environment variable is set to a non-empty value.
pub fn env_flag(name: &str) -> bool {
    std::env::var_os(name).map_or(false, |value| !value.is_empty())
}
